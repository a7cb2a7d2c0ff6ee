use plotly::common::{DashType, Fill, Line, Mode};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};

use crate::validation::SpeciesExperiment;

/// AUC mean against training size with a ±σ band and the chance line.
pub fn plot_auc_curve(experiment: &SpeciesExperiment) -> Plot {
    let n_pos: Vec<f64> = experiment
        .experiments
        .iter()
        .map(|e| e.n_positive as f64)
        .collect();
    let mean: Vec<f64> = experiment.experiments.iter().map(|e| e.auc_mean).collect();
    let upper: Vec<f64> = experiment
        .experiments
        .iter()
        .map(|e| (e.auc_mean + e.auc_std).min(1.0))
        .collect();
    let lower: Vec<f64> = experiment
        .experiments
        .iter()
        .map(|e| (e.auc_mean - e.auc_std).max(0.0))
        .collect();

    let mut plot = Plot::new();

    plot.add_trace(
        Scatter::new(n_pos.clone(), mean)
            .name("AUC")
            .mode(Mode::LinesMarkers)
            .line(Line::new().color("rgba(31, 119, 180, 1.0)")),
    );

    // closed polygon: upper edge left to right, lower edge back
    let mut band_x = n_pos.clone();
    band_x.extend(n_pos.iter().rev());
    let mut band_y = upper;
    band_y.extend(lower.iter().rev());
    plot.add_trace(
        Scatter::new(band_x, band_y)
            .name("± σ")
            .mode(Mode::Lines)
            .fill(Fill::ToSelf)
            .line(Line::new().width(0.0))
            .fill_color("rgba(31, 119, 180, 0.2)"),
    );

    if let (Some(&first), Some(&last)) = (n_pos.first(), n_pos.last()) {
        plot.add_trace(
            Scatter::new(vec![first, last], vec![0.5, 0.5])
                .name("Chance")
                .mode(Mode::Lines)
                .line(Line::new().color("grey").dash(DashType::Dash)),
        );
    }

    plot.set_layout(
        Layout::new()
            .title(format!(
                "{} ({} occurrences, {} trials)",
                experiment.species, experiment.n_occurrences, experiment.n_trials
            ).as_str())
            .x_axis(Axis::new().title("Training positives").type_(plotly::layout::AxisType::Log))
            .y_axis(Axis::new().title("AUC").range(vec![0.0, 1.0])),
    );

    plot
}
