use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::report::plots::plot_auc_curve;
use crate::validation::{SpeciesExperiment, ValidationSummary};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// A titled block of HTML content and plots.
pub struct ReportSection {
    title: String,
    blocks: Vec<Markup>,
    n_plots: usize,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            blocks: Vec::new(),
            n_plots: 0,
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        let div_id = format!(
            "plot-{}-{}",
            self.title.to_lowercase().replace(|c: char| !c.is_alphanumeric(), "-"),
            self.n_plots
        );
        self.n_plots += 1;
        self.blocks
            .push(PreEscaped(plot.to_inline_html(Some(div_id.as_str()))));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.blocks {
                    div class="block" { (block) }
                }
            }
        }
    }
}

/// Single-page HTML report.
pub struct Report {
    title: String,
    version: String,
    subtitle: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, version: &str, subtitle: &str) -> Self {
        Report {
            title: title.to_string(),
            version: version.to_string(),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; }
                        table { border-collapse: collapse; }
                        th, td { padding: 4px 10px; border-bottom: 1px solid #ddd; text-align: right; }
                        th:first-child, td:first-child { text-align: left; }"
                    }
                }
                body {
                    h1 { (self.title) }
                    p { (self.subtitle) " (v" (self.version) ")" }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(&path, self.render().into_string())
            .with_context(|| format!("Failed to write report: {}", path.as_ref().display()))
    }
}

fn summary_table(summary: &ValidationSummary) -> Markup {
    html! {
        table {
            thead {
                tr { th { "Species" } th { "n_pos" } th { "AUC mean" } th { "AUC std" } }
            }
            tbody {
                @for sp in &summary.species {
                    @for r in &sp.results {
                        tr {
                            td { (sp.species) }
                            td { (r.n_positive) }
                            td { (format!("{:.3}", r.auc_mean)) }
                            td { (format!("{:.3}", r.auc_std)) }
                        }
                    }
                }
            }
        }
    }
}

/// Build the validation report: a summary table and one AUC curve per species.
pub fn validation_report(experiments: &[SpeciesExperiment], summary: &ValidationSummary) -> Report {
    let mut report = Report::new(
        "Habitat Classifier Validation",
        env!("CARGO_PKG_VERSION"),
        &format!(
            "Region {}, {} trials per training size, base seed {}",
            summary.region, summary.n_trials, summary.base_seed
        ),
    );

    let mut overview = ReportSection::new("Summary");
    overview.add_content(html! {
        "AUC of a logistic discriminator trained on n positives and as many background pixels, \
         evaluated on the held-out occurrences against fresh background pixels."
    });
    overview.add_content(summary_table(summary));
    report.add_section(overview);

    for experiment in experiments {
        let mut section = ReportSection::new(&experiment.species);
        if experiment.experiments.is_empty() {
            section.add_content(html! {
                "No training size left enough held-out positives."
            });
        } else {
            section.add_plot(plot_auc_curve(experiment));
        }
        report.add_section(section);
    }

    report
}
