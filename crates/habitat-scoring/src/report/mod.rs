//! HTML validation report: plotly charts inside a maud page.
pub mod plots;
pub mod report;

pub use plots::plot_auc_curve;
pub use report::{validation_report, Report, ReportSection};
