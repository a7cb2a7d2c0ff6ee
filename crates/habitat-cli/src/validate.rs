//! `habitat validate`: AUC sweep over training sizes for each species.
use std::path::PathBuf;

use anyhow::Result;

use habitat_scoring::config::ValidationConfig;
use habitat_scoring::geo;
use habitat_scoring::io::{read_embedding_tsv, read_occurrence_tsv, write_json};
use habitat_scoring::report::validation_report;
use habitat_scoring::validation::{run_validation, ValidationRun};

#[derive(Debug, Clone)]
pub struct ValidateArgs {
    pub embeddings: PathBuf,
    pub occurrences: PathBuf,
    pub output_dir: PathBuf,
    pub shape: Option<(usize, usize)>,
    pub config: ValidationConfig,
    pub report: bool,
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidationRun> {
    let bbox = geo::region(&args.config.region)?.bbox;
    let grid = read_embedding_tsv(&args.embeddings, &bbox, args.shape)?;
    let occurrences = read_occurrence_tsv(&args.occurrences)?;

    let run = run_validation(&grid, &occurrences, &args.config)?;

    std::fs::create_dir_all(&args.output_dir)?;
    for experiment in &run.experiments {
        let path = args.output_dir.join(format!("{}.json", experiment.slug()));
        write_json(experiment, &path)?;
        log::info!("Saved: {}", path.display());
    }

    let summary_path = args.output_dir.join("summary.json");
    write_json(&run.summary, &summary_path)?;
    log::info!("Saved summary: {}", summary_path.display());

    if args.report {
        let report_path = args.output_dir.join("report.html");
        validation_report(&run.experiments, &run.summary).save_to_file(&report_path)?;
        log::info!("Saved report: {}", report_path.display());
    }

    run.summary.log_table();
    Ok(run)
}
