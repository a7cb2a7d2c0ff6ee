//! Validation harness runs over a synthetic region.
use habitat_scoring::config::ValidationConfig;
use habitat_scoring::embedding::{EmbeddingGrid, EmbeddingSource};
use habitat_scoring::geo::{self, Coord, GeoTransform};
use habitat_scoring::occurrence::{OccurrenceRecord, OccurrenceTable};
use habitat_scoring::validation::{run_species_experiment, run_validation};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 30 x 30 grid over the Cambridge box; rows 0..8 x cols 0..5 are habitat.
fn region_grid() -> EmbeddingGrid {
    let bbox = geo::region("cambridge").unwrap().bbox;
    let mut grid = EmbeddingGrid::empty(30, 30, 3, GeoTransform::from_bounds(&bbox, 30, 30));
    for row in 0..30 {
        for col in 0..30 {
            let wobble = ((row * 5 + col * 11) % 7) as f32 * 0.02;
            let v = if row < 8 && col < 5 {
                [1.0 + wobble, 0.2, 0.1]
            } else {
                [0.1, 0.9 + wobble, 0.6]
            };
            grid.set_pixel(row, col, &v).unwrap();
        }
    }
    grid
}

fn habitat_records(grid: &EmbeddingGrid, species: &str, taxon_key: u64, n: usize) -> Vec<OccurrenceRecord> {
    (0..8)
        .flat_map(|r| (0..5).map(move |c| (r, c)))
        .take(n)
        .map(|(r, c)| {
            let Coord { lon, lat } = grid.pixel_to_coords(r, c);
            OccurrenceRecord {
                species: species.to_string(),
                taxon_key,
                lon,
                lat,
            }
        })
        .collect()
}

fn config(species: &[&str]) -> ValidationConfig {
    ValidationConfig {
        species: species.iter().map(|s| s.to_string()).collect(),
        n_positive_values: vec![1, 2, 5, 10, 20, 50],
        n_trials: 3,
        logistic_max_iterations: 200,
        ..ValidationConfig::default()
    }
}

#[test]
fn sizes_without_ten_test_positives_are_dropped() {
    init_logging();
    let grid = region_grid();
    let table = OccurrenceTable::new(habitat_records(&grid, "Quercus robur", 1, 30));
    let bbox = geo::region("cambridge").unwrap().bbox;
    let cfg = config(&["Quercus robur"]);

    let experiment = run_species_experiment("Quercus robur", &bbox, &grid, &table, &cfg)
        .unwrap()
        .expect("30 occurrences clear the minimum");
    assert_eq!(experiment.n_occurrences, 30);

    // 30 valid samples: 20 and 50 would leave fewer than 10 held out
    let sizes: Vec<usize> = experiment.experiments.iter().map(|e| e.n_positive).collect();
    assert_eq!(sizes, vec![1, 2, 5, 10]);

    for e in &experiment.experiments {
        assert_eq!(e.trials.len(), 3);
        let seeds: Vec<u64> = e.trials.iter().map(|t| t.seed).collect();
        assert_eq!(seeds, vec![42, 43, 44]);
        for t in &e.trials {
            assert_eq!(t.train_positive.len(), e.n_positive);
            assert_eq!(t.n_test_positive, 30 - e.n_positive);
            assert!((0.0..=1.0).contains(&t.auc));
        }
    }

    let ten = experiment.experiments.iter().find(|e| e.n_positive == 10).unwrap();
    assert!(ten.auc_mean > 0.9, "separable habitat gave AUC {}", ten.auc_mean);
}

#[test]
fn sweep_skips_sparse_and_unknown_species() {
    init_logging();
    let grid = region_grid();
    let mut records = habitat_records(&grid, "Quercus robur", 1, 30);
    records.extend(habitat_records(&grid, "Fraxinus excelsior", 2, 12));
    let table = OccurrenceTable::new(records);

    let run = run_validation(
        &grid,
        &table,
        &config(&["Quercus robur", "Fraxinus excelsior", "Taxus baccata"]),
    )
    .unwrap();

    assert_eq!(run.experiments.len(), 1);
    assert_eq!(run.experiments[0].species, "Quercus robur");
    assert_eq!(run.summary.species.len(), 1);
    assert_eq!(run.summary.species[0].results.len(), 4);
    assert_eq!(run.summary.base_seed, 42);
}

#[test]
fn repeated_sweeps_are_identical() {
    let grid = region_grid();
    let table = OccurrenceTable::new(habitat_records(&grid, "Quercus robur", 1, 30));
    let cfg = config(&["Quercus robur"]);
    let a = run_validation(&grid, &table, &cfg).unwrap();
    let b = run_validation(&grid, &table, &cfg).unwrap();
    assert_eq!(a.experiments, b.experiments);
}
