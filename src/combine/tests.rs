use std::fs;

use tempfile::TempDir;

use super::*;
use crate::schema::CanonicalRole;

fn growth_csv(samples: usize, scale: f64) -> String {
    let mut csv = String::from("time,biomass,substrate,product\n");
    for i in 0..samples {
        let t = i as f64;
        csv.push_str(&format!(
            "{t},{},{},{}\n",
            scale * (1.0 + 0.1 * t),
            20.0 - t,
            0.05 * t
        ));
    }
    csv
}

fn data_dir(files: &[(&str, String)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_two_sources_concatenated_in_file_order() {
    // Written out of order on purpose
    let dir = data_dir(&[
        ("run_b.csv", growth_csv(8, 2.0)),
        ("run_a.csv", growth_csv(10, 1.0)),
    ]);
    let files = MultiExperimentCombiner::discover(dir.path(), "*.csv").unwrap();

    let dataset = MultiExperimentCombiner::default().combine(&files).unwrap();

    assert_eq!(dataset.len(), 18);
    assert_eq!(dataset.features.len(), 18);
    let mut expected_ids = vec!["run_a".to_string(); 10];
    expected_ids.extend(vec!["run_b".to_string(); 8]);
    assert_eq!(dataset.metadata.experiment_ids, expected_ids);
    assert_eq!(dataset.metadata.file_names[0], "run_a.csv");
    assert_eq!(dataset.metadata.file_names[17], "run_b.csv");
    assert_eq!(dataset.metadata.n_experiments, 2);
    assert_eq!(dataset.metadata.n_samples, 18);
    assert_eq!(
        dataset.metadata.files_loaded,
        vec!["run_a.csv".to_string(), "run_b.csv".to_string()]
    );
    // First row of the second experiment
    assert_eq!(dataset.features[10], [2.0, 20.0, 0.0]);
    assert_eq!(dataset.time[10], 0.0);
}

#[test]
fn test_failing_source_is_skipped() {
    let dir = data_dir(&[
        ("good.csv", growth_csv(6, 1.0)),
        ("no_time.csv", "sample,biomass\n1,1.0\n2,1.1\n".to_string()),
    ]);
    let files = MultiExperimentCombiner::discover(dir.path(), "*.csv").unwrap();

    let dataset = MultiExperimentCombiner::default().combine(&files).unwrap();

    assert_eq!(dataset.len(), 6);
    assert_eq!(dataset.metadata.files_loaded, vec!["good.csv".to_string()]);
    assert_eq!(dataset.metadata.n_experiments, 1);
    assert_eq!(dataset.report.attempted, 2);
    assert_eq!(dataset.report.skipped.len(), 1);
    assert_eq!(dataset.report.skipped[0].file_name, "no_time.csv");
    assert!(dataset.report.skipped[0].reason.contains("time"));
    assert!(!dataset.report.is_clean());
}

#[test]
fn test_all_sources_failing() {
    let dir = data_dir(&[
        ("a.csv", "sample,biomass\n1,1.0\n".to_string()),
        ("b.csv", "time,notes\n0,start\n".to_string()),
    ]);
    let files = MultiExperimentCombiner::discover(dir.path(), "*.csv").unwrap();

    let err = MultiExperimentCombiner::default()
        .combine(&files)
        .unwrap_err();
    assert!(matches!(err, CombineError::NoUsableSources { attempted: 2 }));
}

#[test]
fn test_separate_tables_keep_columns() {
    let dir = data_dir(&[
        ("x1.csv", growth_csv(4, 1.0)),
        ("x2.csv", "time,biomass\n0,1.0\n1,1.2\n2,1.5\n".to_string()),
    ]);

    let output = MultiExperimentCombiner::default()
        .load_dir(dir.path(), "x*.csv", false)
        .unwrap();

    let CombineOutput::Separate(set) = output else {
        panic!("expected separate tables");
    };
    assert_eq!(set.experiments.len(), 2);
    assert_eq!(set.experiments[0].name, "x1");
    assert_eq!(set.experiments[1].len(), 3);
    for experiment in &set.experiments {
        for role in CanonicalRole::MEASURED {
            assert_eq!(experiment.table.get(role).unwrap().len(), experiment.len());
        }
    }
    assert!(set.experiments[1].table.provenance.substrate_estimated);
    assert_eq!(set.metadata.n_samples, 7);
}

#[test]
fn test_explicit_experiment_ids_are_kept() {
    let dir = data_dir(&[(
        "plate.csv",
        "time,biomass,run\n0,1.0,R1\n1,1.1,R1\n0,2.0,R2\n1,2.1,R2\n".to_string(),
    )]);
    let files = MultiExperimentCombiner::discover(dir.path(), "*.csv").unwrap();

    let dataset = MultiExperimentCombiner::default().combine(&files).unwrap();

    // Sorted by time, stable within equal times
    assert_eq!(dataset.time, vec![0.0, 0.0, 1.0, 1.0]);
    assert_eq!(dataset.metadata.experiment_ids, vec!["R1", "R2", "R1", "R2"]);
}

#[test]
fn test_discovery() {
    let dir = data_dir(&[
        ("b.csv", String::new()),
        ("a.csv", String::new()),
        ("notes.txt", String::new()),
    ]);
    fs::create_dir(dir.path().join("nested.csv")).unwrap();

    let files = MultiExperimentCombiner::discover(dir.path(), "*.csv").unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a.csv", "b.csv"]);

    assert!(matches!(
        MultiExperimentCombiner::discover(dir.path(), "*.mat"),
        Err(CombineError::NoFilesMatched { .. })
    ));
    assert!(matches!(
        MultiExperimentCombiner::discover(dir.path(), "[*.csv"),
        Err(CombineError::InvalidPattern(_))
    ));
}

#[test]
fn test_unsupported_format_is_skipped() {
    let dir = data_dir(&[
        ("run.csv", growth_csv(3, 1.0)),
        ("run.xlsx", "binary".to_string()),
    ]);

    let output = MultiExperimentCombiner::default()
        .load_dir(dir.path(), "run.*", true)
        .unwrap();

    assert_eq!(output.metadata().files_loaded, vec!["run.csv".to_string()]);
    assert_eq!(output.report().skipped[0].file_name, "run.xlsx");
}

#[test]
fn test_dataset_csv_and_metadata_json() {
    let dir = data_dir(&[("one.csv", growth_csv(2, 1.0))]);
    let files = MultiExperimentCombiner::discover(dir.path(), "*.csv").unwrap();
    let dataset = MultiExperimentCombiner::default().combine(&files).unwrap();

    let mut out = Vec::new();
    dataset.write_csv(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "time,biomass,substrate,product,experiment_id,file_name"
    );
    assert_eq!(lines[1], "0,1,20,0,one,one.csv");
    assert_eq!(lines.len(), 3);

    let json = dataset.metadata.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["n_experiments"], 1);
    assert_eq!(value["n_samples"], 2);
    assert_eq!(value["files_loaded"][0], "one.csv");
    assert_eq!(Metadata::from_json(&json).unwrap(), dataset.metadata);
}
