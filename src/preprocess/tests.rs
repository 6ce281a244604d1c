use std::collections::BTreeMap;

use proptest::prelude::*;

use super::*;
use crate::align::TableProvenance;

fn table(time: Vec<f64>, columns: &[(CanonicalRole, Vec<f64>)]) -> AlignedTable {
    AlignedTable {
        time,
        measurements: columns.iter().cloned().collect::<BTreeMap<_, _>>(),
        experiment_ids: None,
        provenance: TableProvenance::default(),
    }
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}

#[test]
fn test_substrate_estimated_and_product_zero_filled() {
    let input = table(
        vec![0.0, 1.0, 2.0, 3.0],
        &[(CanonicalRole::Biomass, vec![1.0, 1.2, 1.5, 1.9])],
    );

    let cleaned = Preprocessor::default().clean(input).unwrap();

    assert_eq!(cleaned.len(), 4);
    assert_close(
        cleaned.get(CanonicalRole::Substrate).unwrap(),
        &[10.0, 10.0 - 0.2 / 0.5, 10.0 - 0.5 / 0.5, 10.0 - 0.9 / 0.5],
    );
    assert_eq!(
        cleaned.get(CanonicalRole::Product),
        Some(&[0.0, 0.0, 0.0, 0.0][..])
    );
    assert!(cleaned.provenance.substrate_estimated);
    assert!(cleaned.provenance.product_filled);
}

#[test]
fn test_estimated_substrate_is_clipped() {
    let estimate = SubstrateEstimate::default().estimate(&[1.0, 4.0, 8.0]);
    assert_close(&estimate, &[10.0, 4.0, 0.0]);

    let custom = SubstrateEstimate {
        initial_substrate: 20.0,
        biomass_yield: 1.0,
    };
    assert_close(&custom.estimate(&[2.0, 5.0]), &[20.0, 17.0]);
    assert!(custom.estimate(&[]).is_empty());
}

#[test]
fn test_single_extreme_outlier_is_dropped() {
    let n = 100;
    let mut biomass: Vec<f64> = (0..n).map(|i| 1.0 + 0.01 * (i % 5) as f64).collect();
    biomass[42] = 50.0;
    let input = table(
        (0..n).map(|i| i as f64).collect(),
        &[
            (CanonicalRole::Biomass, biomass),
            (CanonicalRole::Substrate, vec![5.0; n]),
        ],
    );

    let cleaned = Preprocessor::default().clean(input).unwrap();

    assert_eq!(cleaned.len(), n - 1);
    assert!(!cleaned.time.contains(&42.0));
    assert!(cleaned
        .get(CanonicalRole::Biomass)
        .unwrap()
        .iter()
        .all(|x| *x < 2.0));
}

#[test]
fn test_outliers_exposed_by_removal_are_dropped_in_the_same_pass() {
    // 5.0 only stands out once 1000.0 is gone
    let mut biomass = vec![1.0; 20];
    biomass.extend([5.0, 1000.0]);
    let n = biomass.len();
    let input = table(
        (0..n).map(|i| i as f64).collect(),
        &[(CanonicalRole::Biomass, biomass)],
    );

    let preprocessor = Preprocessor::default();
    let once = preprocessor.clean(input).unwrap();
    assert_eq!(once.len(), 20);
    assert!(once.get(CanonicalRole::Biomass).unwrap().iter().all(|x| *x == 1.0));

    let twice = preprocessor.clean(once.clone()).unwrap();
    assert_eq!(twice.time, once.time);
    assert_eq!(twice.measurements, once.measurements);
}

#[test]
fn test_infinite_product_is_zero_filled() {
    let input = table(
        vec![0.0, 1.0, 2.0],
        &[
            (CanonicalRole::Biomass, vec![1.0, 1.1, 1.2]),
            (CanonicalRole::Substrate, vec![5.0, 4.5, 4.0]),
            (
                CanonicalRole::Product,
                vec![0.1, f64::INFINITY, f64::NEG_INFINITY],
            ),
        ],
    );

    let cleaned = Preprocessor::default().clean(input).unwrap();

    assert_eq!(
        cleaned.get(CanonicalRole::Product),
        Some(&[0.1, 0.0, 0.0][..])
    );
    assert!(!cleaned.provenance.product_filled);
}

#[test]
fn test_outlier_removal_can_be_disabled() {
    let n = 50;
    let mut biomass = vec![1.0; n];
    biomass[7] = 80.0;
    let input = table(
        (0..n).map(|i| i as f64).collect(),
        &[(CanonicalRole::Biomass, biomass)],
    );

    let config = PreprocessConfig {
        remove_outliers: false,
        ..Default::default()
    };
    let cleaned = Preprocessor::new(config).clean(input).unwrap();
    assert_eq!(cleaned.len(), n);
}

#[test]
fn test_missing_values_and_clipping() {
    let input = table(
        vec![0.0, 1.0, f64::NAN, 3.0, 4.0],
        &[
            (CanonicalRole::Biomass, vec![1.0, f64::NAN, 2.0, -0.5, 3.0]),
            (
                CanonicalRole::Substrate,
                vec![5.0, 4.0, 3.0, f64::NAN, -1.0],
            ),
            (CanonicalRole::Product, vec![f64::NAN, 0.1, 0.2, 0.3, 0.4]),
        ],
    );
    let config = PreprocessConfig {
        remove_outliers: false,
        ..Default::default()
    };

    let cleaned = Preprocessor::new(config).clean(input).unwrap();

    assert_eq!(cleaned.time, vec![0.0, 3.0, 4.0]);
    assert_eq!(
        cleaned.get(CanonicalRole::Biomass),
        Some(&[1.0, 0.0, 3.0][..])
    );
    assert_eq!(
        cleaned.get(CanonicalRole::Substrate),
        Some(&[5.0, 0.0, 0.0][..])
    );
    assert_eq!(
        cleaned.get(CanonicalRole::Product),
        Some(&[0.0, 0.3, 0.4][..])
    );
    assert!(!cleaned.provenance.substrate_estimated);
    assert!(!cleaned.provenance.product_filled);
}

#[test]
fn test_rows_sorted_by_time_with_labels() {
    let mut input = table(
        vec![2.0, 0.0, 1.0, 0.0],
        &[(CanonicalRole::Biomass, vec![1.2, 1.0, 1.1, 0.9])],
    );
    input.experiment_ids = Some(
        ["c", "a", "b", "a2"]
            .into_iter()
            .map(String::from)
            .collect(),
    );

    let cleaned = Preprocessor::default().clean(input).unwrap();

    assert_eq!(cleaned.time, vec![0.0, 0.0, 1.0, 2.0]);
    assert_eq!(
        cleaned.get(CanonicalRole::Biomass),
        Some(&[1.0, 0.9, 1.1, 1.2][..])
    );
    assert_eq!(
        cleaned.experiment_ids,
        Some(vec![
            "a".to_string(),
            "a2".to_string(),
            "b".to_string(),
            "c".to_string()
        ])
    );
}

#[test]
fn test_missing_biomass_is_unresolved() {
    let input = table(
        vec![0.0, 1.0],
        &[(CanonicalRole::Substrate, vec![5.0, 4.0])],
    );
    assert!(matches!(
        Preprocessor::default().clean(input),
        Err(SourceError::UnresolvedRole {
            role: CanonicalRole::Biomass,
            ..
        })
    ));
}

#[test]
fn test_table_emptied_by_missing_values() {
    let input = table(
        vec![0.0, 1.0],
        &[(CanonicalRole::Biomass, vec![f64::NAN, f64::NAN])],
    );
    assert!(matches!(
        Preprocessor::default().clean(input),
        Err(SourceError::EmptyAfterCleaning {
            stage: "missing_values"
        })
    ));
}

#[test]
fn test_z_scores_use_sample_deviation() {
    let scores = z_scores(&[1.0, 2.0, 3.0]);
    assert_close(&scores, &[-1.0, 0.0, 1.0]);

    assert_eq!(z_scores(&[4.0, 4.0, 4.0]), vec![0.0, 0.0, 0.0]);
    assert_eq!(z_scores(&[7.0]), vec![0.0]);
    assert!(z_scores(&[]).is_empty());
}

fn raw_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -5.0f64..50.0,
        1 => Just(f64::NAN),
    ]
}

proptest! {
    #[test]
    fn test_cleaned_tables_are_ordered_and_non_negative(
        rows in prop::collection::vec((0.0f64..100.0, raw_value(), raw_value(), raw_value()), 1..60),
    ) {
        let input = table(
            rows.iter().map(|r| r.0).collect(),
            &[
                (CanonicalRole::Biomass, rows.iter().map(|r| r.1).collect()),
                (CanonicalRole::Substrate, rows.iter().map(|r| r.2).collect()),
                (CanonicalRole::Product, rows.iter().map(|r| r.3).collect()),
            ],
        );

        if let Ok(cleaned) = Preprocessor::default().clean(input) {
            prop_assert!(cleaned.time.windows(2).all(|w| w[0] <= w[1]));
            for role in CanonicalRole::MEASURED {
                let values = cleaned.get(role).unwrap();
                prop_assert_eq!(values.len(), cleaned.len());
                prop_assert!(values.iter().all(|v| v.is_finite() && *v >= 0.0));
            }
        }
    }

    #[test]
    fn test_cleaning_is_idempotent(
        rows in prop::collection::vec((0.0f64..100.0, raw_value(), 0.0f64..20.0), 1..80),
        spikes in prop::collection::vec((any::<prop::sample::Index>(), 100.0f64..1e4), 0..4),
        with_substrate in any::<bool>(),
    ) {
        let mut biomass: Vec<f64> = rows.iter().map(|r| r.1).collect();
        for (index, spike) in &spikes {
            biomass[index.index(rows.len())] = *spike;
        }
        let mut columns = vec![(CanonicalRole::Biomass, biomass)];
        if with_substrate {
            columns.push((CanonicalRole::Substrate, rows.iter().map(|r| r.2).collect()));
        }
        let input = table(rows.iter().map(|r| r.0).collect(), &columns);

        let preprocessor = Preprocessor::default();
        if let Ok(once) = preprocessor.clean(input) {
            let twice = preprocessor.clean(once.clone()).unwrap();
            prop_assert_eq!(&twice.time, &once.time);
            prop_assert_eq!(&twice.measurements, &once.measurements);
        }
    }
}
