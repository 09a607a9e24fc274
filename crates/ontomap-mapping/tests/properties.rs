//! Extraction and classification properties over generated inputs.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ontomap_core::{DataType, PointRecord, Sample, FEATURE_COUNT};
use ontomap_mapping::{CandidateClassifier, FeatureExtractor, LexiconModel};
use ontomap_testing::{sample_schema, DataPattern, HistoryGenerator, StubModel};

const NAMES: &[&str] = &[
    "AHU1_SAT", "VAV-101 ZN-T", "CHWST", "", "Misc", "RTU2.SF.Cmd", "zone temp sp", "%%%",
    "Boiler2_HWST", "OAT", "FCU3_DPR_POS",
];
const UNITS: &[&str] = &["°F", "null", "", "cfm", "psi", "%RH", "furlongs", "kW"];

fn random_record(rng: &mut StdRng, i: usize) -> PointRecord {
    let mut record = PointRecord::new(format!("p{}", i), NAMES[rng.gen_range(0..NAMES.len())]);
    if rng.gen_bool(0.5) {
        record = record.with_units(UNITS[rng.gen_range(0..UNITS.len())]);
    }
    if rng.gen_bool(0.3) {
        record = record.with_description("Supply air temperature");
    }
    record = record.with_data_type(DataType::ALL[rng.gen_range(0..DataType::ALL.len())]);
    if rng.gen_bool(0.5) {
        let history = HistoryGenerator::with_seed(i as u64).starting_at(0).generate(
            &DataPattern::Random {
                min: -10.0,
                max: 90.0,
            },
            rng.gen_range(0..20),
            60,
        );
        record = record.with_history(history);
    }
    if rng.gen_bool(0.1) {
        record = record.with_history(vec![Sample::new(0, f64::NAN), Sample::new(1, f64::INFINITY)]);
    }
    record
}

#[test]
fn test_extract_has_fixed_length() {
    let mut rng = StdRng::seed_from_u64(11);
    let extractor = FeatureExtractor::new();
    for i in 0..200 {
        let record = random_record(&mut rng, i);
        let fv = extractor.extract(&record);
        assert_eq!(fv.len(), FEATURE_COUNT, "record {:?}", record);
        assert_eq!(fv.point_id, record.id);
    }
}

#[test]
fn test_extract_is_reproducible() {
    let mut rng = StdRng::seed_from_u64(5);
    let extractor = FeatureExtractor::new();
    for i in 0..50 {
        let record = random_record(&mut rng, i);
        assert_eq!(extractor.extract(&record), extractor.extract(&record));
    }
}

#[test]
fn test_classify_is_descending_and_sums_to_one() {
    let schema = sample_schema();
    let classes = schema.point_type_names();
    let mut rng = StdRng::seed_from_u64(3);
    let extractor = FeatureExtractor::new();

    let mut model = StubModel::for_schema(&schema);
    let mut records = Vec::new();
    for i in 0..100 {
        let record = random_record(&mut rng, i);
        let picks: Vec<(&str, f64)> = (0..rng.gen_range(0..4))
            .map(|_| {
                (
                    classes[rng.gen_range(0..classes.len())].as_str(),
                    rng.gen_range(0.0..0.5),
                )
            })
            .collect();
        model.insert(record.id.as_str(), &picks);
        records.push(record);
    }

    let stub = CandidateClassifier::new(Arc::new(model));
    let lexicon = CandidateClassifier::new(Arc::new(LexiconModel::from_schema(&schema)));
    for classifier in [&stub, &lexicon] {
        for record in &records {
            let candidates = classifier.classify(&extractor.extract(record)).unwrap();
            assert!(!candidates.is_empty());
            assert!(candidates.last().unwrap().is_unknown());
            assert!(candidates
                .windows(2)
                .all(|w| w[0].confidence >= w[1].confidence));
            assert!(candidates.iter().all(|c| (0.0..=1.0).contains(&c.confidence)));
            let sum: f64 = candidates.iter().map(|c| c.confidence).sum();
            assert!((sum - 1.0).abs() < 1e-9, "sum {} for {}", sum, record.name);
        }
    }
}

#[test]
fn test_classify_is_deterministic() {
    let schema = sample_schema();
    let classifier = CandidateClassifier::new(Arc::new(LexiconModel::from_schema(&schema)));
    let extractor = FeatureExtractor::new();
    let record = PointRecord::new("p1", "AHU1_SAT").with_units("°F");

    let fv = extractor.extract(&record);
    assert_eq!(classifier.classify(&fv).unwrap(), classifier.classify(&fv).unwrap());
}
