use larva::predict::{format_outcome, run_prediction};
use larva::{Feature, FeatureVector, PredictionOutcome, XgbRegressor};

/// Depth-2 tree on weight (feature 0) and death temperature T1 (feature 6),
/// plus a second stump on length (feature 2). Missing weight goes right,
/// missing T1 goes left, missing length goes left.
const MODEL_JSON: &str = r#"{
    "learner": {
        "attributes": {},
        "feature_names": [],
        "feature_types": [],
        "gradient_booster": {
            "name": "gbtree",
            "model": {
                "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                "tree_info": [0, 0],
                "trees": [
                    {
                        "id": 0,
                        "base_weights": [0, 0, 0, 0, 0],
                        "left_children": [1, 3, -1, -1, -1],
                        "right_children": [2, 4, -1, -1, -1],
                        "parents": [2147483647, 0, 0, 1, 1],
                        "split_indices": [0, 6, 0, 0, 0],
                        "split_conditions": [0.4, 62.5, 300.0, 100.0, 200.0],
                        "default_left": [0, 1, 0, 0, 0],
                        "split_type": [0, 0, 0, 0, 0],
                        "categories": [],
                        "categories_nodes": [],
                        "categories_segments": [],
                        "categories_sizes": [],
                        "loss_changes": [1.0, 1.0, 0.0, 0.0, 0.0],
                        "sum_hessian": [10.0, 5.0, 5.0, 2.0, 3.0],
                        "tree_param": {"num_deleted": "0", "num_feature": "8", "num_nodes": "5", "size_leaf_vector": "1"}
                    },
                    {
                        "id": 1,
                        "base_weights": [0, 0, 0],
                        "left_children": [1, -1, -1],
                        "right_children": [2, -1, -1],
                        "parents": [2147483647, 0, 0],
                        "split_indices": [2, 0, 0],
                        "split_conditions": [2.5, -4.0, 8.0],
                        "default_left": [1, 0, 0],
                        "split_type": [0, 0, 0],
                        "categories": [],
                        "categories_nodes": [],
                        "categories_segments": [],
                        "categories_sizes": [],
                        "loss_changes": [1.0, 0.0, 0.0],
                        "sum_hessian": [10.0, 4.0, 6.0],
                        "tree_param": {"num_deleted": "0", "num_feature": "8", "num_nodes": "3", "size_leaf_vector": "1"}
                    }
                ]
            }
        },
        "learner_model_param": {"base_score": "1E1", "boost_from_average": "1", "num_class": "0", "num_feature": "8", "num_target": "1"},
        "objective": {"name": "reg:squarederror", "reg_loss_param": {"scale_pos_weight": "1"}}
    },
    "version": [1, 7, 6]
}"#;

fn write_model(json: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tmpdir");
    let path = dir.path().join("xgb_model.json");
    std::fs::write(&path, json).expect("write model");
    (dir, path)
}

fn scenario_b() -> FeatureVector {
    FeatureVector::new([0.5, 0.01, 3.0, 10.0, 2.0, 1.2, 60.0, 65.0])
}

#[test]
fn all_missing_input_is_rejected() {
    let (_dir, path) = write_model(MODEL_JSON);
    let model = XgbRegressor::load(&path).expect("load");

    let outcome = run_prediction(&model, &FeatureVector::all_missing_vector());
    assert_eq!(outcome, PredictionOutcome::AllMissingError);
}

#[test]
fn complete_input_predicts_without_caveat() {
    let (_dir, path) = write_model(MODEL_JSON);
    let model = XgbRegressor::load(&path).expect("load");

    // weight 0.5 >= 0.4 -> 300, length 3.0 >= 2.5 -> 8, base 10
    let outcome = run_prediction(&model, &scenario_b());
    assert_eq!(
        outcome,
        PredictionOutcome::Success {
            value: 318.0,
            had_missing_inputs: false
        }
    );
    assert_eq!(format_outcome(&outcome), "✅ Time to death: 318.0000 seconds");
}

#[test]
fn one_missing_value_predicts_with_caveat() {
    let (_dir, path) = write_model(MODEL_JSON);
    let model = XgbRegressor::load(&path).expect("load");

    let mut features = scenario_b();
    features.mark_missing(Feature::Weight);

    // missing weight defaults right -> 300
    let outcome = run_prediction(&model, &features);
    assert_eq!(
        outcome,
        PredictionOutcome::Success {
            value: 318.0,
            had_missing_inputs: true
        }
    );
    assert!(format_outcome(&outcome).contains("might be less accurate"));
}

#[test]
fn missing_values_follow_default_branches() {
    let (_dir, path) = write_model(MODEL_JSON);
    let model = XgbRegressor::load(&path).expect("load");

    let mut features = FeatureVector::all_missing_vector();
    features.set(Feature::Weight, 0.2);

    // weight 0.2 -> left, T1 missing -> left (100), length missing -> left (-4), base 10
    assert_eq!(run_prediction(&model, &features).value(), Some(106.0));

    features.set(Feature::DeathTempT1, 70.0);
    assert_eq!(run_prediction(&model, &features).value(), Some(206.0));
}

#[test]
fn feature_count_mismatch_is_a_prediction_failure() {
    let json = MODEL_JSON.replace(
        "\"num_feature\": \"8\", \"num_target\"",
        "\"num_feature\": \"10\", \"num_target\"",
    );
    let (_dir, path) = write_model(&json);
    let model = XgbRegressor::load(&path).expect("load");

    let outcome = run_prediction(&model, &scenario_b());
    match &outcome {
        PredictionOutcome::PredictionFailure { message } => {
            assert!(message.contains("expected: 10, got 8"), "{}", message);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(format_outcome(&outcome).starts_with("❌ Prediction Failed!"));
}

#[test]
fn unreadable_model_is_a_load_error() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let err = XgbRegressor::load(dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("absent.json"));

    let (_dir, path) = write_model("{ not json");
    assert!(XgbRegressor::load(&path).is_err());
}

#[test]
fn overflowing_model_output_is_a_prediction_failure() {
    let json = MODEL_JSON
        .replace("reg:squarederror", "reg:gamma")
        .replace("[0.4, 62.5, 300.0, 100.0, 200.0]", "[0.4, 62.5, 900.0, 100.0, 200.0]");
    let (_dir, path) = write_model(&json);
    let model = XgbRegressor::load(&path).expect("load");

    match run_prediction(&model, &scenario_b()) {
        PredictionOutcome::PredictionFailure { message } => {
            assert!(message.contains("non-finite"), "{}", message);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn early_stopped_model_ignores_later_trees() {
    let json = MODEL_JSON.replace(
        "\"attributes\": {},",
        "\"attributes\": {\"best_iteration\": \"0\", \"best_score\": \"12.5\"},",
    );
    let (_dir, path) = write_model(&json);
    let model = XgbRegressor::load(&path).expect("load");

    // tree 1 (length stump, +8) is past best_iteration
    assert_eq!(run_prediction(&model, &scenario_b()).value(), Some(310.0));
}
