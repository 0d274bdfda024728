mod common;

use common::*;
use material_agent::pipeline::dataset::{COMPOSITION_COLUMN, MATCH_COLUMN, SCORE_COLUMN};
use material_agent::pipeline::{MaterialPipeline, Table};

fn loaded(dir: &std::path::Path) -> MaterialPipeline {
    let data = write_materials(dir);
    let mut pipeline = MaterialPipeline::new();
    let out = pipeline.read_data(data.to_str().unwrap());
    assert!(out.success, "{}", out.message);
    pipeline
}

#[test]
fn read_match_save_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_materials(dir.path());
    let mut pipeline = MaterialPipeline::new();

    let out = pipeline.read_data(data.to_str().unwrap());
    assert_eq!(
        out.message,
        "Successfully read material expressions, total 100 records"
    );
    let features = pipeline.dataset().features().unwrap();
    assert_eq!(features.n_rows(), 100);
    assert_eq!(features.n_columns(), 30);
    assert_eq!(pipeline.dataset().parsed_count(), 99);

    let out = pipeline.rule_match("Fe,Co");
    assert!(out.success);
    assert_eq!(
        out.message,
        "Rule matching completed successfully, found 12 materials containing specified elements"
    );

    let save_path = dir.path().join("out").join("result.csv");
    let out = pipeline.save_result(save_path.to_str().unwrap());
    assert_eq!(
        out.message,
        format!(
            "Results successfully saved to {}, total 12 records",
            save_path.display()
        )
    );

    let lines = read_lines(&save_path);
    assert_eq!(lines.len(), 13);
    assert_eq!(lines[0], "id,Substance,band_gap,composition,rule_match");
    assert!(lines[1..].iter().all(|l| l.ends_with(",True")));
}

#[test]
fn saved_subset_reloads_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = loaded(dir.path());
    pipeline.rule_match("Co, Fe");
    let expected: Vec<String> = pipeline
        .dataset()
        .substances()
        .into_iter()
        .zip(pipeline.dataset().match_flags().unwrap())
        .filter(|(_, m)| **m)
        .map(|(s, _)| s.to_string())
        .collect();
    assert_eq!(expected, FE_CO.to_vec());

    let save_path = dir.path().join("subset.csv");
    assert!(pipeline.save_result(save_path.to_str().unwrap()).success);

    let mut reloaded = MaterialPipeline::new();
    let out = reloaded.read_data(save_path.to_str().unwrap());
    assert_eq!(
        out.message,
        "Successfully read material expressions, total 12 records"
    );
    assert_eq!(reloaded.dataset().substances(), expected);
    // Derived columns from the first session are not carried as raw data.
    assert_eq!(reloaded.dataset().columns(), &["id", "Substance", "band_gap"]);
}

#[test]
fn match_uses_any_element_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_csv(
        dir.path(),
        "small.csv",
        "Substance",
        |i| ["Fe2O3", "CuO", "ZnFe2O4"][i].to_string(),
        3,
    );
    let mut pipeline = MaterialPipeline::new();
    pipeline.read_data(data.to_str().unwrap());

    let out = pipeline.rule_match("Fe,Au");
    assert!(out.message.contains("found 2 materials"));
    assert_eq!(pipeline.dataset().match_flags().unwrap(), &[true, false, true]);

    let out = pipeline.rule_match("Zn");
    assert!(out.message.contains("found 1 materials"));
}

#[test]
fn disjoint_and_exhaustive_element_lists() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = loaded(dir.path());

    let out = pipeline.rule_match("Au,Pt,U");
    assert!(out.success);
    assert!(out.message.contains("found 0 materials"));
    assert!(pipeline.dataset().matched().unwrap().is_empty());

    let every: Vec<&str> = material_agent::chem::elements::ELEMENTS
        .iter()
        .map(|e| e.symbol)
        .collect();
    let out = pipeline.rule_match(&every.join(","));
    assert!(out.message.contains("found 99 materials"));
}

#[test]
fn lowercase_symbols_do_not_match() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = loaded(dir.path());
    let out = pipeline.rule_match("fe,co");
    assert!(out.message.contains("found 0 materials"));
}

#[test]
fn empty_element_list_matches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = loaded(dir.path());
    let out = pipeline.rule_match(" , ");
    assert!(out.success);
    assert_eq!(
        out.message,
        "Rule matching completed successfully, found 0 materials containing specified elements"
    );
    assert!(pipeline.dataset().matched().unwrap().is_empty());

    let save_path = dir.path().join("empty.csv");
    let out = pipeline.save_result(save_path.to_str().unwrap());
    assert!(out.success, "{}", out.message);
    assert_eq!(
        read_lines(&save_path),
        vec!["id,Substance,band_gap,composition,rule_match"]
    );
}

#[test]
fn save_before_match_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = loaded(dir.path());
    let save_path = dir.path().join("never.csv");

    let out = pipeline.save_result(save_path.to_str().unwrap());
    assert!(!out.success);
    assert_eq!(out.message, "Please perform rule matching first");
    assert!(!save_path.exists());
}

#[test]
fn reload_clears_previous_match() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = loaded(dir.path());
    pipeline.rule_match("Fe");
    assert!(pipeline.dataset().matched().is_some());

    let data = dir.path().join("materials.csv");
    pipeline.read_data(data.to_str().unwrap());
    assert!(pipeline.dataset().matched().is_none());
    assert_eq!(
        pipeline.save_result("x.csv").message,
        "Please perform rule matching first"
    );
}

#[test]
fn load_failures_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = MaterialPipeline::new();

    let missing = dir.path().join("nope.csv");
    let out = pipeline.read_data(missing.to_str().unwrap());
    assert_eq!(
        out.message,
        format!("File does not exist: {}", missing.display())
    );

    let bad = write_csv(dir.path(), "bad.csv", "formula", |_| "Fe".into(), 1);
    let out = pipeline.read_data(bad.to_str().unwrap());
    assert!(!out.success);
    assert_eq!(
        out.message,
        "Failed to read data: missing required column 'Substance'"
    );
}

#[test]
fn failed_reload_keeps_previous_session() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_small_model(dir.path());
    let mut pipeline = loaded(dir.path());
    assert!(pipeline.model_predict(model.to_str().unwrap()).success);
    assert!(pipeline.rule_match("Fe,Co").success);

    let substances: Vec<String> = pipeline
        .dataset()
        .substances()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let scores = pipeline.dataset().scores().unwrap().to_vec();
    let matched_rows = pipeline.dataset().matched().unwrap().len();

    let no_substance = write_csv(dir.path(), "bad.csv", "formula", |_| "Fe".into(), 1);
    let out = pipeline.read_data(no_substance.to_str().unwrap());
    assert!(!out.success);
    let ragged = write_csv(
        dir.path(),
        "ragged.csv",
        "id,Substance",
        |i| match i {
            1 => "1,FeO,extra".into(),
            _ => format!("{},CuO", i),
        },
        3,
    );
    let out = pipeline.read_data(ragged.to_str().unwrap());
    assert!(!out.success);
    assert!(out.message.starts_with("Failed to read data: "));

    assert_eq!(pipeline.dataset().substances(), substances);
    assert_eq!(pipeline.dataset().scores().unwrap(), scores.as_slice());
    assert_eq!(pipeline.dataset().matched().unwrap().len(), matched_rows);

    let save_path = dir.path().join("kept.csv");
    assert!(pipeline.save_result(save_path.to_str().unwrap()).success);
    assert_eq!(read_lines(&save_path).len(), matched_rows + 1);
}

#[test]
fn path_arguments_are_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_materials(dir.path());
    let mut pipeline = MaterialPipeline::new();
    let messy = format!("  `{}`\n", data.display());
    assert!(pipeline.read_data(&messy).success);
}

#[test]
fn predict_sorts_by_score_and_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_small_model(dir.path());
    let mut pipeline = loaded(dir.path());

    let out = pipeline.model_predict(model.to_str().unwrap());
    assert!(out.success, "{}", out.message);
    assert_eq!(out.message, "Model prediction completed successfully");

    let scores = pipeline.dataset().scores().unwrap().to_vec();
    assert_eq!(scores.len(), 100);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(scores.iter().all(|p| (0.0..=1.0).contains(p)));
    let order: Vec<String> = pipeline
        .dataset()
        .substances()
        .iter()
        .map(|s| s.to_string())
        .collect();
    // Iron compounds were the positives.
    let mean = |want_fe: bool| {
        let picked: Vec<f64> = order
            .iter()
            .zip(&scores)
            .filter(|(s, _)| s.contains("Fe") == want_fe && s.as_str() != "Xx2O")
            .map(|(_, p)| *p)
            .collect();
        picked.iter().sum::<f64>() / picked.len() as f64
    };
    assert!(mean(true) > mean(false));

    pipeline.model_predict(model.to_str().unwrap());
    assert_eq!(pipeline.dataset().scores().unwrap(), scores.as_slice());
    assert_eq!(pipeline.dataset().substances(), order);
}

#[test]
fn matched_rows_carry_scores_after_predict() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_small_model(dir.path());
    let mut pipeline = loaded(dir.path());
    pipeline.model_predict(model.to_str().unwrap());
    pipeline.rule_match("Fe,Co");

    let save_path = dir.path().join("scored.csv");
    pipeline.save_result(save_path.to_str().unwrap());
    let saved = Table::read_csv(&save_path).unwrap();
    assert_eq!(
        &saved.columns[3..],
        &[COMPOSITION_COLUMN, SCORE_COLUMN, MATCH_COLUMN]
    );
    let saved_scores: Vec<f64> = saved
        .column_values(4)
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(saved_scores.len(), 12);
    assert!(saved_scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn predict_failures_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = loaded(dir.path());

    let missing = dir.path().join("missing.json");
    let out = pipeline.model_predict(missing.to_str().unwrap());
    assert_eq!(
        out.message,
        format!("Model file does not exist: {}", missing.display())
    );

    let corrupt = dir.path().join("corrupt.json");
    std::fs::write(&corrupt, "{not json").unwrap();
    let out = pipeline.model_predict(corrupt.to_str().unwrap());
    assert!(!out.success);
    assert!(out.message.starts_with("Model prediction failed: "));
    assert!(pipeline.dataset().scores().is_none());

    let mut model: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(train_small_model(dir.path())).unwrap())
            .unwrap();
    model["trees"] = serde_json::json!([{ "nodes": [] }]);
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, model.to_string()).unwrap();
    let out = pipeline.model_predict(broken.to_str().unwrap());
    assert!(!out.success);
    assert!(out.message.contains("tree has no nodes"), "{}", out.message);
    assert!(pipeline.dataset().scores().is_none());
}
