#![allow(dead_code)]

use material_agent::chem::{Composition, ElementPropertyFeaturizer};
use material_agent::model::{BoostingParams, GradientBoostedClassifier};
use std::path::{Path, PathBuf};

/// Formulas containing Fe or Co.
pub const FE_CO: [&str; 12] = [
    "Fe2O3", "FeS2", "Fe3O4", "CoO", "LiCoO2", "Co3O4", "FeCo", "Fe(CO)5", "CoFe2O4", "FeTiO3",
    "FeCl3", "CoS",
];

/// Formulas with neither Fe nor Co.
pub const OTHERS: [&str; 12] = [
    "NaCl", "CuO", "Al2O3", "TiO2", "ZnS", "MgO", "Ni3Al", "SiC", "LiMn2O4", "BaTiO3", "SrTiO3",
    "CaF2",
];

/// Write a 100-row material table: 12 Fe/Co rows spread through 87 others
/// and one unparseable formula.
pub fn write_materials(dir: &Path) -> PathBuf {
    let mut substances: Vec<&str> = (0..87).map(|i| OTHERS[i % OTHERS.len()]).collect();
    substances.push("Xx2O");
    for (k, f) in FE_CO.iter().enumerate() {
        substances.insert(k * 8, f);
    }
    assert_eq!(substances.len(), 100);
    write_csv(dir, "materials.csv", "id,Substance,band_gap", |i| {
        format!("{},{},{:.2}", i, substances[i], i as f64 * 0.05)
    }, 100)
}

pub fn write_csv(
    dir: &Path,
    name: &str,
    header: &str,
    row: impl Fn(usize) -> String,
    n: usize,
) -> PathBuf {
    let mut body = format!("{}\n", header);
    for i in 0..n {
        body.push_str(&row(i));
        body.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Labeled rows where iron-bearing compounds are positive.
pub fn write_training_set(dir: &Path) -> PathBuf {
    let all: Vec<(&str, u8)> = FE_CO
        .iter()
        .map(|f| (*f, u8::from(f.contains("Fe"))))
        .chain(OTHERS.iter().map(|f| (*f, 0)))
        .collect();
    write_csv(dir, "train.csv", "Substance,label", |i| {
        let (f, y) = all[i % all.len()];
        format!("{},{}", f, y)
    }, all.len() * 3)
}

/// Fit a small classifier on iron content and save it.
pub fn train_small_model(dir: &Path) -> PathBuf {
    let featurizer = ElementPropertyFeaturizer::magpie();
    let mut x = Vec::new();
    let mut y = Vec::new();
    for f in FE_CO.iter().chain(OTHERS.iter()) {
        let composition = Composition::parse(f).unwrap();
        x.push(featurizer.featurize(&composition));
        y.push(if f.contains("Fe") { 1.0 } else { 0.0 });
    }
    let params = BoostingParams {
        iterations: 30,
        depth: 3,
        learning_rate: 0.3,
        verbose: 0,
        ..BoostingParams::default()
    };
    let model =
        GradientBoostedClassifier::fit(&x, &y, featurizer.feature_labels(), params).unwrap();
    let path = dir.join("model").join("gbdt_model.json");
    model.save(&path).unwrap();
    path
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
