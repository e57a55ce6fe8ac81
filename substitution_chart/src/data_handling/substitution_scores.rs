use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::helper_functions::project_root;
use crate::models::{AminoAcid, AminoAcidRecord, Dataset, ScoreTable};

/// Dataset override looked up under the project root.
pub const DATASET_PATH: &str = "data/w_substitutions.json";

const BUNDLED_DATASET: &str = include_str!("../../data/w_substitutions.json");

fn default_title() -> String {
    "W>amino acid substitutions".to_string()
}

fn default_y_label() -> String {
    "Scores".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("W_amino_acid_changes_sorted.svg")
}

/// Score maps, class memberships and chart labels as read from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_y_label")]
    pub y_label: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    pub hydrophobic: Vec<AminoAcid>,
    pub hydrophilic: Vec<AminoAcid>,
    pub median: BTreeMap<AminoAcid, f64>,
    pub q1: BTreeMap<AminoAcid, f64>,
    pub q3: BTreeMap<AminoAcid, f64>,
}

impl ChartConfig {
    /// The dataset compiled into the binary.
    pub fn bundled() -> Result<Self> {
        serde_json::from_str(BUNDLED_DATASET).context("Bundled substitution dataset is malformed")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse dataset {}", path.display()))
    }

    /// Joins the three score maps into records and validates the result.
    pub fn score_table(&self) -> Result<ScoreTable> {
        let lookup = |map: &BTreeMap<AminoAcid, f64>, name: &str, aa: AminoAcid| {
            map.get(&aa)
                .copied()
                .with_context(|| format!("`{}` map has no value for {}", name, aa))
        };

        let records = AminoAcid::ALL
            .iter()
            .map(|&symbol| {
                Ok(AminoAcidRecord {
                    symbol,
                    median: lookup(&self.median, "median", symbol)?,
                    q1: lookup(&self.q1, "q1", symbol)?,
                    q3: lookup(&self.q3, "q3", symbol)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        ScoreTable::new(records, self.hydrophobic.clone(), self.hydrophilic.clone())
    }
}

/// Loads the chart configuration from `path`, or the bundled dataset when `path` is absent.
pub struct SubstitutionDataset {
    pub path: PathBuf,
}

impl SubstitutionDataset {
    pub fn discover() -> Self {
        SubstitutionDataset {
            path: project_root().join(DATASET_PATH),
        }
    }
}

impl Dataset for SubstitutionDataset {
    fn load(&self) -> Result<ChartConfig> {
        if self.path.is_file() {
            info!("Reading substitution scores from {}", self.path.display());
            ChartConfig::from_path(&self.path)
        } else {
            debug!("{} not found", self.path.display());
            info!("Using the bundled substitution dataset");
            ChartConfig::bundled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn bundled_dataset_builds_a_full_table() {
        let config = ChartConfig::bundled().unwrap();
        assert_eq!(config.output, PathBuf::from("W_amino_acid_changes_sorted.svg"));
        assert_eq!(config.title, "W>amino acid substitutions");

        let table = config.score_table().unwrap();
        assert_eq!(table.len(), 20);

        let k = table.record(AminoAcid::K).unwrap();
        assert_eq!((k.median, k.q1, k.q3), (0.995, 0.895, 1.0));
        assert!(table.record(AminoAcid::W).unwrap().is_synonymous());
    }

    #[test]
    fn bundled_classes_partition_all_symbols() {
        let table = ChartConfig::bundled().unwrap().score_table().unwrap();
        for aa in AminoAcid::ALL {
            let hits = [
                crate::models::HydropathyClass::Hydrophobic,
                crate::models::HydropathyClass::Hydrophilic,
            ]
            .iter()
            .filter(|&&class| table.members(class).contains(&aa))
            .count();
            assert_eq!(hits, 1, "{} must belong to exactly one class", aa);
        }
    }

    #[test]
    fn bundled_quartiles_bracket_the_median() {
        let table = ChartConfig::bundled().unwrap().score_table().unwrap();
        for aa in AminoAcid::ALL {
            let r = table.record(aa).unwrap();
            if r.median > 0.0 {
                assert!(r.q1 <= r.median && r.median <= r.q3, "{} out of order", aa);
            }
        }
    }

    #[test]
    fn missing_key_names_the_map() {
        let mut value: serde_json::Value = serde_json::from_str(BUNDLED_DATASET).unwrap();
        value["q3"].as_object_mut().unwrap().remove("Y");
        let file = write_config(&value.to_string());

        let config = ChartConfig::from_path(file.path()).unwrap();
        let err = config.score_table().unwrap_err();
        assert!(err.to_string().contains("`q3` map has no value for Y"));
    }

    #[test]
    fn unknown_symbol_fails_to_parse() {
        let mut value: serde_json::Value = serde_json::from_str(BUNDLED_DATASET).unwrap();
        value["median"]["X"] = serde_json::json!(0.5);
        let file = write_config(&value.to_string());

        assert!(ChartConfig::from_path(file.path()).is_err());
    }

    #[test]
    fn optional_labels_fall_back_to_defaults() {
        let mut value: serde_json::Value = serde_json::from_str(BUNDLED_DATASET).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("title");
        object.remove("output");
        object.insert("y_label".into(), serde_json::json!("Fitness"));
        let file = write_config(&value.to_string());

        let config = ChartConfig::from_path(file.path()).unwrap();
        assert_eq!(config.title, default_title());
        assert_eq!(config.output, default_output());
        assert_eq!(config.y_label, "Fitness");
    }

    #[test]
    fn dataset_prefers_file_over_bundled() {
        let mut value: serde_json::Value = serde_json::from_str(BUNDLED_DATASET).unwrap();
        value["title"] = serde_json::json!("Custom run");
        let file = write_config(&value.to_string());

        let from_file = SubstitutionDataset { path: file.path().to_path_buf() }.load().unwrap();
        assert_eq!(from_file.title, "Custom run");

        let dir = tempfile::tempdir().unwrap();
        let fallback = SubstitutionDataset { path: dir.path().join("absent.json") }.load().unwrap();
        assert_eq!(fallback.title, default_title());
    }
}
