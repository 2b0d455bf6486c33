use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::ScoringPolicy;

/// Everything a run reads from the config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub policy: ScoringPolicy,
    pub files: FileConfig,
}

/// Input and output locations.
///
/// Defaults follow the tournament's naming: per-event files carry a
/// `-<year>-<weekday>` tag so each tournament day keeps its own dataset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Raw scan file. The name `none` skips ingest for this run.
    pub raw: PathBuf,
    pub keys: PathBuf,
    pub roster: PathBuf,
    pub schools: PathBuf,
    pub dataset: PathBuf,
    pub final_dataset: PathBuf,
    pub results_dir: PathBuf,
    pub audit_log: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self::for_date(chrono::Local::now().date_naive())
    }
}

/// `-<year>-<weekday>`, e.g. `-2024-Sat`.
pub fn date_tag(date: NaiveDate) -> String {
    format!("-{}-{}", date.year(), date.format("%a"))
}

impl FileConfig {
    pub fn for_date(date: NaiveDate) -> Self {
        let tag = date_tag(date);
        Self {
            raw: PathBuf::from("MaST-Raw.dat"),
            keys: PathBuf::from("MaST-Keys.yaml"),
            roster: PathBuf::from("MaST-Students.json"),
            schools: PathBuf::from("MaST-Schools.json"),
            dataset: PathBuf::from(format!("MaST-data{}.json", tag)),
            final_dataset: PathBuf::from(format!("MaST-data-final{}.json", tag)),
            results_dir: PathBuf::from(format!("MaST-results{}", tag)),
            audit_log: PathBuf::from(format!("MaST-{}.log", date.year())),
        }
    }

    /// True when the raw file name asks to skip ingest.
    pub fn skips_raw(&self) -> bool {
        self.raw
            .to_str()
            .is_some_and(|name| name.eq_ignore_ascii_case("none"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    #[test]
    fn test_default_names_carry_year_and_weekday() {
        let files = FileConfig::for_date(saturday());
        assert_eq!(files.dataset, PathBuf::from("MaST-data-2024-Sat.json"));
        assert_eq!(
            files.final_dataset,
            PathBuf::from("MaST-data-final-2024-Sat.json")
        );
        assert_eq!(files.results_dir, PathBuf::from("MaST-results-2024-Sat"));
        assert_eq!(files.audit_log, PathBuf::from("MaST-2024.log"));
    }

    #[test]
    fn test_date_tag() {
        assert_eq!(date_tag(saturday()), "-2024-Sat");
    }

    #[test]
    fn test_none_raw_file_skips() {
        let mut files = FileConfig::for_date(saturday());
        assert!(!files.skips_raw());
        files.raw = PathBuf::from("None");
        assert!(files.skips_raw());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
policy:
  max_school_id: 300
files:
  raw: scans/morning.dat
"#;
        let config: AppConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.policy.max_school_id, 300);
        assert_eq!(config.policy.students_per_school, 12);
        assert_eq!(config.files.raw, PathBuf::from("scans/morning.dat"));
        assert_eq!(config.files.keys, PathBuf::from("MaST-Keys.yaml"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "files:\n  rawfile: x.dat\n";
        assert!(serde_saphyr::from_str::<AppConfig>(yaml).is_err());
    }
}
