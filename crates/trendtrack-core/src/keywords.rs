use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One tracked search keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub keyword: String,
    /// First upload date worth collecting; full-history runs start here.
    pub since: NaiveDate,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub notes: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct KeywordsFile {
    pub keywords: Vec<KeywordConfig>,
}

impl KeywordsFile {
    /// Keywords with `enabled: true`, in file order.
    pub fn enabled(&self) -> impl Iterator<Item = &KeywordConfig> {
        self.keywords.iter().filter(|k| k.enabled)
    }

    /// Case-insensitive lookup by keyword text.
    #[must_use]
    pub fn find(&self, keyword: &str) -> Option<&KeywordConfig> {
        let needle = keyword.trim().to_lowercase();
        self.keywords
            .iter()
            .find(|k| k.keyword.trim().to_lowercase() == needle)
    }
}

/// Load and validate the keywords YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_keywords(path: &Path) -> Result<KeywordsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_keywords(&content)
}

fn parse_keywords(content: &str) -> Result<KeywordsFile, ConfigError> {
    let file: KeywordsFile =
        serde_yaml::from_str(content).map_err(ConfigError::KeywordsFileParse)?;
    validate_keywords(&file)?;
    Ok(file)
}

fn validate_keywords(file: &KeywordsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in &file.keywords {
        let normalized = entry.keyword.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ConfigError::Validation(
                "keyword must be non-empty".to_string(),
            ));
        }
        if !seen.insert(normalized) {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword: '{}'",
                entry.keyword
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_with_default_enabled() {
        let yaml = r"
keywords:
  - keyword: chef lim
    since: 2025-09-01
  - keyword: mala tang
    since: 2025-11-15
    enabled: false
    notes: paused until spring
";
        let file = parse_keywords(yaml).expect("valid keywords file");
        assert_eq!(file.keywords.len(), 2);
        assert!(file.keywords[0].enabled);
        assert_eq!(
            file.keywords[0].since,
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );

        let enabled: Vec<&str> = file.enabled().map(|k| k.keyword.as_str()).collect();
        assert_eq!(enabled, vec!["chef lim"]);
    }

    #[test]
    fn duplicate_keywords_are_rejected_case_insensitively() {
        let yaml = r"
keywords:
  - keyword: Chef Lim
    since: 2025-09-01
  - keyword: chef lim
    since: 2025-10-01
";
        let err = parse_keywords(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("duplicate")));
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let yaml = r"
keywords:
  - keyword: '   '
    since: 2025-09-01
";
        assert!(matches!(
            parse_keywords(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let yaml = r"
keywords:
  - keyword: Chef Lim
    since: 2025-09-01
";
        let file = parse_keywords(yaml).unwrap();
        assert!(file.find("  chef lim ").is_some());
        assert!(file.find("someone else").is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_keywords(Path::new("/nonexistent/keywords.yaml")).unwrap_err();
        assert!(
            matches!(err, ConfigError::KeywordsFileIo { ref path, .. } if path.contains("keywords.yaml"))
        );
    }
}
