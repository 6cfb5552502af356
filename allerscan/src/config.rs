use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::recognize::RecognizerKind;

/// Configuration for allerscan.
///
/// # Configuration Locations
///
/// Sources are layered, later ones overriding earlier ones:
/// 1. Global `$CONFIG_DIR/allerscan/config.yaml`
/// 2. Local `.allerscan.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Where the term list is stored; a leading `~` is the home directory
/// terms_path: "~/.local/share/allerscan/terms.json"
///
/// # Recognizer to use (tesseract, sidecar)
/// recognizer: "tesseract"
///
/// # Tesseract language code
/// language: "eng"
///
/// # Disable colored output
/// no_color: false
///
/// # Lines shown above and below the current match in interactive mode
/// context_lines: 3
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
///
/// Command-line arguments take precedence over file values, see `merge_with_cli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Path of the JSON term list
    #[serde(default = "default_terms_path")]
    pub terms_path: PathBuf,

    /// Which recognizer turns images into text
    #[serde(default)]
    pub recognizer: RecognizerKind,

    /// Language passed to the recognizer, if any
    #[serde(default)]
    pub language: Option<String>,

    /// Whether to print without ANSI colors
    #[serde(default)]
    pub no_color: bool,

    /// Lines of context around the current match in interactive mode
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_terms_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("allerscan"))
        .unwrap_or_else(|| PathBuf::from(".allerscan"))
        .join("terms.json")
}

fn default_context_lines() -> usize {
    3
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Replaces a leading `~` with the home directory
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            terms_path: default_terms_path(),
            recognizer: RecognizerKind::default(),
            language: None,
            no_color: false,
            context_lines: default_context_lines(),
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub terms_path: Option<PathBuf>,
    pub recognizer: Option<RecognizerKind>,
    pub language: Option<String>,
    pub no_color: bool,
    pub context_lines: Option<usize>,
    pub log_level: Option<String>,
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("allerscan/config.yaml")),
            Some(PathBuf::from(".allerscan.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit config file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.terms_path = expand_home(&config.terms_path);
        Ok(config)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(terms_path) = cli.terms_path {
            self.terms_path = terms_path;
        }
        if let Some(recognizer) = cli.recognizer {
            self.recognizer = recognizer;
        }
        if cli.language.is_some() {
            self.language = cli.language;
        }
        if cli.no_color {
            self.no_color = true;
        }
        if let Some(context_lines) = cli.context_lines {
            self.context_lines = context_lines;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        config_path
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = write_config(
            &dir,
            r#"
            terms_path: "/tmp/allergens.json"
            recognizer: "sidecar"
            language: "deu"
            no_color: true
            context_lines: 5
            log_level: "debug"
        "#,
        );

        let config = ScanConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.terms_path, PathBuf::from("/tmp/allergens.json"));
        assert_eq!(config.recognizer, RecognizerKind::Sidecar);
        assert_eq!(config.language.as_deref(), Some("deu"));
        assert!(config.no_color);
        assert_eq!(config.context_lines, 5);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, "language: \"eng\"\n");

        let config = ScanConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.recognizer, RecognizerKind::Tesseract);
        assert!(!config.no_color);
        assert_eq!(config.context_lines, 3);
        assert_eq!(config.log_level, "warn");
        assert!(config.terms_path.ends_with("terms.json"));
    }

    #[test]
    fn test_terms_path_expands_home() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, "terms_path: \"~/allergens/terms.json\"\n");

        let config = ScanConfig::load_from(Some(&config_path)).unwrap();
        match dirs::home_dir() {
            Some(home) => assert_eq!(config.terms_path, home.join("allergens/terms.json")),
            None => assert_eq!(config.terms_path, PathBuf::from("~/allergens/terms.json")),
        }
        assert!(!config.terms_path.starts_with("~") || dirs::home_dir().is_none());

        assert_eq!(
            expand_home(Path::new("/srv/terms.json")),
            PathBuf::from("/srv/terms.json")
        );
        assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = ScanConfig {
            terms_path: PathBuf::from("file-terms.json"),
            recognizer: RecognizerKind::Tesseract,
            language: Some("eng".to_string()),
            no_color: false,
            context_lines: 2,
            log_level: "info".to_string(),
        };

        let merged = file_config.clone().merge_with_cli(CliOverrides {
            terms_path: Some(PathBuf::from("cli-terms.json")),
            recognizer: Some(RecognizerKind::Sidecar),
            no_color: true,
            ..CliOverrides::default()
        });
        assert_eq!(merged.terms_path, PathBuf::from("cli-terms.json")); // CLI value
        assert_eq!(merged.recognizer, RecognizerKind::Sidecar); // CLI value
        assert_eq!(merged.language.as_deref(), Some("eng")); // File value
        assert!(merged.no_color); // CLI value
        assert_eq!(merged.context_lines, 2); // File value
        assert_eq!(merged.log_level, "info"); // File value

        let untouched = file_config.clone().merge_with_cli(CliOverrides::default());
        assert_eq!(untouched, file_config);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = write_config(
            &dir,
            r#"
            recognizer: "magic"
            context_lines: "many"
        "#,
        );

        let result = ScanConfig::load_from(Some(&config_path));
        assert!(result.is_err(), "Expected error loading invalid config");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ScanConfig::load_from(Some(Path::new("nonexistent.yaml")));
        assert!(result.is_err());
    }
}
