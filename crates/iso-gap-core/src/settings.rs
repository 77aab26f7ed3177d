use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::report::OutputFormat;

/// Run settings layered from defaults, an optional config file and `ISO_GAP_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GapSettings {
    /// Control catalog file, resolved against the working directory when relative.
    pub controls: PathBuf,
    /// Directory receiving report files; reports go to stdout only when unset.
    pub output_dir: Option<PathBuf>,
    /// File name (without extension) used for written reports.
    pub report_stem: String,
    /// Report formats written to `output_dir`.
    pub formats: Vec<OutputFormat>,
}

impl Default for GapSettings {
    fn default() -> Self {
        Self {
            controls: PathBuf::from("iso_27001_controls.json"),
            output_dir: None,
            report_stem: "gap_report".to_string(),
            formats: vec![OutputFormat::Markdown, OutputFormat::Json],
        }
    }
}

impl GapSettings {
    const ENV_PREFIX: &'static str = "ISO_GAP";

    /// Load settings from an optional file (TOML, YAML or JSON) and the environment.
    ///
    /// * `ISO_GAP_CONTROLS`: catalog path.
    /// * `ISO_GAP_OUTPUT_DIR`: report directory.
    /// * `ISO_GAP_REPORT_STEM`: report file name stem.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings: Self = builder
            .add_source(Environment::with_prefix(Self::ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize())
            .with_context(|| match config_path {
                Some(path) => format!("failed to load settings from {}", path.display()),
                None => "failed to load settings from environment".to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            anyhow::bail!("at least one report format must be configured");
        }
        if self.report_stem.trim().is_empty() {
            anyhow::bail!("report stem must not be blank");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::fs::write;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn with_env_lock<F: FnOnce()>(func: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        env::remove_var("ISO_GAP_CONTROLS");
        env::remove_var("ISO_GAP_OUTPUT_DIR");
        env::remove_var("ISO_GAP_REPORT_STEM");
        func();
    }

    #[test]
    fn defaults_match_original_tool() {
        with_env_lock(|| {
            let settings = GapSettings::load(None).expect("defaults should load");
            assert_eq!(settings, GapSettings::default());
            assert_eq!(settings.controls, PathBuf::from("iso_27001_controls.json"));
            assert_eq!(
                settings.formats,
                vec![OutputFormat::Markdown, OutputFormat::Json]
            );
        });
    }

    #[test]
    fn default_catalog_path_is_relative_to_working_directory() {
        with_env_lock(|| {
            let settings = GapSettings::load(None).expect("defaults should load");
            assert!(settings.controls.is_relative());
            assert_ne!(
                settings.controls,
                PathBuf::from("catalogs/iso_27001_controls.json")
            );
            assert_eq!(settings.controls.parent(), Some(Path::new("")));
        });
    }

    #[test]
    fn reads_toml_config_file() {
        with_env_lock(|| {
            let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            write(
                file.path(),
                "controls = \"catalogs/annex_a.yaml\"\noutput_dir = \"out\"\nformats = [\"json\"]\n",
            )
            .unwrap();
            let settings = GapSettings::load(Some(file.path())).expect("toml should load");
            assert_eq!(settings.controls, PathBuf::from("catalogs/annex_a.yaml"));
            assert_eq!(settings.output_dir, Some(PathBuf::from("out")));
            assert_eq!(settings.formats, vec![OutputFormat::Json]);
            assert_eq!(settings.report_stem, "gap_report");
        });
    }

    #[test]
    fn environment_overrides_file() {
        with_env_lock(|| {
            let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
            write(file.path(), "controls: from-file.json\nreport_stem: q3\n").unwrap();
            env::set_var("ISO_GAP_CONTROLS", "from-env.json");
            let settings = GapSettings::load(Some(file.path())).expect("yaml should load");
            env::remove_var("ISO_GAP_CONTROLS");
            assert_eq!(settings.controls, PathBuf::from("from-env.json"));
            assert_eq!(settings.report_stem, "q3");
        });
    }

    #[test]
    fn rejects_empty_format_list() {
        with_env_lock(|| {
            let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            write(file.path(), "formats = []\n").unwrap();
            let err = GapSettings::load(Some(file.path())).expect_err("empty formats should fail");
            assert!(err.to_string().contains("at least one report format"));
        });
    }

    #[test]
    fn missing_config_file_is_an_error() {
        with_env_lock(|| {
            let temp = tempfile::tempdir().unwrap();
            let err = GapSettings::load(Some(&temp.path().join("absent.toml")))
                .expect_err("missing file should fail");
            assert!(err.to_string().contains("absent.toml"));
        });
    }
}
