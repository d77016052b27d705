use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default output file for PDF writes, relative to the working directory.
pub const DEFAULT_PDF_OUTPUT: &str = "modMeta.pdf";
/// Default output file for JPEG writes, relative to the working directory.
pub const DEFAULT_JPG_OUTPUT: &str = "modMeta.jpg";

/// Top-level configuration for meta-tool.
///
/// Controls where modified copies are written and a few per-format write
/// options. Every field has a default, so a partial (or missing) config file
/// is fine.
///
/// # Loading
///
/// ```rust,no_run
/// use meta_tool::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.pdf.stamp_mod_date = true;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where modified files are written.
    pub output: OutputConfig,
    /// PDF write options.
    pub pdf: PdfOptions,
    /// JPEG write options.
    pub jpeg: JpegOptions,
}

/// Output locations for modified copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pdf_path: PathBuf,
    pub jpg_path: PathBuf,
}

/// Options for PDF Info dictionary writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    /// If `true`, set `ModDate` to the current time on every write
    /// (unless the metadata string already supplies one).
    pub stamp_mod_date: bool,
}

/// Options for JPEG EXIF writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JpegOptions {
    /// If `true`, clearing also removes XMP (APP1) and IPTC (APP13) segments,
    /// not just the EXIF block.
    pub clear_xmp_iptc: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pdf_path: PathBuf::from(DEFAULT_PDF_OUTPUT),
            jpg_path: PathBuf::from(DEFAULT_JPG_OUTPUT),
        }
    }
}

impl Config {
    /// Resolve the config file path: same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::debug!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        log::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
