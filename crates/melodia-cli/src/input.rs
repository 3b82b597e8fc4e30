//! Configuration loading for CLI commands.
//!
//! Configs come from a JSON file (or the defaults when no file is given) and
//! are then patched with command-line overrides. Register bounds on the
//! command line accept either MIDI numbers or note names.

use melodia_core::note::parse_pitch;
use melodia_core::GenerationConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recognized config file extensions.
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// Errors that can occur while loading a config.
#[derive(Debug, Error)]
pub enum InputError {
    /// File could not be read.
    #[error("failed to read file '{}': {}", .path.display(), .source)]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unknown file extension.
    #[error("unknown file extension {} (expected .json)", describe_extension(.extension))]
    UnknownExtension { extension: Option<String> },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse { message: String },

    /// A pitch override is neither a MIDI number nor a note name.
    #[error("invalid pitch '{value}' for --{flag} (expected 0-127 or a note name like G3)")]
    InvalidPitch { flag: &'static str, value: String },
}

fn describe_extension(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!("'.{}'", ext),
        None => "(none)".to_string(),
    }
}

impl InputError {
    /// Stable error code for machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            InputError::FileRead { .. } => "CLI_001",
            InputError::UnknownExtension { .. } => "CLI_002",
            InputError::JsonParse { .. } => "CLI_003",
            InputError::InvalidPitch { .. } => "CLI_004",
        }
    }
}

/// Command-line overrides applied on top of the loaded config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u32>,
    pub length: Option<usize>,
    pub register_min: Option<String>,
    pub register_max: Option<String>,
}

impl Overrides {
    /// Patches `config` in place.
    pub fn apply(&self, config: &mut GenerationConfig) -> Result<(), InputError> {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(length) = self.length {
            config.length = length;
        }
        if let Some(text) = &self.register_min {
            config.register_min = pitch_arg("register-min", text)?;
        }
        if let Some(text) = &self.register_max {
            config.register_max = pitch_arg("register-max", text)?;
        }
        Ok(())
    }
}

fn pitch_arg(flag: &'static str, text: &str) -> Result<i32, InputError> {
    parse_pitch(text).ok_or_else(|| InputError::InvalidPitch {
        flag,
        value: text.to_string(),
    })
}

/// Result of loading a config.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// The config with overrides applied.
    pub config: GenerationConfig,
    /// Source file, if any.
    pub source: Option<PathBuf>,
    /// BLAKE3 hash of the source file content (hex string).
    pub source_hash: Option<String>,
}

/// Load a config from a JSON file.
///
/// # Arguments
/// * `path` - Path to the config file (.json)
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use melodia_cli::input::load_config;
///
/// let loaded = load_config(Path::new("line.json")).unwrap();
/// println!("seed {}", loaded.config.seed);
/// ```
pub fn load_config(path: &Path) -> Result<LoadResult, InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());
    match extension.as_deref() {
        Some(ext) if JSON_EXTENSIONS.contains(&ext) => {}
        _ => return Err(InputError::UnknownExtension { extension }),
    }

    let content = std::fs::read_to_string(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = GenerationConfig::from_json(&content).map_err(|e| InputError::JsonParse {
        message: e.to_string(),
    })?;
    log::debug!("loaded config from {}", path.display());

    Ok(LoadResult {
        config,
        source: Some(path.to_path_buf()),
        source_hash: Some(blake3::hash(content.as_bytes()).to_hex().to_string()),
    })
}

/// Loads the config named on the command line (or the defaults) and applies
/// the overrides.
pub fn resolve_config(
    config_path: Option<&str>,
    overrides: &Overrides,
) -> Result<LoadResult, InputError> {
    let mut loaded = match config_path {
        Some(path) => load_config(Path::new(path))?,
        None => LoadResult {
            config: GenerationConfig::default(),
            source: None,
            source_hash: None,
        },
    };
    overrides.apply(&mut loaded.config)?;
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "line.json", r#"{"seed": 5, "length": 4}"#);
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.config.seed, 5);
        assert_eq!(loaded.config.length, 4);
        assert_eq!(loaded.source_hash.map(|h| h.len()), Some(64));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write_config(&dir, "line.yaml", "seed: 1");
        assert_eq!(load_config(&yaml).unwrap_err().code(), "CLI_002");

        let missing = dir.path().join("missing.json");
        assert_eq!(load_config(&missing).unwrap_err().code(), "CLI_001");

        let bad = write_config(&dir, "bad.json", r#"{"seed": "x"}"#);
        assert_eq!(load_config(&bad).unwrap_err().code(), "CLI_003");
    }

    #[test]
    fn test_overrides_accept_note_names() {
        let overrides = Overrides {
            seed: Some(3),
            length: None,
            register_min: Some("G3".to_string()),
            register_max: Some("76".to_string()),
        };
        let loaded = resolve_config(None, &overrides).unwrap();
        assert_eq!(loaded.config.seed, 3);
        assert_eq!(loaded.config.length, 8);
        assert_eq!(loaded.config.register_min, 55);
        assert_eq!(loaded.config.register_max, 76);
        assert!(loaded.source.is_none());
    }

    #[test]
    fn test_bad_pitch_override() {
        let overrides = Overrides {
            register_min: Some("H9".to_string()),
            ..Overrides::default()
        };
        let err = resolve_config(None, &overrides).unwrap_err();
        assert_eq!(err.code(), "CLI_004");
        assert!(err.to_string().contains("--register-min"));
    }
}
