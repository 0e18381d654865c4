//! Rule Set Loader
//!
//! Loads rule sets from:
//! - In-memory JSON strings
//! - JSON files
//! - Directories of `*.json` files, merged in file-name order

use std::fs;
use std::path::{Path, PathBuf};

use crate::context::Registry;
use crate::error::{ConfigError, Result};

use super::manifest::RuleSetManifest;
use super::validator::RuleSetValidator;

/// Loader for rule set configuration
#[derive(Debug, Clone)]
pub struct RuleSetLoader {
    /// Whether to run the validator on load
    validate_on_load: bool,

    validator: RuleSetValidator,
}

impl RuleSetLoader {
    pub fn new() -> Self {
        Self {
            validate_on_load: true,
            validator: RuleSetValidator::new(),
        }
    }

    /// Disable validation on load
    ///
    /// The format version is still checked, and `Registry::build` still
    /// rejects anything that cannot be routed.
    pub fn skip_validation(mut self) -> Self {
        self.validate_on_load = false;
        self
    }

    /// Load a rule set from a JSON string
    pub fn load_from_json(&self, json: &str) -> Result<RuleSetManifest> {
        let manifest: RuleSetManifest =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidRuleSet {
                reason: e.to_string(),
            })?;

        self.load_from_manifest(manifest)
    }

    /// Load a rule set from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<RuleSetManifest> {
        let path = path.as_ref();
        let manifest = read_manifest(path)?;

        tracing::debug!(path = %path.display(), rules = manifest.rules.len(), "read rule set");
        self.load_from_manifest(manifest)
    }

    /// Load every `*.json` file in a directory as one rule set
    ///
    /// Files are read in file-name order and their rules concatenated, so
    /// the file name decides the presentation tie-break between files. The
    /// merged set is named after the directory.
    pub fn load_from_directory<P: AsRef<Path>>(&self, path: P) -> Result<RuleSetManifest> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(ConfigError::LoadError {
                path: path.display().to_string(),
                reason: "Not a directory".to_string(),
            });
        }

        let files = json_files(path)?;
        if files.is_empty() {
            return Err(ConfigError::LoadError {
                path: path.display().to_string(),
                reason: "No *.json rule files found".to_string(),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mut merged = RuleSetManifest::new(name);

        for file in &files {
            let manifest = read_manifest(file)?;
            check_version(&manifest)?;
            tracing::debug!(path = %file.display(), rules = manifest.rules.len(), "read rule set");
            merged.rules.extend(manifest.rules);
        }

        self.load_from_manifest(merged)
    }

    /// Check and validate an already-parsed manifest
    pub fn load_from_manifest(&self, manifest: RuleSetManifest) -> Result<RuleSetManifest> {
        check_version(&manifest)?;

        if self.validate_on_load {
            let result = self.validator.validate(&manifest);

            for warning in &result.warnings {
                tracing::warn!(ruleset = %manifest.name, code = %warning.code, "{}", warning);
            }

            if !result.is_valid {
                return Err(ConfigError::InvalidRuleSet {
                    reason: result
                        .errors
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("; "),
                });
            }
        }

        Ok(manifest)
    }

    /// Load a rule set from a JSON string and build its registry
    pub fn load_registry_from_json(&self, json: &str) -> Result<Registry> {
        Registry::from_manifest(self.load_from_json(json)?)
    }

    /// Load a rule set file and build its registry
    pub fn load_registry_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Registry> {
        Registry::from_manifest(self.load_from_file(path)?)
    }

    /// Load a rule set directory and build its registry
    pub fn load_registry_from_directory<P: AsRef<Path>>(&self, path: P) -> Result<Registry> {
        Registry::from_manifest(self.load_from_directory(path)?)
    }
}

impl Default for RuleSetLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn check_version(manifest: &RuleSetManifest) -> Result<()> {
    if manifest.ruleset_version != super::VERSION {
        return Err(ConfigError::UnsupportedVersion {
            expected: super::VERSION.to_string(),
            actual: manifest.ruleset_version.clone(),
        });
    }
    Ok(())
}

fn read_manifest(path: &Path) -> Result<RuleSetManifest> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::InvalidRuleSet {
        reason: format!("{}: {}", path.display(), e),
    })
}

/// `*.json` files directly inside `dir`, sorted by file name
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let load_error = |e: std::io::Error| ConfigError::LoadError {
        path: dir.display().to_string(),
        reason: e.to_string(),
    };

    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(load_error)? {
        let path = entry.map_err(load_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
