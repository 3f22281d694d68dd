use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Names and switches the code generator and output renderer work with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Reference through which every runtime support call is made
    pub support_ref: String,
    pub env_class_name: String,
    pub env_ref: String,
    pub outer_class_name: String,
    pub outer_ref: String,
    /// Spaces per indentation level when rendering
    pub indent_width: usize,
    /// Names provided by the host (always resolved through the environment reference)
    pub external_dependencies: Vec<String>,
    /// Wrap the translated statements in a compilable program
    pub scaffold: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            support_ref: "_".into(),
            env_class_name: "EnvironmentReferences".into(),
            env_ref: "_env".into(),
            outer_class_name: "GlobalReferences".into(),
            outer_ref: "_outer".into(),
            indent_width: 4,
            external_dependencies: vec!["wscript".into()],
            scaffold: true,
        }
    }
}

impl TranslatorConfig {
    /// Reads a TOML file; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Parse config {}", path.display()))
    }

    /// Loads from the CLI path if given, else from the default location.
    pub fn resolve(cli_path: &Option<PathBuf>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    // ~/.vbs2cs/config.toml (under the user profile on Windows)
    dirs_next::home_dir().map(|h| h.join(".vbs2cs").join("config.toml"))
}

pub fn resolve_config_path(cli_path: &Option<PathBuf>) -> Option<PathBuf> {
    if let Some(p) = cli_path {
        return Some(p.clone());
    }
    default_config_path()
}
