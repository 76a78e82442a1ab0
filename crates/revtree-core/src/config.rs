use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;

/// Environment variable that overrides [`MergeConfig::conflict_policy`].
pub const CONFLICT_POLICY_ENV: &str = "REVTREE_CONFLICT_POLICY";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevtreeConfig {
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Which side wins when both sides of a three-way merge changed a field to
/// different values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The side with the greater revision hash wins.
    #[default]
    #[serde(alias = "greater")]
    PreferGreaterRevision,
    /// The side with the lesser revision hash wins.
    #[serde(alias = "lesser")]
    PreferLesserRevision,
}

impl ConflictPolicy {
    /// Parse the short names accepted on the command line and in the
    /// environment (`greater`, `lesser`, or the full kebab-case names).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "greater" | "prefer-greater-revision" => Some(Self::PreferGreaterRevision),
            "lesser" | "prefer-lesser-revision" => Some(Self::PreferLesserRevision),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreferGreaterRevision => f.write_str("prefer-greater-revision"),
            Self::PreferLesserRevision => f.write_str("prefer-lesser-revision"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    /// How deeply criss-cross bases may themselves need recursive merging
    /// before the merge is abandoned.
    #[serde(default = "default_max_virtual_base_depth")]
    pub max_virtual_base_depth: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            max_virtual_base_depth: default_max_virtual_base_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Attempts at a compare-and-swap before a write reports a conflict.
    #[serde(default = "default_cas_retries")]
    pub cas_retries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cas_retries: default_cas_retries(),
        }
    }
}

/// Parse a config from TOML text. Missing sections and fields take defaults.
///
/// # Errors
///
/// Returns an error if the text is not valid TOML for [`RevtreeConfig`].
pub fn from_toml_str(content: &str) -> Result<RevtreeConfig> {
    toml::from_str::<RevtreeConfig>(content).context("Failed to parse revtree config")
}

/// Load a config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<RevtreeConfig> {
    if !path.exists() {
        return Ok(RevtreeConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<RevtreeConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load an optional config file and apply environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or the environment holds an
/// unrecognised conflict policy.
pub fn resolve(path: Option<&Path>) -> Result<RevtreeConfig> {
    let mut config = match path {
        Some(path) => load(path)?,
        None => RevtreeConfig::default(),
    };
    apply_env_policy(&mut config, env::var(CONFLICT_POLICY_ENV).ok())?;
    Ok(config)
}

fn apply_env_policy(config: &mut RevtreeConfig, env_policy: Option<String>) -> Result<()> {
    if let Some(raw) = env_policy {
        let policy = ConflictPolicy::parse(&raw)
            .with_context(|| format!("{CONFLICT_POLICY_ENV}={raw:?} is not a conflict policy"))?;
        config.merge.conflict_policy = policy;
    }
    Ok(())
}

const fn default_max_virtual_base_depth() -> usize {
    16
}

const fn default_cas_retries() -> usize {
    8
}
