use std::path::{Path, PathBuf};

use serde::Deserialize;

use execvnode::release::VnodeOrder;

pub const DEFAULT_STATE_FILE: &str = "rampdown-state.json";
pub const DEFAULT_ACCOUNTING_LOG: &str = "accounting.log";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PruneConfig {
    /// Which healthy vnodes of a chunk are kept first when pruning.
    #[serde(default)]
    pub vnode_order: VnodeOrder,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Hosts of Cray X-series systems, their vnodes cannot be released.
    #[serde(default)]
    pub cray_hosts: Vec<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub state_file: Option<PathBuf>,
    pub accounting_log: Option<PathBuf>,
    #[serde(default)]
    pub prune: PruneConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
}

impl Config {
    pub fn parse(content: &str) -> crate::Result<Config> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> crate::Result<Config> {
        log::debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
    }

    pub fn accounting_log(&self) -> PathBuf {
        self.accounting_log
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ACCOUNTING_LOG))
    }
}
