//! Engine defaults stored in an optional TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::budget::{DEFAULT_TIMEOUT, TimeBudget};
use crate::io::console::EchoFlags;
use crate::io::supervisor::DEFAULT_CANCEL_GRACE;

/// Defaults applied to every test case before its own configuration.
///
/// Missing fields fall back to the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-test wall-clock budget in seconds. `0` runs tests inline with no limit.
    pub default_timeout_secs: u64,

    /// Grace period for a cancelled worker before it is detached.
    pub cancel_grace_ms: u64,

    pub echo: EchoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EchoConfig {
    pub print_input: bool,
    pub capture_input: bool,
    pub print_out: bool,
    pub print_err: bool,
}

impl Default for EchoConfig {
    fn default() -> Self {
        let flags = EchoFlags::default();
        Self {
            print_input: flags.print_input,
            capture_input: flags.capture_input,
            print_out: flags.print_out,
            print_err: flags.print_err,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            cancel_grace_ms: DEFAULT_CANCEL_GRACE.as_millis() as u64,
            echo: EchoConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cancel_grace_ms == 0 {
            return Err(anyhow!("cancel_grace_ms must be > 0"));
        }
        Ok(())
    }

    pub fn budget(&self) -> TimeBudget {
        TimeBudget::from_duration(Duration::from_secs(self.default_timeout_secs))
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    pub fn flags(&self) -> EchoFlags {
        EchoFlags {
            print_input: self.echo.print_input,
            capture_input: self.echo.capture_input,
            print_out: self.echo.print_out,
            print_err: self.echo.print_err,
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
