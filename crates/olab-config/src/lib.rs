//! Service configuration: lens catalog, bridge secret, bind address.
//!
//! Loaded once at boot from a YAML file. The raw file bytes are hashed
//! (SHA-256) and the hex fingerprint is logged by the daemon so an operator
//! can tell exactly which catalog a running instance priced orders with.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Environment variable naming the config file path.
pub const ENV_CONFIG_PATH: &str = "OLAB_CONFIG";

/// Environment variable overriding the bind address.
pub const ENV_BIND_ADDR: &str = "OLAB_BIND_ADDR";

fn default_discount_pct() -> u32 {
    5
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceConfig {
    /// Listen address, e.g. "127.0.0.1:8870". Env `OLAB_BIND_ADDR` wins.
    #[serde(default)]
    pub bind_addr: Option<String>,

    /// Shared secret expected in `x-bridge-secret` on bridge routes.
    pub bridge_secret: String,

    /// Discount percent used when an order has no resolved owning party.
    #[serde(default = "default_discount_pct")]
    pub default_discount_pct: u32,

    /// Lens characteristic → unit price in minor currency units.
    pub catalog: BTreeMap<String, i64>,

    /// Optional ERP callback URL for the best-effort outbound mirror.
    #[serde(default)]
    pub mirror_url: Option<String>,
}

impl ServiceConfig {
    fn validate(&self) -> Result<()> {
        if self.bridge_secret.trim().is_empty() {
            bail!("bridge_secret must not be empty");
        }
        if self.catalog.is_empty() {
            bail!("catalog must contain at least one characteristic");
        }
        if let Some((name, price)) = self.catalog.iter().find(|(_, p)| **p <= 0) {
            bail!("catalog price for '{name}' must be positive, got {price}");
        }
        if self.default_discount_pct > 100 {
            bail!(
                "default_discount_pct out of range: {}",
                self.default_discount_pct
            );
        }
        Ok(())
    }
}

/// A parsed config plus the SHA-256 hex fingerprint of the file it came from.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    pub fingerprint: String,
}

/// Load and validate the service config from `path`.
pub fn load(path: &Path) -> Result<LoadedConfig> {
    let raw = fs::read(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&raw);
    let fingerprint = hex::encode(hasher.finalize());

    let config: ServiceConfig = serde_yaml::from_slice(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config.validate()?;

    Ok(LoadedConfig {
        config,
        fingerprint,
    })
}

/// Config path from `OLAB_CONFIG`, falling back to `optilab.yaml` in the
/// working directory.
pub fn path_from_env() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("optilab.yaml"))
}
