//! Shared runtime state for olab-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The order store and
//! party directory carry their own interior locking, so `AppState` itself is
//! plain data behind the `Arc`.

use olab_config::ServiceConfig;
use olab_pricing::Catalog;
use olab_store::{MemoryStore, PartyDirectory};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in the health response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// MirrorTarget
// ---------------------------------------------------------------------------

/// Outbound ERP mirror, present only when a callback URL is configured.
#[derive(Clone, Debug)]
pub struct MirrorTarget {
    pub client: reqwest::Client,
    pub url: String,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared handle for all handlers.
pub struct AppState {
    pub build: BuildInfo,
    pub store: MemoryStore,
    pub parties: PartyDirectory,
    pub catalog: Catalog,
    pub default_discount_pct: u32,
    pub bridge_secret: String,
    pub mirror: Option<MirrorTarget>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let mirror = config.mirror_url.map(|url| MirrorTarget {
            client: reqwest::Client::new(),
            url,
        });
        Self {
            build: BuildInfo {
                service: "olab-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            store: MemoryStore::new(),
            parties: PartyDirectory::new(),
            catalog: Catalog::new(config.catalog),
            default_discount_pct: config.default_discount_pct,
            bridge_secret: config.bridge_secret,
            mirror,
        }
    }
}
