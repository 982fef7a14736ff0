use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::Result;

const ENV_PREFIX: &str = "CPOP";
const ENV_SEPARATOR: &str = "__";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Cluster connection settings.
    pub cluster: ClusterSettings,

    /// Claim link settings.
    pub claim: ClaimSettings,

    /// Settings of the in-memory ledger.
    pub ledger: LedgerSettings,

    /// Identifier generation settings.
    pub ids: IdSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusterSettings {
    pub endpoint: String,
    pub commitment: String,

    /// Upper bound on the mint confirmation wait. Minting proceeds once it
    /// elapses.
    pub confirmation_timeout_ms: u64,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CLUSTER_ENDPOINT.to_owned(),
            commitment: DEFAULT_COMMITMENT.to_owned(),
            confirmation_timeout_ms: DEFAULT_CONFIRMATION_TIMEOUT_MS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClaimSettings {
    pub base_url: String,
    pub include_checksum: bool,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CLAIM_BASE_URL.to_owned(),
            include_checksum: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerSettings {
    pub mint_latency_ms: u64,
    pub claim_latency_ms: u64,
    pub fetch_latency_ms: u64,
    pub seed_sample_tokens: bool,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            mint_latency_ms: DEFAULT_MINT_LATENCY_MS,
            claim_latency_ms: DEFAULT_CLAIM_LATENCY_MS,
            fetch_latency_ms: DEFAULT_FETCH_LATENCY_MS,
            seed_sample_tokens: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdSettings {
    pub length: usize,
}

impl Default for IdSettings {
    fn default() -> Self {
        Self {
            length: DEFAULT_ID_LEN,
        }
    }
}

impl Settings {
    /// Builds settings from defaults, then the optional TOML file at `path`,
    /// then `CPOP_*` environment variables (`CPOP_CLAIM__BASE_URL`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Defaults with every simulated delay removed.
    pub fn instant() -> Self {
        let mut settings = Self::default();
        settings.ledger.mint_latency_ms = 0;
        settings.ledger.claim_latency_ms = 0;
        settings.ledger.fetch_latency_ms = 0;
        settings
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.cluster.confirmation_timeout_ms)
    }
}

impl LedgerSettings {
    pub fn mint_latency(&self) -> Duration {
        Duration::from_millis(self.mint_latency_ms)
    }

    pub fn claim_latency(&self) -> Duration {
        Duration::from_millis(self.claim_latency_ms)
    }

    pub fn fetch_latency(&self) -> Duration {
        Duration::from_millis(self.fetch_latency_ms)
    }
}
