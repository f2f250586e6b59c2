//! Lookup command - one-shot lookup through the configured cache and store

use clap::Args;
use serde::Serialize;
use serde_json::Value;

use crate::config::{AppConfig, CacheBackend, StoreBackend};
use crate::domain::{LookupOutcome, Record};
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Key to look up
    pub key: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Override the configured cache backend (redis, memory)
    #[arg(long)]
    pub cache_backend: Option<CacheBackend>,

    /// Override the configured store backend (cosmos, postgres, memory)
    #[arg(long)]
    pub store_backend: Option<StoreBackend>,
}

impl LookupArgs {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(backend) = self.cache_backend {
            config.cache.backend = backend;
        }
        if let Some(backend) = self.store_backend {
            config.store.backend = backend;
        }
    }
}

/// Printed result of a lookup
#[derive(Debug, Serialize)]
struct LookupReport {
    status: u16,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl LookupReport {
    fn from_outcome(outcome: &LookupOutcome) -> anyhow::Result<Self> {
        let (record, message) = match outcome {
            LookupOutcome::Found { payload, .. } => {
                (Some(serde_json::from_slice::<Value>(payload)?), None)
            }
            other => (None, Some(other.message())),
        };

        Ok(Self {
            status: outcome.status_code(),
            outcome: outcome.label(),
            origin: outcome.origin().map(|o| o.as_str()),
            record,
            message,
        })
    }
}

/// Run a single lookup and print the outcome to stdout
pub async fn run(args: LookupArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().unwrap_or_default();
    args.apply_overrides(&mut config);
    logging::init_logging(&config.logging);

    let state = crate::create_app_state_with_config(&config).await?;
    let outcome = state.lookup_service.lookup(Some(&args.key)).await;
    state.shutdown().await;

    let report = LookupReport::from_outcome(&outcome)?;
    let output = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    println!("{}", output);

    Ok(())
}
