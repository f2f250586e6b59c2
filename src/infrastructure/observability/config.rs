//! Observability configuration

use serde::Deserialize;

/// Tracing export and Prometheus settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// OTLP span export for lookup requests
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
    /// `service.name` resource attribute. Falls back to the name the lookup
    /// endpoint reports in heartbeats, so spans and heartbeats agree.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Fraction of lookups exported, clamped to `0.0..=1.0`
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

impl TracingConfig {
    pub fn service_name_or<'a>(&'a self, heartbeat_name: &'a str) -> &'a str {
        self.service_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(heartbeat_name)
    }

    pub fn sampling_ratio(&self) -> f64 {
        if self.sampling_ratio.is_nan() {
            return 1.0;
        }
        self.sampling_ratio.clamp(0.0, 1.0)
    }
}

/// Prometheus scrape endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: default_otlp_endpoint(),
            service_name: None,
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}
