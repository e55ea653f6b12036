use reqbench_common::RequestTarget;
use serde::Deserialize;
use std::path::Path;

use crate::error::BenchError;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_REQUESTS_PER_WORKER: usize = 100;
pub const DEFAULT_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LANGUAGE: &str = "Rust";

/// How each worker obtains its connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientMode {
    /// One client per worker, reused for every request.
    #[default]
    Persistent,
    /// A fresh client, and so a fresh connection, for every request.
    PerRequest,
}

impl ClientMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "persistent" => Some(ClientMode::Persistent),
            "per-request" => Some(ClientMode::PerRequest),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            ClientMode::Persistent => "persistent",
            ClientMode::PerRequest => "per-request",
        }
    }
}

/// The two leading columns of the summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub language: String,
    pub library: String,
}

/// Everything one benchmark run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub workers: usize,
    pub requests_per_worker: usize,
    pub url: String,
    pub mode: ClientMode,
    pub label: Label,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let mode = ClientMode::default();
        Self {
            workers: DEFAULT_WORKERS,
            requests_per_worker: DEFAULT_REQUESTS_PER_WORKER,
            url: DEFAULT_URL.to_string(),
            mode,
            label: Label { language: DEFAULT_LANGUAGE.to_string(), library: mode.as_name().to_string() },
        }
    }
}

impl RunnerConfig {
    /// Build a config by applying `layers` in order over the defaults; later layers win.
    /// The library label follows the mode unless some layer names it explicitly.
    pub fn from_layers(layers: impl IntoIterator<Item = ConfigOverrides>) -> Self {
        let mut config = Self::default();
        let mut library = None;
        for layer in layers {
            if layer.library.is_some() {
                library = layer.library.clone();
            }
            layer.apply(&mut config);
        }
        config.label.library = library.unwrap_or_else(|| config.mode.as_name().to_string());
        config
    }

    /// Total number of requests the run issues.
    pub fn expected_samples(&self) -> usize {
        self.workers * self.requests_per_worker
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.workers == 0 {
            return Err(BenchError::InvalidConfig("workers must be at least 1".to_string()));
        }
        if self.requests_per_worker == 0 {
            return Err(BenchError::InvalidConfig("requests_per_worker must be at least 1".to_string()));
        }
        self.workers
            .checked_mul(self.requests_per_worker)
            .ok_or_else(|| BenchError::InvalidConfig("workers * requests_per_worker overflows".to_string()))?;
        RequestTarget::parse(&self.url).map_err(|e| BenchError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

/// A partial config, as read from a TOML file or assembled from CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub workers: Option<usize>,
    pub requests_per_worker: Option<usize>,
    pub url: Option<String>,
    pub mode: Option<ClientMode>,
    pub language: Option<String>,
    pub library: Option<String>,
}

impl ConfigOverrides {
    pub fn from_toml_str(content: &str) -> Result<Self, BenchError> {
        toml::from_str(content).map_err(|e| BenchError::InvalidConfig(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BenchError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Copy every field that is set onto `config`.
    pub fn apply(self, config: &mut RunnerConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(requests) = self.requests_per_worker {
            config.requests_per_worker = requests;
        }
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(language) = self.language {
            config.label.language = language;
        }
        if let Some(library) = self.library {
            config.label.library = library;
        }
    }
}
