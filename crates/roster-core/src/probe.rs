//! Endpoint reachability probing.
//!
//! Independent of reconciliation: for each descriptor a base endpoint is
//! derived from the resolved spec URL and hit with a single bounded-timeout
//! GET. Reachability means "any HTTP-layer response arrived in time" -- the
//! application status code is irrelevant, only connection or transport
//! failure counts against the endpoint.

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ServerDescriptor;
use crate::resolve::{ResolveContext, expand_template};

/// Conventional base endpoint for locally served file-based specs.
///
/// Best-effort heuristic: file-based specs usually belong to a server running
/// on the developer's machine, and this is where such servers conventionally
/// listen. A `servers[0].url` declaration inside the spec overrides it.
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:3000";

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a probe for one descriptor should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointTarget {
    /// Probe this base endpoint.
    Http(String),
    /// Scheme is not probeable; skip with a warning.
    Unsupported { scheme: String },
}

/// Outcome of probing a single descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Reachable { endpoint: String },
    Unreachable { endpoint: String, reason: String },
    /// Not probed; never forces a non-zero exit.
    Skipped { reason: String },
}

/// Per-descriptor probe report.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub name: String,
    pub outcome: ProbeOutcome,
    pub warnings: Vec<String>,
}

impl ProbeReport {
    fn skipped(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            outcome: ProbeOutcome::Skipped {
                reason: reason.into(),
            },
            warnings: Vec::new(),
        }
    }
}

/// Ordered outcomes for a whole health check run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub reports: Vec<ProbeReport>,
}

impl HealthReport {
    /// True when any probed descriptor was unreachable. Drives the exit code.
    pub fn has_failures(&self) -> bool {
        self.reports
            .iter()
            .any(|r| matches!(r.outcome, ProbeOutcome::Unreachable { .. }))
    }

    /// (reachable, skipped, unreachable) counts for the summary line.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.reports
            .iter()
            .fold((0, 0, 0), |(ok, skip, fail), r| match r.outcome {
                ProbeOutcome::Reachable { .. } => (ok + 1, skip, fail),
                ProbeOutcome::Skipped { .. } => (ok, skip + 1, fail),
                ProbeOutcome::Unreachable { .. } => (ok, skip, fail + 1),
            })
    }
}

/// Derive the base reachability endpoint for a resolved spec URL.
///
/// - `file://` specs: the spec content's declared `servers[0].url` when one
///   can be extracted, otherwise [`DEFAULT_LOCAL_ENDPOINT`]
/// - `http://` / `https://` specs: scheme + authority only, path and query
///   discarded
/// - anything else: [`EndpointTarget::Unsupported`]
pub fn derive_base_endpoint(resolved_url: &str) -> anyhow::Result<EndpointTarget> {
    let url = Url::parse(resolved_url)
        .with_context(|| format!("Invalid spec URL: {}", resolved_url))?;

    match url.scheme() {
        "file" => {
            let endpoint = spec_declared_server_url(&url).unwrap_or_else(|| {
                debug!(url = resolved_url, "no declared server URL; using local default");
                DEFAULT_LOCAL_ENDPOINT.to_string()
            });
            Ok(EndpointTarget::Http(endpoint))
        }
        "http" | "https" => {
            let host = url
                .host_str()
                .with_context(|| format!("Spec URL has no host: {}", resolved_url))?;
            let endpoint = match url.port() {
                Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                None => format!("{}://{}", url.scheme(), host),
            };
            Ok(EndpointTarget::Http(endpoint))
        }
        other => Ok(EndpointTarget::Unsupported {
            scheme: other.to_string(),
        }),
    }
}

/// Try to read `servers[0].url` from a local spec file.
///
/// The spec may be YAML or JSON; YAML parsing accepts both. Any read or parse
/// problem falls through to `None` so the caller can apply the convention.
fn spec_declared_server_url(url: &Url) -> Option<String> {
    let path = url.to_file_path().ok()?;
    let content = std::fs::read_to_string(&path)
        .map_err(|e| {
            debug!(path = %path.display(), error = %e, "could not read spec file");
            e
        })
        .ok()?;

    let value: serde_yaml::Value = serde_yaml::from_str(&content).ok()?;
    value
        .get("servers")?
        .get(0)?
        .get("url")?
        .as_str()
        .map(str::to_string)
}

/// Probes descriptor endpoints for reachability.
#[derive(Debug)]
pub struct Prober {
    client: reqwest::Client,
    ctx: ResolveContext,
}

impl Prober {
    pub fn new(ctx: ResolveContext, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, ctx })
    }

    pub fn with_defaults(ctx: ResolveContext) -> anyhow::Result<Self> {
        Self::new(ctx, DEFAULT_PROBE_TIMEOUT)
    }

    /// Probe all descriptors in document order.
    pub async fn probe_all(&self, descriptors: &[ServerDescriptor]) -> HealthReport {
        let mut reports = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            reports.push(self.probe_one(descriptor).await);
        }
        HealthReport { reports }
    }

    /// Probe a single descriptor.
    pub async fn probe_one(&self, descriptor: &ServerDescriptor) -> ProbeReport {
        let display = descriptor.display_name();

        let Some(name) = non_empty(descriptor.name.as_deref()) else {
            return ProbeReport::skipped(display, "descriptor is missing 'name'");
        };
        let Some(template) = non_empty(descriptor.url.as_deref()) else {
            return ProbeReport::skipped(name, "descriptor is missing 'url'");
        };

        let resolved = match expand_template(template, &self.ctx) {
            Ok(url) => url,
            Err(e) => {
                return ProbeReport {
                    name: name.to_string(),
                    outcome: ProbeOutcome::Unreachable {
                        endpoint: template.to_string(),
                        reason: format!("URL resolution failed: {}", e),
                    },
                    warnings: Vec::new(),
                };
            }
        };

        let endpoint = match derive_base_endpoint(&resolved) {
            Ok(EndpointTarget::Http(endpoint)) => endpoint,
            Ok(EndpointTarget::Unsupported { scheme }) => {
                warn!(name, scheme, "unsupported scheme; skipping probe");
                return ProbeReport::skipped(
                    name,
                    format!("unsupported scheme '{}'", scheme),
                );
            }
            Err(e) => {
                return ProbeReport {
                    name: name.to_string(),
                    outcome: ProbeOutcome::Unreachable {
                        endpoint: resolved,
                        reason: format!("{:#}", e),
                    },
                    warnings: Vec::new(),
                };
            }
        };

        let outcome = match self.client.get(&endpoint).send().await {
            // Any HTTP-layer response counts, including 4xx/5xx.
            Ok(_) => ProbeOutcome::Reachable { endpoint },
            Err(e) => ProbeOutcome::Unreachable {
                endpoint,
                reason: e.to_string(),
            },
        };

        ProbeReport {
            name: name.to_string(),
            outcome,
            warnings: Vec::new(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
