//! Registration reconciliation.
//!
//! Converges the external registry on the descriptor document, one descriptor
//! at a time and strictly in document order. Each descriptor is an independent
//! remove-then-add saga: an existing entry of the same name is removed
//! best-effort, then the entry is re-added from the resolved descriptor. One
//! bad descriptor never aborts the batch; outcomes accumulate into an ordered
//! report.

use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::map_auth_flags;
use crate::config::ServerDescriptor;
use crate::registrar::{AddRequest, Registrar};
use crate::resolve::{ResolveContext, expand_template};

/// Outcome of reconciling a single descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Entry was (re-)added to the registry.
    Succeeded,
    /// Descriptor was not processed; never forces a non-zero exit by itself.
    Skipped { reason: String },
    /// Resolution or registration failed for this descriptor.
    Failed { reason: String },
}

/// Per-descriptor reconciliation report.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorReport {
    pub name: String,
    pub outcome: ReconcileOutcome,
    pub warnings: Vec<String>,
}

impl DescriptorReport {
    fn skipped(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            outcome: ReconcileOutcome::Skipped {
                reason: reason.into(),
            },
            warnings: Vec::new(),
        }
    }
}

/// Ordered outcomes for a whole reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub reports: Vec<DescriptorReport>,
}

impl RunReport {
    /// True when any descriptor outcome is `Failed`. Drives the exit code.
    pub fn has_failures(&self) -> bool {
        self.reports
            .iter()
            .any(|r| matches!(r.outcome, ReconcileOutcome::Failed { .. }))
    }

    /// (succeeded, skipped, failed) counts for the summary line.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.reports
            .iter()
            .fold((0, 0, 0), |(ok, skip, fail), r| match r.outcome {
                ReconcileOutcome::Succeeded => (ok + 1, skip, fail),
                ReconcileOutcome::Skipped { .. } => (ok, skip + 1, fail),
                ReconcileOutcome::Failed { .. } => (ok, skip, fail + 1),
            })
    }
}

/// Reconciles descriptors against an external registrar.
#[derive(Debug)]
pub struct Reconciler<'a, R: Registrar> {
    registrar: &'a R,
    ctx: ResolveContext,
}

impl<'a, R: Registrar> Reconciler<'a, R> {
    pub fn new(registrar: &'a R, ctx: ResolveContext) -> Self {
        Self { registrar, ctx }
    }

    /// Reconcile all descriptors in order.
    ///
    /// Sequential by design: the registrar is a single shared registry with
    /// no concurrency contract, so remove/add pairs must not interleave.
    pub fn reconcile(&self, descriptors: &[ServerDescriptor]) -> RunReport {
        let reports = descriptors
            .iter()
            .map(|d| self.reconcile_one(d))
            .collect();
        RunReport { reports }
    }

    /// Reconcile a single descriptor: validate, resolve, remove, add.
    pub fn reconcile_one(&self, descriptor: &ServerDescriptor) -> DescriptorReport {
        let display = descriptor.display_name();

        let Some(name) = non_empty(descriptor.name.as_deref()) else {
            return DescriptorReport::skipped(display, "descriptor is missing 'name'");
        };
        let Some(template) = non_empty(descriptor.url.as_deref()) else {
            return DescriptorReport::skipped(name, "descriptor is missing 'url'");
        };

        let url = match expand_template(template, &self.ctx) {
            Ok(url) => url,
            Err(e) => {
                return DescriptorReport {
                    name: name.to_string(),
                    outcome: ReconcileOutcome::Failed {
                        reason: format!("URL resolution failed: {}", e),
                    },
                    warnings: Vec::new(),
                };
            }
        };

        let mut auth = map_auth_flags(descriptor.auth.as_ref());
        let mut warnings = std::mem::take(&mut auth.warnings);

        // Best-effort replace: a remove failure is surfaced as a warning but
        // never blocks the add.
        match self.registrar.list_names() {
            Ok(names) => {
                if names.iter().any(|n| n == name) {
                    if let Err(e) = self.registrar.remove(name) {
                        warn!(name, error = %e, "failed to remove existing entry");
                        warnings.push(format!("failed to remove existing entry: {}", e));
                    }
                }
            }
            Err(e) => {
                // Listing failed; attempt the remove blindly so a stale entry
                // cannot survive, tolerating "not found" style failures.
                warnings.push(format!("could not list registry entries: {}", e));
                if let Err(e) = self.registrar.remove(name) {
                    debug!(name, error = %e, "blind remove failed; proceeding to add");
                }
            }
        }

        let request = AddRequest {
            name: name.to_string(),
            url,
            description: descriptor.description.clone(),
            auth_flags: auth.flags,
        };

        let outcome = match self.registrar.add(&request) {
            Ok(()) => ReconcileOutcome::Succeeded,
            Err(e) => ReconcileOutcome::Failed {
                reason: format!("registration failed: {}", e),
            },
        };

        DescriptorReport {
            name: name.to_string(),
            outcome,
            warnings,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
