//! Roster Core Library
//!
//! Provides the domain logic for reconciling a declarative registry of MCP
//! server descriptors against a host CLI registrar and probing the described
//! endpoints for reachability.

pub mod auth;
pub mod config;
pub mod probe;
pub mod reconcile;
pub mod registrar;
pub mod resolve;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{AuthSpec, COMMON_BUCKET, DescriptorDocument, ServerDescriptor};

    // Resolution
    pub use crate::resolve::{ResolutionError, ResolveContext, expand_template};

    // Auth mapping
    pub use crate::auth::{AuthFlags, map_auth_flags};

    // Registrar
    pub use crate::registrar::{AddRequest, HostCliRegistrar, Registrar, RegistrarError};

    // Reconciliation
    pub use crate::reconcile::{DescriptorReport, ReconcileOutcome, Reconciler, RunReport};

    // Probing
    pub use crate::probe::{HealthReport, ProbeOutcome, ProbeReport, Prober};
}
