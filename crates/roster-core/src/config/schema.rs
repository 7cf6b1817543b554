//! Descriptor document data model.
//!
//! The descriptor document is a JSON object mapping environment names (plus
//! the literal `common` bucket) to ordered lists of server descriptors.
//! Required fields are modeled as `Option` so that a single malformed
//! descriptor surfaces as a per-descriptor skip during reconciliation rather
//! than failing the whole document parse.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Bucket key whose descriptors apply to every environment.
pub const COMMON_BUCKET: &str = "common";

/// One named MCP server entry in the descriptor document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Identity key for reconciliation. Required; validated at reconcile time.
    #[serde(default)]
    pub name: Option<String>,
    /// Spec URL template. May embed `${VAR}` references and use the
    /// `file://`, `http://` or `https://` schemes. Required.
    #[serde(default)]
    pub url: Option<String>,
    /// Human-readable description passed through to the registrar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declarative authentication intent, mapped onto registrar flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSpec>,
}

impl ServerDescriptor {
    /// Name used in reports when the descriptor has no usable name.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "<unnamed>",
        }
    }
}

/// Declarative authentication block on a descriptor.
///
/// `credential_source` is kept as a free-form string: the mapper only
/// special-cases the known values and passes everything else through to the
/// registrar unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSpec {
    /// Authentication scheme, e.g. `api_key`. Required when `auth` is present.
    #[serde(rename = "type", default)]
    pub auth_type: Option<String>,
    /// Where the credential lives: `credential_file`, `env_var`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_source: Option<String>,
    /// Key name inside the credential file (for `credential_file` sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name_in_file: Option<String>,
    /// Environment variable holding the API key (for `env_var` sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env_var: Option<String>,
    /// Ordered scope list, space-joined when emitted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

/// The full descriptor document: environment name -> descriptor list.
///
/// Any key may be absent; an absent bucket is equivalent to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorDocument {
    #[serde(flatten)]
    pub buckets: HashMap<String, Vec<ServerDescriptor>>,
}

impl DescriptorDocument {
    /// Descriptors in a named bucket, empty when the key is absent.
    pub fn bucket(&self, name: &str) -> &[ServerDescriptor] {
        self.buckets.get(name).map_or(&[], Vec::as_slice)
    }

    /// Effective descriptor set for an environment: `common` followed by the
    /// environment bucket, order preserved. Duplicate names are allowed;
    /// reconciliation is remove-then-add, so the last entry wins.
    pub fn effective_descriptors(&self, env: &str) -> Vec<ServerDescriptor> {
        let mut descriptors = self.bucket(COMMON_BUCKET).to_vec();
        if env != COMMON_BUCKET {
            descriptors.extend_from_slice(self.bucket(env));
        }
        descriptors
    }
}
