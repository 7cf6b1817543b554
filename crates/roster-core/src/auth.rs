//! Auth block to registrar flag mapping.
//!
//! Converts a descriptor's declarative auth block into the ordered flag
//! vocabulary the external registrar understands. The mapping is total:
//! malformed or incomplete blocks degrade to advisory warnings and a reduced
//! flag list, never an error. Credential contents are never touched here,
//! only pointers to where they live.

use crate::config::AuthSpec;

pub const AUTH_TYPE_FLAG: &str = "--auth-type";
pub const CREDENTIAL_SOURCE_FLAG: &str = "--auth-credential-source";
pub const API_KEY_ENV_VAR_FLAG: &str = "--auth-api-key-env-var";
pub const SCOPES_FLAG: &str = "--auth-scopes";

/// Known credential source values the mapper validates against.
const SOURCE_CREDENTIAL_FILE: &str = "credential_file";
const SOURCE_ENV_VAR: &str = "env_var";

/// Result of mapping an auth block: ordered flag pairs plus advisory warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthFlags {
    pub flags: Vec<(&'static str, String)>,
    pub warnings: Vec<String>,
}

impl AuthFlags {
    /// Flatten the flag pairs into argv tokens for a registrar invocation.
    pub fn to_args(&self) -> Vec<String> {
        self.flags
            .iter()
            .flat_map(|(flag, value)| [(*flag).to_string(), value.clone()])
            .collect()
    }
}

/// Map an optional auth block onto registrar flags.
///
/// Rules:
/// - absent block: no flags, no warnings
/// - missing `type`: warning, no flags at all
/// - `credential_file` source without `key_name_in_file`: warning only, the
///   file-side key matching convention is the registrar's concern
/// - `env_var` source without `api_key_env_var`: warning, env-var flag omitted
/// - non-empty `scopes`: space-joined into a single value token; scope values
///   containing whitespace are a known limitation of the flag encoding
pub fn map_auth_flags(auth: Option<&AuthSpec>) -> AuthFlags {
    let mut mapped = AuthFlags::default();
    let Some(auth) = auth else {
        return mapped;
    };

    let Some(auth_type) = non_empty(auth.auth_type.as_deref()) else {
        mapped
            .warnings
            .push("auth block present but 'type' is missing; no auth flags emitted".to_string());
        return mapped;
    };
    mapped.flags.push((AUTH_TYPE_FLAG, auth_type.to_string()));

    if let Some(source) = non_empty(auth.credential_source.as_deref()) {
        mapped
            .flags
            .push((CREDENTIAL_SOURCE_FLAG, source.to_string()));

        match source {
            SOURCE_CREDENTIAL_FILE => {
                if non_empty(auth.key_name_in_file.as_deref()).is_none() {
                    mapped.warnings.push(
                        "credential_source is 'credential_file' but 'key_name_in_file' is missing; \
                         relying on the registrar's key matching convention"
                            .to_string(),
                    );
                }
            }
            SOURCE_ENV_VAR => match non_empty(auth.api_key_env_var.as_deref()) {
                Some(var) => mapped.flags.push((API_KEY_ENV_VAR_FLAG, var.to_string())),
                None => mapped.warnings.push(
                    "credential_source is 'env_var' but 'api_key_env_var' is missing; \
                     env-var flag omitted"
                        .to_string(),
                ),
            },
            // Unknown sources are passed through as-is.
            _ => {}
        }
    }

    if !auth.scopes.is_empty() {
        mapped.flags.push((SCOPES_FLAG, auth.scopes.join(" ")));
    }

    mapped
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
