//! URL template resolution.
//!
//! Descriptor URLs may embed shell-style `${VAR}` references that are expanded
//! against a substitution context captured at invocation time. Expansion is a
//! pure function: a template with no references passes through unchanged, and
//! a reference with no context value is an error, never a silent drop.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

/// Variable name under which the invocation directory is exposed.
pub const CWD_VAR: &str = "CWD";

/// Template expansion failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The template references a variable the context does not supply.
    #[error("unknown template variable ${{{0}}}")]
    UnknownVariable(String),
    /// A `${` opener with no closing brace.
    #[error("unterminated variable reference in template: {0}")]
    UnterminatedReference(String),
}

/// Substitution values available during template expansion.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    values: BTreeMap<String, String>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a run invoked from `dir`, exposing it as `${CWD}`.
    pub fn for_invocation_dir(dir: &Path) -> Self {
        Self::new().with_value(CWD_VAR, dir.display().to_string())
    }

    /// Context for a run invoked from the current working directory.
    pub fn from_current_dir() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::for_invocation_dir(&cwd))
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Expand all `${VAR}` references in `template` using `ctx`.
///
/// Idempotent on templates containing no references.
pub fn expand_template(template: &str, ctx: &ResolveContext) -> Result<String, ResolutionError> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after_opener = &rest[start + 2..];
        let end = after_opener
            .find('}')
            .ok_or_else(|| ResolutionError::UnterminatedReference(template.to_string()))?;
        let name = &after_opener[..end];
        let value = ctx
            .get(name)
            .ok_or_else(|| ResolutionError::UnknownVariable(name.to_string()))?;
        result.push_str(value);
        rest = &after_opener[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_url_passes_through_unchanged() {
        let ctx = ResolveContext::new();
        let url = "https://api.example.com:8443/spec";
        assert_eq!(expand_template(url, &ctx).unwrap(), url);
    }

    #[test]
    fn test_expansion_is_idempotent_on_plain_input() {
        let ctx = ResolveContext::for_invocation_dir(Path::new("/work/project"));
        let once = expand_template("file:///tmp/spec.yaml", &ctx).unwrap();
        let twice = expand_template(&once, &ctx).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cwd_substitution() {
        let ctx = ResolveContext::for_invocation_dir(Path::new("/work/project"));
        let resolved = expand_template("file://${CWD}/specs/api.yaml", &ctx).unwrap();
        assert_eq!(resolved, "file:///work/project/specs/api.yaml");
    }

    #[test]
    fn test_multiple_references() {
        let ctx = ResolveContext::new()
            .with_value("HOST", "localhost")
            .with_value("PORT", "8080");
        let resolved = expand_template("http://${HOST}:${PORT}/spec", &ctx).unwrap();
        assert_eq!(resolved, "http://localhost:8080/spec");
    }

    #[test]
    fn test_unknown_variable_errors() {
        let ctx = ResolveContext::new();
        let err = expand_template("file://${CWD}/spec.yaml", &ctx).unwrap_err();
        assert_eq!(err, ResolutionError::UnknownVariable("CWD".to_string()));
    }

    #[test]
    fn test_unterminated_reference_errors() {
        let ctx = ResolveContext::new().with_value("CWD", "/work");
        let err = expand_template("file://${CWD/spec.yaml", &ctx).unwrap_err();
        assert!(matches!(err, ResolutionError::UnterminatedReference(_)));
    }

    #[test]
    fn test_empty_template() {
        let ctx = ResolveContext::new();
        assert_eq!(expand_template("", &ctx).unwrap(), "");
    }
}
