//! External registrar seam.
//!
//! The registrar is the host CLI tool that owns MCP server registrations.
//! The core only needs three operations from it: list current entry names,
//! remove by name, and add. `Registrar` is the trait boundary; the production
//! implementation shells out to the host CLI, and tests substitute an
//! in-memory double.

use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Default host CLI binary acting as the registrar.
pub const DEFAULT_REGISTRAR_PROGRAM: &str = "gemini";

/// Subcommand group under which the host CLI exposes registration.
const MCP_SUBCOMMAND: &str = "mcp";

/// Failure talking to the external registrar.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("failed to invoke '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registrar {operation} failed ({status}): {stderr}")]
    CommandFailed {
        operation: &'static str,
        status: String,
        stderr: String,
    },
}

/// Everything needed for one add invocation.
#[derive(Debug, Clone)]
pub struct AddRequest {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    /// Ordered auth flag pairs from the auth mapper.
    pub auth_flags: Vec<(&'static str, String)>,
}

impl AddRequest {
    /// Argv for the add invocation (without the program itself).
    ///
    /// The force flag is always appended: reconciliation is remove-then-add
    /// and must never stop on a confirmation prompt.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            MCP_SUBCOMMAND.to_string(),
            "add".to_string(),
            self.name.clone(),
            self.url.clone(),
        ];
        if let Some(description) = &self.description {
            args.push("--description".to_string());
            args.push(description.clone());
        }
        for (flag, value) in &self.auth_flags {
            args.push((*flag).to_string());
            args.push(value.clone());
        }
        args.push("--force".to_string());
        args
    }
}

/// Operations the core requires from the external registry.
pub trait Registrar {
    /// Names of currently registered entries.
    fn list_names(&self) -> Result<Vec<String>, RegistrarError>;

    /// Remove an entry by name. May fail if the entry is absent.
    fn remove(&self, name: &str) -> Result<(), RegistrarError>;

    /// Create an entry, replacing any prompt with forced acceptance.
    fn add(&self, request: &AddRequest) -> Result<(), RegistrarError>;
}

/// Registrar backed by the host CLI binary.
#[derive(Debug, Clone)]
pub struct HostCliRegistrar {
    program: String,
}

impl HostCliRegistrar {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, operation: &'static str, args: &[String]) -> Result<String, RegistrarError> {
        debug!(program = %self.program, ?args, "invoking registrar");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| RegistrarError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RegistrarError::CommandFailed {
                operation,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for HostCliRegistrar {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRAR_PROGRAM)
    }
}

impl Registrar for HostCliRegistrar {
    fn list_names(&self) -> Result<Vec<String>, RegistrarError> {
        let stdout = self.run(
            "list",
            &[MCP_SUBCOMMAND.to_string(), "list".to_string()],
        )?;
        Ok(parse_list_output(&stdout))
    }

    fn remove(&self, name: &str) -> Result<(), RegistrarError> {
        self.run(
            "remove",
            &[
                MCP_SUBCOMMAND.to_string(),
                "remove".to_string(),
                name.to_string(),
            ],
        )?;
        Ok(())
    }

    fn add(&self, request: &AddRequest) -> Result<(), RegistrarError> {
        self.run("add", &request.to_args())?;
        Ok(())
    }
}

/// Extract entry names from the registrar's list output.
///
/// The listing is name-indexed rows; the name is the first whitespace-delimited
/// token on each line. Separator and header-style lines are skipped.
fn parse_list_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|token| token.chars().any(|c| c.is_alphanumeric()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_output_takes_first_token() {
        let out = "docs    https://docs.example.com  connected\nlocal-api  http://localhost:3000  disconnected\n";
        assert_eq!(parse_list_output(out), vec!["docs", "local-api"]);
    }

    #[test]
    fn test_parse_list_output_skips_blank_and_separator_lines() {
        let out = "\n----\nserver-a http://a.test\n\n";
        assert_eq!(parse_list_output(out), vec!["server-a"]);
    }

    #[test]
    fn test_parse_list_output_empty() {
        assert!(parse_list_output("").is_empty());
    }

    #[test]
    fn test_add_request_args_minimal() {
        let request = AddRequest {
            name: "docs".to_string(),
            url: "https://docs.example.com/spec".to_string(),
            description: None,
            auth_flags: Vec::new(),
        };

        assert_eq!(
            request.to_args(),
            vec!["mcp", "add", "docs", "https://docs.example.com/spec", "--force"]
        );
    }

    #[test]
    fn test_add_request_args_full() {
        let request = AddRequest {
            name: "local-api".to_string(),
            url: "file:///work/spec.yaml".to_string(),
            description: Some("Local API".to_string()),
            auth_flags: vec![
                ("--auth-type", "api_key".to_string()),
                ("--auth-scopes", "read write".to_string()),
            ],
        };

        assert_eq!(
            request.to_args(),
            vec![
                "mcp",
                "add",
                "local-api",
                "file:///work/spec.yaml",
                "--description",
                "Local API",
                "--auth-type",
                "api_key",
                "--auth-scopes",
                "read write",
                "--force",
            ]
        );
    }

    #[test]
    fn test_force_flag_always_last() {
        let request = AddRequest {
            name: "a".to_string(),
            url: "http://x.test".to_string(),
            description: None,
            auth_flags: vec![("--auth-type", "api_key".to_string())],
        };
        assert_eq!(request.to_args().last().map(String::as_str), Some("--force"));
    }

    #[test]
    fn test_spawn_failure_for_missing_program() {
        let registrar = HostCliRegistrar::new("definitely-not-a-real-binary-4af1");
        let result = registrar.list_names();
        assert!(matches!(result, Err(RegistrarError::Spawn { .. })));
    }
}
