//! Device credentials and per-label credential resolution.
//!
//! A [`CredentialResolver`] turns a device label into the password tried
//! first for that device. When no resolver is configured the
//! [`FallbackResolver`] hands out the fixed fallback password, so the
//! primary and fallback attempts use the same secret.

use crate::error::CredentialError;
use std::fmt;
use std::process::Command;

/// Username plus secret. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    secret: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Resolves the primary password for a device from its label.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, label: &str) -> Result<String, CredentialError>;
}

/// Always returns the configured fallback password.
#[derive(Clone)]
pub struct FallbackResolver {
    password: String,
}

impl FallbackResolver {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl CredentialResolver for FallbackResolver {
    fn resolve(&self, _label: &str) -> Result<String, CredentialError> {
        Ok(self.password.clone())
    }
}

/// Runs an external password generator with the device label as its last
/// argument and uses the trimmed first line of stdout as the password.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    program: String,
    args: Vec<String>,
}

impl CommandResolver {
    /// Build from a whitespace-separated command line, e.g. `"gen-pass --site hq"`.
    pub fn from_command_line(command_line: &str) -> Result<Self, CredentialError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(CredentialError::NoProgram)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CredentialResolver for CommandResolver {
    fn resolve(&self, label: &str) -> Result<String, CredentialError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(label)
            .output()
            .map_err(|source| CredentialError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CredentialError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let password = stdout.lines().next().unwrap_or("").trim();
        if password.is_empty() {
            return Err(CredentialError::Empty {
                program: self.program.clone(),
            });
        }

        Ok(password.to_string())
    }
}

/// Primary password for `label`, falling back to `fallback` if the resolver fails.
pub fn resolve_primary(resolver: &dyn CredentialResolver, label: &str, fallback: &str) -> String {
    match resolver.resolve(label) {
        Ok(password) => password,
        Err(e) => {
            tracing::error!("Failed to resolve password for {}: {}", label, e);
            fallback.to_string()
        }
    }
}
