//! Session authentication with a single credential fallback.

use crate::credentials::Credential;
use crate::device_api::{DeviceConnector, DeviceSession};
use crate::error::{ApiError, AuthError};
use std::fmt;
use std::time::Duration;

/// Which credential opened the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAttempt {
    Primary,
    Fallback,
}

impl fmt::Display for AuthAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthAttempt::Primary => write!(f, "primary"),
            AuthAttempt::Fallback => write!(f, "fallback"),
        }
    }
}

/// A session whose credential has been confirmed by a device query.
pub struct AuthenticatedSession {
    pub session: Box<dyn DeviceSession>,
    pub attempt: AuthAttempt,
}

/// Open a validated session to `address`.
///
/// The primary credential is tried first. Only an authorization rejection
/// leads to one more attempt with the fallback credential; transport and
/// protocol failures end authentication immediately.
pub async fn authenticate(
    connector: &dyn DeviceConnector,
    address: &str,
    primary: &Credential,
    fallback: &Credential,
    timeout: Duration,
) -> Result<AuthenticatedSession, AuthError> {
    match try_credential(connector, address, primary, timeout).await {
        Ok(session) => {
            tracing::info!("Authenticated with primary credential");
            return Ok(AuthenticatedSession {
                session,
                attempt: AuthAttempt::Primary,
            });
        }
        Err(e) if e.is_auth_rejection() => {
            tracing::warn!("Primary credential rejected ({}), trying fallback credential", e);
        }
        Err(e) => {
            tracing::error!("Initial connection failed: {}", e);
            return Err(AuthError::Connection(e));
        }
    }

    match try_credential(connector, address, fallback, timeout).await {
        Ok(session) => {
            tracing::info!("Authenticated with fallback credential");
            Ok(AuthenticatedSession {
                session,
                attempt: AuthAttempt::Fallback,
            })
        }
        Err(e) => {
            tracing::error!("Authentication failed with fallback credential: {}", e);
            if e.is_auth_rejection() {
                Err(AuthError::Rejected(e))
            } else {
                Err(AuthError::Connection(e))
            }
        }
    }
}

/// Open a session and confirm it with an identity query.
async fn try_credential(
    connector: &dyn DeviceConnector,
    address: &str,
    credential: &Credential,
    timeout: Duration,
) -> Result<Box<dyn DeviceSession>, ApiError> {
    let session = connector.open_session(address, credential, timeout).await?;
    session.device_info().await?;
    Ok(session)
}
