//! Ordered network interface probing.

use crate::device_api::{DeviceSession, InterfaceAddressing};
use thiserror::Error;

/// Wired interface first, then the secondary id
pub const DEFAULT_INTERFACE_IDS: [u32; 2] = [1, 0];

/// No candidate interface returned an addressing block.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no network interface returned valid data (tried {tried:?})")]
pub struct NotFound {
    pub tried: Vec<u32>,
}

/// Addressing found on one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterface {
    pub id: u32,
    pub addressing: InterfaceAddressing,
}

/// Probe `interface_ids` in order; the first one with an addressing block wins.
///
/// Failed probes are skipped without logging. Exhausting every candidate logs
/// a single warning.
pub async fn resolve(
    session: &dyn DeviceSession,
    interface_ids: &[u32],
) -> Result<ResolvedInterface, NotFound> {
    for &id in interface_ids {
        if let Ok(Some(addressing)) = session.network_interface(id).await {
            return Ok(ResolvedInterface { id, addressing });
        }
    }

    let not_found = NotFound {
        tried: interface_ids.to_vec(),
    };
    tracing::warn!("{}", not_found);
    Err(not_found)
}
