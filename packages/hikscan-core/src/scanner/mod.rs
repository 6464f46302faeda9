//! Per-device collection.
//!
//! For one device:
//! - authenticate (primary credential, then fallback on rejection)
//! - identity lookup
//! - clock lookup and drift evaluation
//! - network interface probing
//!
//! Each lookup is isolated: a failure is logged and leaves its fields at
//! their defaults without affecting the other lookups.

pub mod auth;
pub mod clock;
pub mod network;
pub mod record;

pub use auth::{AuthAttempt, AuthenticatedSession, authenticate};
pub use clock::ClockStatus;
pub use network::{NotFound, ResolvedInterface};
pub use record::{CollectionStatus, Coverage, DeviceRecord, LookupOutcome, UNKNOWN, VENDOR};

use crate::config::DeviceSettings;
use crate::credentials::Credential;
use crate::device_api::{DeviceConnector, DeviceSession};
use chrono::{DateTime, Utc};
use tracing::Instrument;

/// Drives authentication and the three lookups for one device at a time.
pub struct Collector<'a> {
    connector: &'a dyn DeviceConnector,
    settings: &'a DeviceSettings,
    now: fn() -> DateTime<Utc>,
}

impl<'a> Collector<'a> {
    pub fn new(connector: &'a dyn DeviceConnector, settings: &'a DeviceSettings) -> Self {
        Self {
            connector,
            settings,
            now: Utc::now,
        }
    }

    /// Replace the clock used as the reference for drift evaluation.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Authenticate to `address` and collect its record.
    ///
    /// Always returns a record. Without a session it keeps every default and
    /// status `Error`.
    pub async fn collect_device(
        &self,
        address: &str,
        label: &str,
        primary_password: &str,
    ) -> DeviceRecord {
        let span = tracing::info_span!("device", host = %address);

        async {
            let primary = Credential::new(&self.settings.username, primary_password);
            let fallback = Credential::new(&self.settings.username, &self.settings.fallback_password);

            match authenticate(self.connector, address, &primary, &fallback, self.settings.timeout).await {
                Ok(auth) => self.collect_session(address, label, auth.session.as_ref()).await,
                Err(_) => DeviceRecord::new(address, label),
            }
        }
        .instrument(span)
        .await
    }

    /// Run the lookups against an already validated session.
    pub async fn collect(
        &self,
        address: &str,
        label: &str,
        session: &dyn DeviceSession,
    ) -> DeviceRecord {
        let span = tracing::info_span!("device", host = %address);
        self.collect_session(address, label, session)
            .instrument(span)
            .await
    }

    async fn collect_session(
        &self,
        address: &str,
        label: &str,
        session: &dyn DeviceSession,
    ) -> DeviceRecord {
        let mut record = DeviceRecord::new(address, label);

        record.identity_lookup = self.lookup_identity(session, &mut record).await;
        record.clock_lookup = self.lookup_clock(session, &mut record).await;
        record.network_lookup = self.lookup_network(session, &mut record).await;

        record.mark_authenticated();
        tracing::debug!("Collection finished ({} coverage)", record.coverage());
        record
    }

    async fn lookup_identity(
        &self,
        session: &dyn DeviceSession,
        record: &mut DeviceRecord,
    ) -> LookupOutcome {
        match session.device_info().await {
            Ok(Some(info)) => {
                record.apply_identity(info);
                LookupOutcome::Collected
            }
            Ok(None) => {
                tracing::debug!("Device info response had no DeviceInfo element");
                LookupOutcome::NoData
            }
            Err(e) => {
                tracing::error!("Failed to read device info: {}", e);
                LookupOutcome::Failed
            }
        }
    }

    async fn lookup_clock(
        &self,
        session: &dyn DeviceSession,
        record: &mut DeviceRecord,
    ) -> LookupOutcome {
        match session.time().await {
            Ok(Some(time)) => {
                record.apply_time(&time);
                if let Some(status) = clock::evaluate(time.local_time.as_deref(), (self.now)()) {
                    record.clock_status = status.to_string();
                }
                LookupOutcome::Collected
            }
            Ok(None) => {
                tracing::debug!("Time response had no Time element");
                LookupOutcome::NoData
            }
            Err(e) => {
                tracing::error!("Failed to read device time: {}", e);
                LookupOutcome::Failed
            }
        }
    }

    async fn lookup_network(
        &self,
        session: &dyn DeviceSession,
        record: &mut DeviceRecord,
    ) -> LookupOutcome {
        match network::resolve(session, &self.settings.interface_ids).await {
            Ok(found) => {
                tracing::debug!("Network addressing read from interface {}", found.id);
                record.apply_addressing(found.addressing);
                LookupOutcome::Collected
            }
            // already logged by the resolver
            Err(_) => LookupOutcome::Failed,
        }
    }
}
