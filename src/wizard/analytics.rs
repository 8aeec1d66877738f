//! Optional analytics hook for the surrounding application.

use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalyticsEvent {
    /// A certificate was composited successfully.
    CertificateGenerated {
        /// Campaign title from the configuration.
        campaign: String,
        /// Hex fingerprint of the encoded certificate.
        label: String,
    },
}

impl AnalyticsEvent {
    /// Event name as reported to analytics backends.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CertificateGenerated { .. } => "generate_certificate",
        }
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AnalyticsSink for RecordingSink {
    fn record(&self, event: AnalyticsEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Sink that forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn record(&self, event: AnalyticsEvent) {
        match &event {
            AnalyticsEvent::CertificateGenerated { campaign, label } => {
                tracing::info!(
                    event = event.name(),
                    campaign = %campaign,
                    label = %label,
                    "analytics event"
                );
            }
        }
    }
}
