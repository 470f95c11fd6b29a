use metrics_exporter_prometheus::PrometheusHandle;
use nomination_desk::config::NominationConfig;
use nomination_desk::error::AppError;
use nomination_desk::workflows::memory::InMemoryStore;
use nomination_desk::workflows::moderation::{Notification, NotificationError, NotificationQueue};
use nomination_desk::workflows::roster::RosterImporter;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification queue that logs each approval and keeps it for inspection.
///
/// Stands in for the committee e-mail relay until one is wired up.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationQueue {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationQueue for LoggingNotificationQueue {
    fn enqueue(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotificationError::Unavailable("queue lock poisoned".to_string()))?;
        info!(
            title = %notification.title,
            submission = notification.metadata.get("submission_id").map(String::as_str),
            "notification enqueued"
        );
        guard.push(notification);
        Ok(())
    }
}

impl LoggingNotificationQueue {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Candidate store seeded from the configured roster, or empty when none is configured.
pub(crate) fn seed_store(config: &NominationConfig) -> Result<InMemoryStore, AppError> {
    let Some(path) = &config.roster_path else {
        return Ok(InMemoryStore::default());
    };

    let candidates = RosterImporter::from_path(path)?;
    let count = candidates.len();
    let store = InMemoryStore::with_candidates(candidates)?;
    info!(roster = %path.display(), candidates = count, "candidate store seeded");
    Ok(store)
}
