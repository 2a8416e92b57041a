use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use uuid::Uuid;

use crate::models::{Notice, NoticeLevel};
use crate::observability::Metrics;

/// Fire-and-forget sink for user-facing notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn error(&self, message: &str) {
        self.notify(Notice::error(message));
    }

    fn info(&self, message: &str) {
        self.notify(Notice::info(message));
    }
}

/// Bounded queue of pending toasts. The oldest notice is dropped when full.
pub struct ToastQueue {
    pending: Mutex<VecDeque<Notice>>,
    capacity: usize,
    metrics: Option<Arc<Metrics>>,
}

impl ToastQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return every pending notice, oldest first
    pub fn drain(&self) -> Vec<Notice> {
        self.lock().drain(..).collect()
    }

    /// Drop pending notices already delivered elsewhere
    pub fn acknowledge(&self, ids: &[Uuid]) {
        if ids.is_empty() {
            return;
        }
        self.lock().retain(|notice| !ids.contains(&notice.id));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notice>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => warn!(message = %notice.message, "Toast error"),
            NoticeLevel::Info => info!(message = %notice.message, "Toast info"),
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_notice(notice.level.as_str());
        }

        let mut pending = self.lock();
        if pending.len() >= self.capacity {
            pending.pop_front();
        }
        pending.push_back(notice);
    }
}

/// Notifier that only writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => warn!(message = %notice.message, "Notice"),
            NoticeLevel::Info => info!(message = %notice.message, "Notice"),
        }
    }
}
