use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking fulfillment outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct FulfillmentMetrics {
    /// Records handed to the controller.
    pub received: AtomicU64,
    /// Records committed and answered with a `SUCCESS` reply.
    pub succeeded: AtomicU64,
    /// Records answered with a `MALFORMED` reply.
    pub malformed: AtomicU64,
    /// Records answered with an `INTERNAL_ERROR` reply.
    pub internal_error: AtomicU64,
    /// Records nacked because the commit service was unreachable.
    pub nacked_invoke: AtomicU64,
    /// Records nacked because the reply could not be published.
    pub nacked_publish: AtomicU64,
}

impl FulfillmentMetrics {
    pub fn increment_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_internal_error(&self) {
        self.internal_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_nacked_invoke(&self) {
        self.nacked_invoke.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_nacked_publish(&self) {
        self.nacked_publish.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            internal_error: self.internal_error.load(Ordering::Relaxed),
            nacked_invoke: self.nacked_invoke.load(Ordering::Relaxed),
            nacked_publish: self.nacked_publish.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`FulfillmentMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub succeeded: u64,
    pub malformed: u64,
    pub internal_error: u64,
    pub nacked_invoke: u64,
    pub nacked_publish: u64,
}

impl MetricsSnapshot {
    /// Records that reached a terminal decision.
    pub fn resolved(&self) -> u64 {
        self.succeeded
            + self.malformed
            + self.internal_error
            + self.nacked_invoke
            + self.nacked_publish
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let metrics = FulfillmentMetrics::default();
        metrics.increment_received();
        metrics.increment_received();
        metrics.increment_succeeded();
        metrics.increment_nacked_publish();

        let snap = metrics.snapshot();
        assert_eq!(snap.received, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.nacked_publish, 1);
        assert_eq!(snap.malformed, 0);
        assert_eq!(snap.resolved(), 2);
    }
}
