//! Global publish spacing.

use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

/// Shared minimum-spacing gate for outbound publish calls.
///
/// One instance is shared by every worker. [`acquire`] hands out a
/// [`PublishPermit`] that holds the internal lock until the worker either
/// records a success or drops it, so no two workers can be inside the
/// publish window at once regardless of interleaving. The timestamp is
/// advanced only through [`PublishPermit::mark`], so failed attempts do not
/// push back the next worker's slot.
///
/// [`acquire`]: PublishSpacer::acquire
#[derive(Debug, Default)]
pub struct PublishSpacer {
    last_publish: Mutex<Option<Instant>>,
}

/// Exclusive right to publish, handed out by [`PublishSpacer::acquire`].
///
/// Held across the publish call; [`mark`] consumes it on success, dropping
/// it abandons the slot without moving the timestamp.
///
/// [`mark`]: PublishPermit::mark
#[derive(Debug)]
pub struct PublishPermit<'a> {
    slot: MutexGuard<'a, Option<Instant>>,
}

impl PublishSpacer {
    /// Create a spacer with no prior publish recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until at least `gap` has elapsed since the last recorded
    /// successful publish, then return the publish permit. Returns
    /// immediately when none is recorded.
    pub async fn acquire(&self, gap: Duration) -> PublishPermit<'_> {
        let slot = self.last_publish.lock().await;
        if let Some(last) = *slot {
            let elapsed = last.elapsed();
            if elapsed < gap {
                let remaining = gap - elapsed;
                debug!(wait_ms = remaining.as_millis() as u64, "rate limited, waiting");
                tokio::time::sleep(remaining).await;
            }
        }
        PublishPermit { slot }
    }
}

impl PublishPermit<'_> {
    /// Record a successful publish at the current instant and release the
    /// permit.
    pub fn mark(mut self) {
        *self.slot = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let spacer = PublishSpacer::new();
        let started = Instant::now();
        spacer.acquire(Duration::from_secs(30)).await.mark();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_enforces_gap_since_mark() {
        let spacer = PublishSpacer::new();
        spacer.acquire(Duration::from_secs(30)).await.mark();
        let started = Instant::now();
        let permit = spacer.acquire(Duration::from_secs(30)).await;
        assert!(started.elapsed() >= Duration::from_secs(30));
        permit.mark();
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_accounts_for_elapsed_time() {
        let spacer = PublishSpacer::new();
        spacer.acquire(Duration::from_secs(30)).await.mark();
        tokio::time::sleep(Duration::from_secs(20)).await;
        let started = Instant::now();
        let permit = spacer.acquire(Duration::from_secs(30)).await;
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(10));
        assert!(waited < Duration::from_secs(30));
        drop(permit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_permit_does_not_push_back() {
        let spacer = PublishSpacer::new();
        spacer.acquire(Duration::from_secs(30)).await.mark();
        tokio::time::sleep(Duration::from_secs(30)).await;
        // A failed publish drops the permit without marking.
        drop(spacer.acquire(Duration::from_secs(30)).await);
        let started = Instant::now();
        spacer.acquire(Duration::from_secs(30)).await.mark();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquires_are_serialized() {
        let spacer = std::sync::Arc::new(PublishSpacer::new());
        let mut handles = Vec::new();
        for _ in 0..2 {
            let spacer = std::sync::Arc::clone(&spacer);
            handles.push(tokio::spawn(async move {
                let permit = spacer.acquire(Duration::from_secs(30)).await;
                let at = Instant::now();
                permit.mark();
                at
            }));
        }
        let mut marks = Vec::new();
        for handle in handles {
            marks.push(handle.await.unwrap());
        }
        marks.sort();
        assert!(marks[1] - marks[0] >= Duration::from_secs(30));
    }
}
