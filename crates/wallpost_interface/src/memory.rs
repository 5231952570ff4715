//! In-memory submission store.

use crate::SubmissionStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use wallpost_core::{Submission, SubmissionStatus};
use wallpost_error::{StoreError, StoreErrorKind, WallpostResult};

#[derive(Default)]
struct StoreState {
    submissions: Vec<Submission>,
    claimed: HashSet<i64>,
    next_id: i64,
}

/// In-memory [`SubmissionStore`] backend.
///
/// Claim-and-mark runs under a single mutex, so no two workers can receive
/// the same submission concurrently. Used by tests and by deployments without
/// a persistent store wired in.
///
/// # Examples
///
/// ```no_run
/// use wallpost_interface::{MemoryStore, SubmissionStore};
/// use wallpost_core::{Submission, SubmissionStatus};
///
/// #[tokio::main]
/// async fn main() {
///     let store = MemoryStore::new();
///     let mut sub = Submission::new(0, "alice", "hello");
///     sub.status = SubmissionStatus::Approved;
///     let id = store.insert(sub);
///     let claimed = store.claim_approved().await.unwrap().unwrap();
///     assert_eq!(claimed.id, id);
///     // Claimed items are invisible to other workers until saved.
///     assert!(store.claim_approved().await.unwrap().is_none());
/// }
/// ```
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                next_id: 1,
                ..StoreState::default()
            }),
        }
    }

    /// Insert a submission, assigning the next identifier. Returns the id.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn insert(&self, mut submission: Submission) -> i64 {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let id = state.next_id;
        state.next_id += 1;
        submission.id = id;
        state.submissions.push(submission);
        id
    }

    fn lock_state(&self) -> WallpostResult<std::sync::MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|e| {
            StoreError::new(StoreErrorKind::Unavailable(format!(
                "store mutex poisoned: {e}"
            )))
            .into()
        })
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn claim_approved(&self) -> WallpostResult<Option<Submission>> {
        let mut state = self.lock_state()?;
        let StoreState {
            submissions,
            claimed,
            ..
        } = &mut *state;
        let found = submissions
            .iter()
            .filter(|s| {
                s.status == SubmissionStatus::Approved
                    && s.tid.is_empty()
                    && !claimed.contains(&s.id)
            })
            .min_by_key(|s| s.id)
            .cloned();
        if let Some(sub) = &found {
            claimed.insert(sub.id);
        }
        Ok(found)
    }

    async fn save(&self, submission: &Submission) -> WallpostResult<()> {
        let mut state = self.lock_state()?;
        state.claimed.remove(&submission.id);
        match state.submissions.iter_mut().find(|s| s.id == submission.id) {
            Some(slot) => *slot = submission.clone(),
            None => state.submissions.push(submission.clone()),
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> WallpostResult<Option<Submission>> {
        let state = self.lock_state()?;
        Ok(state.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_by_status(&self, status: SubmissionStatus) -> WallpostResult<Vec<Submission>> {
        let state = self.lock_state()?;
        let mut items: Vec<_> = state
            .submissions
            .iter()
            .filter(|s| s.status == status)
            .cloned()
            .collect();
        items.sort_by_key(|s| s.id);
        Ok(items)
    }

    async fn count_by_status(&self, status: SubmissionStatus) -> WallpostResult<usize> {
        let state = self.lock_state()?;
        Ok(state
            .submissions
            .iter()
            .filter(|s| s.status == status)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved(author: &str, text: &str) -> Submission {
        let mut sub = Submission::new(0, author, text);
        sub.status = SubmissionStatus::Approved;
        sub
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_until_saved() {
        let store = MemoryStore::new();
        let id = store.insert(approved("a", "one"));

        let first = store.claim_approved().await.unwrap();
        assert_eq!(first.as_ref().map(|s| s.id), Some(id));
        assert!(store.claim_approved().await.unwrap().is_none());

        // Saving a terminal status keeps the item out of the pool.
        let mut done = first.unwrap();
        done.status = SubmissionStatus::Published;
        done.tid = "t1".to_string();
        store.save(&done).await.unwrap();
        assert!(store.claim_approved().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_returns_oldest_first() {
        let store = MemoryStore::new();
        let first = store.insert(approved("a", "one"));
        let _second = store.insert(approved("b", "two"));
        let claimed = store.claim_approved().await.unwrap().unwrap();
        assert_eq!(claimed.id, first);
    }

    #[tokio::test]
    async fn test_non_terminal_save_releases_claim() {
        let store = MemoryStore::new();
        store.insert(approved("a", "one"));
        let sub = store.claim_approved().await.unwrap().unwrap();
        store.save(&sub).await.unwrap();
        assert!(store.claim_approved().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_counts_by_status() {
        let store = MemoryStore::new();
        store.insert(approved("a", "one"));
        store.insert(Submission::new(0, "b", "two"));
        assert_eq!(
            store
                .count_by_status(SubmissionStatus::Approved)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count_by_status(SubmissionStatus::Pending)
                .await
                .unwrap(),
            1
        );
    }
}
