use std::fmt;

use super::RuleAction;
use crate::post::{PostRecord, STATE_ARCHIVED};
use crate::storage::{PostField, PostStore, UnpublishOptions};
use crate::Result;

/// One store write performed as part of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStep {
    Archive,
    Disable,
}

impl fmt::Display for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive => f.write_str("archive"),
            Self::Disable => f.write_str("disable"),
        }
    }
}

/// Store writes for an action, in execution order.
/// Archive goes first so a reader never sees a published post that is
/// half way through `Both`. The two writes are not atomic.
fn steps_for(action: RuleAction) -> &'static [ActionStep] {
    match action {
        RuleAction::Disable => &[ActionStep::Disable],
        RuleAction::Archive => &[ActionStep::Archive],
        RuleAction::Both => &[ActionStep::Archive, ActionStep::Disable],
    }
}

/// Outcome of applying an action to one post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub action: RuleAction,
    /// Development mode: nothing was written
    pub dry_run: bool,
    /// Steps whose store write failed
    pub failed: Vec<ActionStep>,
}

impl ActionResult {
    /// Human readable description of what was (or would have been) done
    pub fn label(&self) -> &'static str {
        match (self.dry_run, self.action) {
            (true, RuleAction::Disable) => "would disable",
            (true, RuleAction::Archive) => "would archive",
            (true, RuleAction::Both) => "would archive and disable",
            (false, RuleAction::Disable) => "disabled",
            (false, RuleAction::Archive) => "archived",
            (false, RuleAction::Both) => "archived and disabled",
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies rule actions to posts through the store
pub struct ActionApplier<'a, S: PostStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PostStore + ?Sized> ActionApplier<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Apply `action` to `post`, or only describe it in development mode.
    ///
    /// Store errors are logged and reported on the result; they never stop
    /// the remaining steps or the caller's batch.
    pub async fn apply(
        &self,
        post: &PostRecord,
        action: RuleAction,
        development_mode: bool,
    ) -> ActionResult {
        if development_mode {
            return ActionResult {
                action,
                dry_run: true,
                failed: Vec::new(),
            };
        }

        let mut failed = Vec::new();
        for &step in steps_for(action) {
            if let Err(e) = self.run_step(post.id, step).await {
                tracing::error!(
                    post_id = post.id,
                    action = %step,
                    error = %e,
                    "Failed to {} post {}",
                    step,
                    post.id
                );
                failed.push(step);
            }
        }

        ActionResult {
            action,
            dry_run: false,
            failed,
        }
    }

    async fn run_step(&self, id: i64, step: ActionStep) -> Result<()> {
        match step {
            ActionStep::Archive => {
                self.store
                    .update_fields(id, &[PostField::State(STATE_ARCHIVED)])
                    .await
            }
            ActionStep::Disable => self.store.unpublish(id, UnpublishOptions::scheduled()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryPostStore, StoreCall};
    use chrono::{Duration, Utc};

    fn stored_post(store: &MemoryPostStore) -> PostRecord {
        let id = store.insert("Summer Sale", Utc::now() - Duration::days(10), 1);
        store.get(id).unwrap()
    }

    #[tokio::test]
    async fn test_disable_unpublishes_as_scheduled() {
        let store = MemoryPostStore::new();
        let post = stored_post(&store);

        let result = ActionApplier::new(&store).apply(&post, RuleAction::Disable, false).await;

        assert!(result.is_success());
        assert_eq!(result.label(), "disabled");
        let after = store.get(post.id).unwrap();
        assert!(!after.is_published());
        assert!(!after.is_archived());
        assert_eq!(
            store.calls(),
            vec![StoreCall::Unpublish(post.id, UnpublishOptions::scheduled())]
        );
    }

    #[tokio::test]
    async fn test_archive_keeps_publication() {
        let store = MemoryPostStore::new();
        let post = stored_post(&store);

        let result = ActionApplier::new(&store).apply(&post, RuleAction::Archive, false).await;

        assert_eq!(result.label(), "archived");
        let after = store.get(post.id).unwrap();
        assert!(after.is_archived());
        assert!(after.is_published());
    }

    #[tokio::test]
    async fn test_both_archives_then_disables() {
        let store = MemoryPostStore::new();
        let post = stored_post(&store);

        let result = ActionApplier::new(&store).apply(&post, RuleAction::Both, false).await;

        assert_eq!(result.label(), "archived and disabled");
        let after = store.get(post.id).unwrap();
        assert!(after.is_archived());
        assert!(!after.is_published());
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::UpdateFields(post.id, vec![PostField::State(STATE_ARCHIVED)]),
                StoreCall::Unpublish(post.id, UnpublishOptions::scheduled()),
            ]
        );
    }

    #[tokio::test]
    async fn test_development_mode_never_writes() {
        let store = MemoryPostStore::new();
        let post = stored_post(&store);
        let applier = ActionApplier::new(&store);

        let labels = [
            (RuleAction::Disable, "would disable"),
            (RuleAction::Archive, "would archive"),
            (RuleAction::Both, "would archive and disable"),
        ];
        for (action, label) in labels {
            let result = applier.apply(&post, action, true).await;
            assert!(result.dry_run);
            assert_eq!(result.label(), label);
        }

        assert_eq!(store.get(post.id).unwrap(), post);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_archive_still_disables() {
        let store = MemoryPostStore::new();
        let post = stored_post(&store);
        store.fail_update(post.id);

        let result = ActionApplier::new(&store).apply(&post, RuleAction::Both, false).await;

        assert_eq!(result.failed, vec![ActionStep::Archive]);
        assert!(!result.is_success());
        let after = store.get(post.id).unwrap();
        assert!(!after.is_archived());
        assert!(!after.is_published());
    }
}
