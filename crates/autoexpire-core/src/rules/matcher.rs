use chrono::{DateTime, Duration, Utc};

use super::Rule;
use crate::post::PostRecord;
use crate::storage::{MatchFilter, PostStore};
use crate::Result;

/// Finds the posts a rule applies to
pub struct PostMatcher<'a, S: PostStore + ?Sized> {
    store: &'a S,
}

/// Posts created at or before the returned instant are old enough for the rule
pub fn cutoff_for(days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

impl<'a, S: PostStore + ?Sized> PostMatcher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Published posts older than the rule's cutoff whose title contains the
    /// search term. A post may match several rules; nothing is deduplicated.
    pub async fn find_matches(&self, rule: &Rule, now: DateTime<Utc>) -> Result<Vec<PostRecord>> {
        let filter = MatchFilter {
            created_before: cutoff_for(rule.days, now),
            title_contains: rule.title_search.clone(),
        };

        tracing::debug!(
            slot = rule.slot,
            search = %rule.title_search,
            days = rule.days,
            cutoff = %filter.created_before.format("%Y-%m-%d %H:%M:%S"),
            "Querying candidate posts"
        );

        let candidates = self.store.find_candidates(&filter).await?;
        let total = candidates.len();

        let matches: Vec<PostRecord> = candidates
            .into_iter()
            .filter(|post| {
                let ok = post.is_actionable();
                if !ok {
                    tracing::debug!(post_id = post.id, "Skipping post that is no longer actionable");
                }
                ok
            })
            .collect();

        tracing::debug!(slot = rule.slot, "Found {} matching posts ({} candidates)", matches.len(), total);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleAction;
    use crate::test_support::MemoryPostStore;

    fn rule(title: &str, days: u32) -> Rule {
        Rule {
            slot: 1,
            title_search: title.to_string(),
            days,
            action: RuleAction::Disable,
        }
    }

    #[tokio::test]
    async fn test_cutoff_boundary_is_inclusive() {
        let now = Utc::now();
        let store = MemoryPostStore::new();
        let older = store.insert("Sale A", now - Duration::days(31), 1);
        let newer = store.insert("Sale B", now - Duration::days(29), 1);
        let exact = store.insert("Sale C", now - Duration::days(30), 1);

        let matches = PostMatcher::new(&store).find_matches(&rule("Sale", 30), now).await.unwrap();
        let ids: Vec<_> = matches.iter().map(|p| p.id).collect();

        assert!(ids.contains(&older));
        assert!(ids.contains(&exact));
        assert!(!ids.contains(&newer));
    }

    #[tokio::test]
    async fn test_unpublished_posts_never_match() {
        let now = Utc::now();
        let store = MemoryPostStore::new();
        store.insert("Sale", now - Duration::days(100), 0);

        let matches = PostMatcher::new(&store).find_matches(&rule("Sale", 1), now).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_title_match_is_case_insensitive() {
        let now = Utc::now();
        let store = MemoryPostStore::new();
        let id = store.insert("Summer SALE ends", now - Duration::days(10), 1);

        let matches = PostMatcher::new(&store).find_matches(&rule("sale", 7), now).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, id);
    }

    #[tokio::test]
    async fn test_invalid_rows_from_store_are_skipped() {
        let now = Utc::now();
        let store = MemoryPostStore::new();
        store.insert("Sale", now - Duration::days(10), 1);
        // A store returning rows it should not have (concurrent edit, bad id)
        store.inject_candidate(PostRecord {
            id: 0,
            title: "Sale ghost".to_string(),
            created: now - Duration::days(10),
            published: 1,
            state: 0,
        });
        store.inject_candidate(PostRecord {
            id: 77,
            title: "Sale gone".to_string(),
            created: now - Duration::days(10),
            published: 0,
            state: 0,
        });

        let matches = PostMatcher::new(&store).find_matches(&rule("Sale", 7), now).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Sale");
    }

    #[test]
    fn test_cutoff_for() {
        let now = Utc::now();
        assert_eq!(cutoff_for(1, now), now - Duration::days(1));
        assert_eq!(cutoff_for(3650, now), now - Duration::days(3650));
    }
}
