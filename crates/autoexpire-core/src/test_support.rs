//! In-memory `PostStore` with failure injection for unit tests

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::post::PostRecord;
use crate::storage::{MatchFilter, PostField, PostStore, UnpublishOptions};
use crate::{Error, Result};

/// Mutating store calls, in the order they were made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Unpublish(i64, UnpublishOptions),
    UpdateFields(i64, Vec<PostField>),
}

#[derive(Default)]
struct Inner {
    posts: BTreeMap<i64, PostRecord>,
    next_id: i64,
    extra_candidates: Vec<PostRecord>,
    calls: Vec<StoreCall>,
    fail_unpublish: HashSet<i64>,
    fail_update: HashSet<i64>,
    fail_query: bool,
    disabled: bool,
    gate_error: bool,
    gate_checks: usize,
}

#[derive(Default)]
pub struct MemoryPostStore {
    inner: Mutex<Inner>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, title: &str, created: DateTime<Utc>, published: i32) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.posts.insert(
            id,
            PostRecord {
                id,
                title: title.to_string(),
                created,
                published,
                state: 0,
            },
        );
        id
    }

    pub fn get(&self, id: i64) -> Option<PostRecord> {
        self.inner.lock().unwrap().posts.get(&id).cloned()
    }

    /// Return this row from every candidate query regardless of the filter
    pub fn inject_candidate(&self, post: PostRecord) {
        self.inner.lock().unwrap().extra_candidates.push(post);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn fail_unpublish(&self, id: i64) {
        self.inner.lock().unwrap().fail_unpublish.insert(id);
    }

    pub fn fail_update(&self, id: i64) {
        self.inner.lock().unwrap().fail_update.insert(id);
    }

    pub fn fail_queries(&self) {
        self.inner.lock().unwrap().fail_query = true;
    }

    pub fn disable(&self) {
        self.inner.lock().unwrap().disabled = true;
    }

    pub fn fail_gate(&self) {
        self.inner.lock().unwrap().gate_error = true;
    }

    pub fn gate_checks(&self) -> usize {
        self.inner.lock().unwrap().gate_checks
    }
}

#[async_trait::async_trait]
impl PostStore for MemoryPostStore {
    async fn is_enabled(&self) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.gate_checks += 1;
        if inner.gate_error {
            return Err(Error::Other("feature check failed".to_string()));
        }
        Ok(!inner.disabled)
    }

    async fn find_candidates(&self, filter: &MatchFilter) -> Result<Vec<PostRecord>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_query {
            return Err(Error::Other("query failed".to_string()));
        }

        let mut rows: Vec<PostRecord> = inner
            .posts
            .values()
            .filter(|p| {
                p.published == 1
                    && p.created <= filter.created_before
                    && filter.matches_title(&p.title)
            })
            .cloned()
            .collect();
        rows.extend(inner.extra_candidates.iter().cloned());
        Ok(rows)
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<PostRecord>> {
        Ok(self.get(id))
    }

    async fn unpublish(&self, id: i64, options: UnpublishOptions) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(StoreCall::Unpublish(id, options));
        if inner.fail_unpublish.contains(&id) {
            return Err(Error::Other(format!("unpublish of {id} failed")));
        }
        match inner.posts.get_mut(&id) {
            Some(post) => {
                post.published = 0;
                Ok(())
            }
            None => Err(Error::PostNotFound(id)),
        }
    }

    async fn update_fields(&self, id: i64, fields: &[PostField]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(StoreCall::UpdateFields(id, fields.to_vec()));
        if inner.fail_update.contains(&id) {
            return Err(Error::Other(format!("update of {id} failed")));
        }
        let post = inner.posts.get_mut(&id).ok_or(Error::PostNotFound(id))?;
        for field in fields {
            match *field {
                PostField::State(state) => post.state = state,
                PostField::Published(published) => post.published = i32::from(published),
            }
        }
        Ok(())
    }
}
