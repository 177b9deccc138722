use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::store::error::StoreResult;
use crate::store::{ParseObject, QueryBuilder, RecordedQuery, StoreClient, StoreError};

/// Store client backed by seeded rows.
///
/// Rows are returned per class with skip and limit applied; constraints are recorded
/// but not evaluated.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<Mutex<BTreeMap<String, Vec<ParseObject>>>>,
    executed: Arc<Mutex<Vec<RecordedQuery>>>,
    failure: Arc<Mutex<Option<StoreError>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `object` to the rows of its class.
    pub fn insert(&self, object: ParseObject) {
        let mut rows = self.rows.lock().unwrap();
        rows.entry(object.class_name().to_string())
            .or_default()
            .push(object);
    }

    /// Makes every following `find`/`count` fail with `error`.
    pub fn fail_with(&self, error: StoreError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn clear_failure(&self) {
        self.failure.lock().unwrap().take();
    }

    /// Queries executed so far, oldest first.
    pub fn executed_queries(&self) -> Vec<RecordedQuery> {
        self.executed.lock().unwrap().clone()
    }

    fn record(&self, query: &RecordedQuery) -> StoreResult<()> {
        self.executed.lock().unwrap().push(query.clone());
        match self.failure.lock().unwrap().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn rows_for(&self, class_name: &str) -> Vec<ParseObject> {
        self.rows
            .lock()
            .unwrap()
            .get(class_name)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    type Query = RecordedQuery;

    fn new_query(&self, class_name: &str) -> RecordedQuery {
        RecordedQuery::new(class_name)
    }

    async fn find(&self, query: &RecordedQuery) -> StoreResult<Vec<ParseObject>> {
        self.record(query)?;
        let rows = self.rows_for(query.class_name());

        let skip = query.skip().filter(|skip| *skip > 0).unwrap_or(0) as usize;
        let iter = rows.into_iter().skip(skip);
        let rows = match query.limit().filter(|limit| *limit >= 0) {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        };
        Ok(rows)
    }

    async fn count(&self, query: &RecordedQuery) -> StoreResult<i64> {
        self.record(query)?;
        Ok(self.rows_for(query.class_name()).len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::error::connection_failed;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for id in ["a", "b", "c"] {
            store.insert(ParseObject::new("Player").with_object_id(id));
        }
        store.insert(ParseObject::new("Team").with_object_id("t"));
        store
    }

    #[tokio::test(flavor = "current_thread")]
    async fn find_applies_skip_and_limit() {
        let store = seeded();
        let mut query = store.new_query("Player");
        query.set_skip(1).set_limit(1);

        let rows = store.find(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].object_id(), Some("b"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn count_is_scoped_to_class() {
        let store = seeded();
        let query = store.new_query("Player");
        assert_eq!(store.count(&query).await.unwrap(), 3);
        assert_eq!(store.executed_queries(), vec![query]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn primed_failure_is_returned() {
        let store = seeded();
        store.fail_with(connection_failed("offline"));
        let query = store.new_query("Player");
        let err = store.find(&query).await.unwrap_err();
        assert_eq!(err.code.parse_code(), 100);

        store.clear_failure();
        assert!(store.find(&query).await.is_ok());
    }
}
