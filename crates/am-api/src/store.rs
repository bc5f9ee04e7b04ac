use std::future::Future;

use am_common::{
    db::{self, PgStore},
    store::{InMemoryStore, MatchStore, ProfileSource, ProfileWriter},
};

/// Everything the HTTP layer needs from a backing store.
pub trait AppStore: ProfileSource + ProfileWriter + MatchStore + 'static {
    /// Cheap connectivity probe for `/readyz`.
    fn ping(&self) -> impl Future<Output = Result<(), String>> + Send;
}

impl AppStore for PgStore {
    async fn ping(&self) -> Result<(), String> {
        db::ping(self.pool()).await.map_err(|err| err.to_string())
    }
}

impl AppStore for InMemoryStore {
    async fn ping(&self) -> Result<(), String> {
        Ok(())
    }
}
