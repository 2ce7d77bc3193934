//! Shared test records and helpers.
#![allow(dead_code)]

use bson::doc;
use serde::{Deserialize, Serialize};

use docbase::error::StoreResult;
use docbase::identifiable::IdentifiablePersistence;
use docbase::memory::MemoryConnection;
use docbase::page::{DataPage, PagingParams};
use docbase::record::Identifiable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dummy {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    pub content: String,
}

impl Dummy {
    pub fn new(key: &str, content: &str) -> Self {
        Self {
            id: None,
            key: key.to_string(),
            content: content.to_string(),
        }
    }

    pub fn with_id(id: &str, key: &str, content: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::new(key, content)
        }
    }
}

impl Identifiable for Dummy {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

pub type DummyStore = IdentifiablePersistence<MemoryConnection, Dummy>;

/// An opened identifiable store over the in-memory backend.
pub async fn open_dummies() -> DummyStore {
    let mut store = DummyStore::new("dummies");
    store.open(None).await.unwrap();
    store
}

/// A concrete store the way applications write them: typed filter methods
/// layered over the identifiable persistence component.
pub struct DummyPersistence {
    store: DummyStore,
}

impl DummyPersistence {
    pub fn new() -> Self {
        Self {
            store: DummyStore::new("dummies"),
        }
    }

    pub async fn open(&mut self) -> StoreResult<()> {
        self.store.open(None).await
    }

    pub async fn close(&mut self) -> StoreResult<()> {
        self.store.close(None).await
    }

    pub async fn create(&self, item: &Dummy) -> StoreResult<Dummy> {
        self.store.create(None, item).await
    }

    pub async fn get_page_by_key(
        &self,
        key: &str,
        paging: Option<PagingParams>,
    ) -> StoreResult<DataPage<Dummy>> {
        self.store
            .get_page_by_filter(
                None,
                doc! { "key": key },
                paging,
                Some(doc! { "content": 1 }),
                None,
            )
            .await
    }
}
