use std::path::PathBuf;
use std::sync::Arc;

use models::store;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::{fs, sync::{Mutex, MutexGuard}};
use tracing::{info, warn};

use crate::errors::ServiceError;

/// Rewrites a legacy `<collection>.json` document array into the current shape.
pub type LegacyImporter = fn(&str, Value) -> Result<Value, ServiceError>;

/// JSON arrays keyed by collection name, stored in one `store` table.
///
/// Every read-modify-write cycle runs inside a [`CollectionSession`], which holds
/// the store-wide lock until it is committed or dropped.
#[derive(Clone)]
pub struct CollectionStore {
    db: DatabaseConnection,
    legacy_dir: Option<PathBuf>,
    importer: LegacyImporter,
    lock: Arc<Mutex<()>>,
}

impl CollectionStore {
    /// Ensure the `store` table exists.
    pub async fn open(db: DatabaseConnection, legacy_dir: Option<PathBuf>, importer: LegacyImporter) -> Result<Self, ServiceError> {
        store::ensure_table(&db).await?;
        Ok(Self { db, legacy_dir, importer, lock: Arc::new(Mutex::new(())) })
    }

    /// Take the store lock. Writes are staged on the session and land on `commit`.
    pub async fn session(&self) -> CollectionSession<'_> {
        let guard = self.lock.lock().await;
        CollectionSession { store: self, _guard: guard, staged: Vec::new() }
    }

    async fn read_row(&self, collection: &str) -> Result<Option<String>, ServiceError> {
        Ok(store::Entity::find_by_id(collection.to_string())
            .one(&self.db)
            .await?
            .map(|row| row.data))
    }

    async fn import_legacy(&self, collection: &str) -> Result<Option<String>, ServiceError> {
        let Some(dir) = &self.legacy_dir else { return Ok(None) };
        let path = dir.join(format!("{}.json", collection));
        let raw = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ServiceError::Storage(format!("{}: {}", path.display(), e))),
        };
        let legacy: Value = serde_json::from_slice(&raw)
            .map_err(|e| ServiceError::Storage(format!("legacy {}: {}", path.display(), e)))?;
        let converted = (self.importer)(collection, legacy)?;
        let data = serde_json::to_string(&converted)?;
        upsert(&self.db, collection, data.clone()).await?;
        info!(%collection, path = %path.display(), "imported legacy json collection");
        Ok(Some(data))
    }
}

async fn upsert<C: sea_orm::ConnectionTrait>(db: &C, collection: &str, data: String) -> Result<(), ServiceError> {
    let row = store::ActiveModel { collection: Set(collection.to_string()), data: Set(data) };
    store::Entity::insert(row)
        .on_conflict(
            OnConflict::column(store::Column::Collection)
                .update_column(store::Column::Data)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Exclusive access to the store for one operation.
pub struct CollectionSession<'a> {
    store: &'a CollectionStore,
    _guard: MutexGuard<'a, ()>,
    staged: Vec<(String, String)>,
}

impl CollectionSession<'_> {
    /// Read a collection. Missing rows fall back to the legacy JSON file, then to empty.
    pub async fn load<T: DeserializeOwned>(&mut self, collection: &str) -> Result<Vec<T>, ServiceError> {
        let data = match self.store.read_row(collection).await? {
            Some(data) => data,
            None => match self.store.import_legacy(collection).await? {
                Some(data) => data,
                None => return Ok(Vec::new()),
            },
        };
        serde_json::from_str(&data).map_err(|e| {
            warn!(%collection, error = %e, "stored collection is corrupt");
            ServiceError::Storage(format!("collection {} is corrupt: {}", collection, e))
        })
    }

    /// Queue a full replacement of `collection`.
    pub fn stage<T: Serialize>(&mut self, collection: &str, items: &[T]) -> Result<(), ServiceError> {
        let data = serde_json::to_string(items)?;
        self.staged.retain(|(c, _)| c != collection);
        self.staged.push((collection.to_string(), data));
        Ok(())
    }

    /// Write every staged collection in one transaction.
    pub async fn commit(self) -> Result<(), ServiceError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let txn = self.store.db.begin().await?;
        for (collection, data) in self.staged {
            upsert(&txn, &collection, data).await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        name: String,
    }

    fn identity(_: &str, v: Value) -> Result<Value, ServiceError> {
        Ok(v)
    }

    async fn open(legacy_dir: Option<PathBuf>) -> CollectionStore {
        let db = models::db::connect_memory().await.unwrap();
        CollectionStore::open(db, legacy_dir, identity).await.unwrap()
    }

    #[tokio::test]
    async fn missing_collection_is_empty() {
        let store = open(None).await;
        let mut s = store.session().await;
        let items: Vec<Item> = s.load("items").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn staged_writes_land_together_on_commit() {
        let store = open(None).await;
        let mut s = store.session().await;
        s.stage("a", &[Item { id: 1, name: "one".into() }]).unwrap();
        s.stage("b", &[Item { id: 2, name: "two".into() }]).unwrap();
        s.stage("a", &[Item { id: 3, name: "three".into() }]).unwrap();
        s.commit().await.unwrap();

        let mut s = store.session().await;
        let a: Vec<Item> = s.load("a").await.unwrap();
        let b: Vec<Item> = s.load("b").await.unwrap();
        assert_eq!(a, vec![Item { id: 3, name: "three".into() }]);
        assert_eq!(b.len(), 1);
    }

    #[tokio::test]
    async fn dropped_session_discards_staged_writes() {
        let store = open(None).await;
        {
            let mut s = store.session().await;
            s.stage("a", &[Item { id: 1, name: "one".into() }]).unwrap();
        }
        let mut s = store.session().await;
        let a: Vec<Item> = s.load("a").await.unwrap();
        assert!(a.is_empty());
    }

    #[tokio::test]
    async fn legacy_file_is_imported_once() {
        let dir = std::env::temp_dir().join(format!("collection_store_{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("items.json"), r#"[{"id":7,"name":"legacy"}]"#).await.unwrap();

        let store = open(Some(dir.clone())).await;
        let mut s = store.session().await;
        let items: Vec<Item> = s.load("items").await.unwrap();
        assert_eq!(items, vec![Item { id: 7, name: "legacy".into() }]);
        drop(s);

        // 导入后以表内数据为准
        tokio::fs::remove_file(dir.join("items.json")).await.unwrap();
        let mut s = store.session().await;
        let again: Vec<Item> = s.load("items").await.unwrap();
        assert_eq!(again.len(), 1);
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn corrupt_collection_is_an_error() {
        let store = open(None).await;
        upsert(&store.db, "items", "{not json".into()).await.unwrap();
        let mut s = store.session().await;
        let res: Result<Vec<Item>, _> = s.load("items").await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
    }

    #[tokio::test]
    async fn sessions_serialize_read_modify_write() {
        let store = open(None).await;
        let mut handles = Vec::new();
        for n in 0..10u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut s = store.session().await;
                let mut items: Vec<Item> = s.load("counter").await.unwrap();
                items.push(Item { id: n, name: n.to_string() });
                s.stage("counter", &items).unwrap();
                s.commit().await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let mut s = store.session().await;
        let items: Vec<Item> = s.load("counter").await.unwrap();
        assert_eq!(items.len(), 10);
    }
}
