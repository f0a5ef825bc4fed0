use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use eshop_catalog::{CatalogBrand, CatalogItem, CatalogType};
use eshop_core::{AggregateRoot, CatalogItemId, Entity, ExpectedVersion};

use super::ReferenceTable;
use super::query::{CatalogItemFilter, Page, Pagination};
use super::r#trait::{CatalogItemRepository, ReferenceRepository, RepositoryError};

#[derive(Debug, Default)]
struct LabelTable {
    rows: BTreeMap<i64, String>,
    last_id: i64,
}

#[derive(Debug, Default)]
struct State {
    items: BTreeMap<i64, CatalogItem>,
    last_item_id: i64,
    references: HashMap<&'static str, LabelTable>,
}

impl State {
    fn table<R: ReferenceTable>(&self) -> Option<&LabelTable> {
        self.references.get(R::TABLE)
    }

    fn table_mut<R: ReferenceTable>(&mut self) -> &mut LabelTable {
        self.references.entry(R::TABLE).or_default()
    }

    fn reference<R: ReferenceTable>(&self, id: R::Id) -> Result<Option<R>, RepositoryError> {
        let key: i64 = id.into();
        let Some(label) = self.table::<R>().and_then(|t| t.rows.get(&key)) else {
            return Ok(None);
        };
        R::from_parts(Some(id), Some(label.clone()))
            .map(Some)
            .map_err(|e| RepositoryError::Mapping(e.to_string()))
    }

    fn require_reference<R: ReferenceTable>(&self, id: R::Id) -> Result<R, RepositoryError> {
        self.reference::<R>(id)?.ok_or_else(|| {
            RepositoryError::Conflict(format!("{} {} does not exist", R::TABLE, id))
        })
    }

    /// Join: copy the current brand/type labels onto the item.
    fn resolve(&self, mut item: CatalogItem) -> Result<CatalogItem, RepositoryError> {
        let brand: CatalogBrand = self.require_reference(item.catalog_brand().id)?;
        let catalog_type: CatalogType = self.require_reference(item.catalog_type().id)?;
        item.resolve_brand(&brand)
            .map_err(|e| RepositoryError::Mapping(e.to_string()))?;
        item.resolve_type(&catalog_type)
            .map_err(|e| RepositoryError::Mapping(e.to_string()))?;
        Ok(item)
    }
}

/// In-memory catalog store (items, brands and types behind one lock).
///
/// Intended for tests/dev. Mirrors the relational store's rules: ids come
/// from per-table sequences, items must point at existing brands/types, and
/// referenced brands/types cannot be deleted.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<State>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RepositoryError> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Database("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RepositoryError> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Database("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CatalogItemRepository for InMemoryCatalogStore {
    async fn insert(&self, item: CatalogItem) -> Result<CatalogItem, RepositoryError> {
        let mut state = self.write()?;

        state.last_item_id += 1;
        let id = CatalogItemId::from_i64(state.last_item_id);
        let stored = state.resolve(item.into_persisted(id, 1))?;

        state.items.insert(id.as_i64(), stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        item: CatalogItem,
        expected: ExpectedVersion,
    ) -> Result<CatalogItem, RepositoryError> {
        let id = item
            .id_typed()
            .ok_or_else(|| RepositoryError::NotFound("item has no identifier".to_string()))?;

        let mut state = self.write()?;
        let current = state
            .items
            .get(&id.as_i64())
            .map(|existing| existing.version())
            .ok_or_else(|| RepositoryError::NotFound(format!("catalog_item {id}")))?;

        if !expected.matches(current) {
            return Err(RepositoryError::Concurrency(format!(
                "catalog_item {id}: expected {expected:?}, found {current}"
            )));
        }

        let stored = state.resolve(item.into_persisted(id, current + 1))?;
        state.items.insert(id.as_i64(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, RepositoryError> {
        let state = self.read()?;
        state
            .items
            .get(&id.as_i64())
            .cloned()
            .map(|item| state.resolve(item))
            .transpose()
    }

    async fn find_all(
        &self,
        filter: &CatalogItemFilter,
        pagination: Pagination,
    ) -> Result<Page<CatalogItem>, RepositoryError> {
        let state = self.read()?;

        let mut matching = Vec::new();
        for item in state.items.values() {
            let item = state.resolve(item.clone())?;
            if filter.matches(&item) {
                matching.push(item);
            }
        }

        Ok(Page::from_sorted(matching, pagination))
    }

    async fn delete(&self, id: CatalogItemId) -> Result<bool, RepositoryError> {
        let mut state = self.write()?;
        Ok(state.items.remove(&id.as_i64()).is_some())
    }
}

#[async_trait::async_trait]
impl<R: ReferenceTable> ReferenceRepository<R> for InMemoryCatalogStore {
    async fn insert(&self, record: R) -> Result<R, RepositoryError> {
        let mut state = self.write()?;
        let table = state.table_mut::<R>();

        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(id, record.label().to_string());

        Ok(record.with_id(R::Id::from(id)))
    }

    async fn update(&self, record: R) -> Result<R, RepositoryError> {
        let id = record
            .id()
            .ok_or_else(|| RepositoryError::NotFound(format!("{} has no identifier", R::KIND)))?;

        let key: i64 = id.into();
        let mut state = self.write()?;
        let row = state
            .table_mut::<R>()
            .rows
            .get_mut(&key)
            .ok_or_else(|| RepositoryError::NotFound(format!("{} {id}", R::TABLE)))?;

        *row = record.label().to_string();
        Ok(record)
    }

    async fn find_by_id(&self, id: R::Id) -> Result<Option<R>, RepositoryError> {
        self.read()?.reference::<R>(id)
    }

    async fn find_all(&self, pagination: Pagination) -> Result<Page<R>, RepositoryError> {
        let state = self.read()?;
        let ids: Vec<i64> = state
            .table::<R>()
            .map(|t| t.rows.keys().copied().collect())
            .unwrap_or_default();

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = state.reference::<R>(R::Id::from(id))? {
                records.push(record);
            }
        }

        Ok(Page::from_sorted(records, pagination))
    }

    async fn delete(&self, id: R::Id) -> Result<bool, RepositoryError> {
        let mut state = self.write()?;

        if state.items.values().any(|item| R::referenced_by(item) == id) {
            return Err(RepositoryError::Conflict(format!(
                "{} {id} is still referenced by catalog items",
                R::TABLE
            )));
        }

        let key: i64 = id.into();
        Ok(state.table_mut::<R>().rows.remove(&key).is_some())
    }
}
