//! Postgres-backed catalog store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError | Scenario |
//! |------------|----------------------|-----------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate key |
//! | Database (foreign key violation) | `23503` | `Conflict` | Unknown brand/type, or brand/type still referenced |
//! | Database (check constraint violation) | `23514` | `Conflict` | Row breaks a stock/price check |
//! | Database (other) | Any other | `Database` | |
//! | RowNotFound | N/A | `NotFound` | |
//! | Other | N/A | `Database` | Network errors, pool closed, etc. |
//!
//! ## Optimistic Concurrency
//!
//! `update` writes with `WHERE id = $1 AND ($2 IS NULL OR version = $2)` and
//! bumps `version` in the same statement. Zero affected rows means either the
//! row is gone (`NotFound`) or someone else wrote first (`Concurrency`).

use std::sync::Arc;

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{Span, instrument};

use eshop_catalog::CatalogItem;
use eshop_core::{CatalogItemId, ExpectedVersion};

use super::ReferenceTable;
use super::query::{CatalogItemFilter, Page, Pagination};
use super::r#trait::{CatalogItemRepository, ReferenceRepository, RepositoryError};
use crate::mapping::{CatalogItemRow, CatalogItemValues, ReferenceRow, version_param};

const ITEM_SELECT: &str = r#"
    SELECT
        i.id,
        i.name,
        i.description,
        i.price,
        i.picture_file_name,
        i.picture_url,
        i.available_stock,
        i.restock_threshold,
        i.max_stock_threshold,
        i.on_reorder,
        i.catalog_brand_id,
        b.brand AS brand_label,
        i.catalog_type_id,
        t.type AS type_label,
        i.version
    FROM catalog_item i
    JOIN catalog_brand b ON b.id = i.catalog_brand_id
    JOIN catalog_type t ON t.id = i.catalog_type_id
"#;

/// Postgres-backed store for items, brands and types.
///
/// `Send + Sync`; all operations go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn load_item(&self, id: i64) -> Result<Option<CatalogItem>, RepositoryError> {
        let row = sqlx::query(&format!("{ITEM_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_item", e))?;

        row.map(|row| {
            CatalogItemRow::from_row(&row)
                .map_err(|e| RepositoryError::Mapping(format!("failed to read catalog_item row: {e}")))
                .and_then(CatalogItem::try_from)
        })
        .transpose()
    }
}

fn push_item_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CatalogItemFilter) {
    qb.push(" WHERE TRUE");

    if let Some(ids) = &filter.ids {
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        qb.push(" AND i.id = ANY(").push_bind(ids).push(")");
    }
    if let Some(name) = &filter.name {
        qb.push(" AND i.name = ").push_bind(name.clone());
    }
    if let Some(description) = &filter.description {
        qb.push(" AND i.description = ").push_bind(description.clone());
    }
    if let Some(brand) = &filter.brand {
        qb.push(" AND b.brand = ").push_bind(brand.clone());
    }
    if let Some(catalog_type) = &filter.catalog_type {
        qb.push(" AND t.type = ").push_bind(catalog_type.clone());
    }
    if let Some(term) = &filter.term {
        qb.push(" AND (strpos(i.name, ")
            .push_bind(term.clone())
            .push(") > 0 OR strpos(COALESCE(i.description, ''), ")
            .push_bind(term.clone())
            .push(") > 0)");
    }
}

#[async_trait::async_trait]
impl CatalogItemRepository for PostgresCatalogStore {
    #[instrument(skip(self, item), fields(name = %item.name(), item_id = tracing::field::Empty), err)]
    async fn insert(&self, item: CatalogItem) -> Result<CatalogItem, RepositoryError> {
        let values = CatalogItemValues::from(&item);

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO catalog_item (
                name,
                description,
                price,
                picture_file_name,
                picture_url,
                available_stock,
                restock_threshold,
                max_stock_threshold,
                on_reorder,
                catalog_brand_id,
                catalog_type_id,
                version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 1)
            RETURNING id
            "#,
        )
        .bind(&values.name)
        .bind(&values.description)
        .bind(values.price)
        .bind(&values.picture_file_name)
        .bind(&values.picture_url)
        .bind(values.available_stock)
        .bind(values.restock_threshold)
        .bind(values.max_stock_threshold)
        .bind(values.on_reorder)
        .bind(values.catalog_brand_id)
        .bind(values.catalog_type_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;

        Span::current().record("item_id", id);

        self.load_item(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("catalog_item {id} vanished after insert")))
    }

    #[instrument(
        skip(self, item),
        fields(item_id = ?item.id_typed(), expected_version = ?expected),
        err
    )]
    async fn update(
        &self,
        item: CatalogItem,
        expected: ExpectedVersion,
    ) -> Result<CatalogItem, RepositoryError> {
        let id = item
            .id_typed()
            .ok_or_else(|| RepositoryError::NotFound("item has no identifier".to_string()))?
            .as_i64();
        let values = CatalogItemValues::from(&item);

        let updated = sqlx::query(
            r#"
            UPDATE catalog_item SET
                name = $3,
                description = $4,
                price = $5,
                picture_file_name = $6,
                picture_url = $7,
                available_stock = $8,
                restock_threshold = $9,
                max_stock_threshold = $10,
                on_reorder = $11,
                catalog_brand_id = $12,
                catalog_type_id = $13,
                version = version + 1
            WHERE id = $1 AND ($2::bigint IS NULL OR version = $2)
            "#,
        )
        .bind(id)
        .bind(version_param(expected))
        .bind(&values.name)
        .bind(&values.description)
        .bind(values.price)
        .bind(&values.picture_file_name)
        .bind(&values.picture_url)
        .bind(values.available_stock)
        .bind(values.restock_threshold)
        .bind(values.max_stock_threshold)
        .bind(values.on_reorder)
        .bind(values.catalog_brand_id)
        .bind(values.catalog_type_id)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        if updated.rows_affected() == 0 {
            return match self.load_item(id).await? {
                None => Err(RepositoryError::NotFound(format!("catalog_item {id}"))),
                Some(current) => Err(RepositoryError::Concurrency(format!(
                    "catalog_item {id}: expected {expected:?}, found {}",
                    eshop_core::AggregateRoot::version(&current)
                ))),
            };
        }

        self.load_item(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("catalog_item {id}")))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn find_by_id(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, RepositoryError> {
        self.load_item(id.as_i64()).await
    }

    #[instrument(
        skip(self, filter),
        fields(page = pagination.page, size = pagination.size, item_count = tracing::field::Empty),
        err
    )]
    async fn find_all(
        &self,
        filter: &CatalogItemFilter,
        pagination: Pagination,
    ) -> Result<Page<CatalogItem>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*)
            FROM catalog_item i
            JOIN catalog_brand b ON b.id = i.catalog_brand_id
            JOIN catalog_type t ON t.id = i.catalog_type_id
            "#,
        );
        push_item_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_items", e))?;

        let mut select = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        push_item_filters(&mut select, filter);
        select
            .push(" ORDER BY i.id ASC LIMIT ")
            .push_bind(pagination.limit() as i64)
            .push(" OFFSET ")
            .push_bind(pagination.offset() as i64);

        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_items", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let row = CatalogItemRow::from_row(&row)
                .map_err(|e| RepositoryError::Mapping(format!("failed to read catalog_item row: {e}")))?;
            items.push(CatalogItem::try_from(row)?);
        }

        Span::current().record("item_count", items.len());
        Ok(Page::new(items, total.max(0) as u64, pagination))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete(&self, id: CatalogItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog_item WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl<R: ReferenceTable> ReferenceRepository<R> for PostgresCatalogStore {
    #[instrument(skip(self, record), fields(table = R::TABLE), err)]
    async fn insert(&self, record: R) -> Result<R, RepositoryError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1) RETURNING id",
            R::TABLE,
            R::LABEL_COLUMN
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(record.label())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_reference", e))?;

        Ok(record.with_id(R::Id::from(id)))
    }

    #[instrument(skip(self, record), fields(table = R::TABLE, id = ?record.id()), err)]
    async fn update(&self, record: R) -> Result<R, RepositoryError> {
        let id = record
            .id()
            .ok_or_else(|| RepositoryError::NotFound(format!("{} has no identifier", R::KIND)))?;

        let sql = format!(
            "UPDATE {} SET {} = $2 WHERE id = $1",
            R::TABLE,
            R::LABEL_COLUMN
        );
        let key: i64 = id.into();
        let result = sqlx::query(&sql)
            .bind(key)
            .bind(record.label())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_reference", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("{} {id}", R::TABLE)));
        }
        Ok(record)
    }

    #[instrument(skip(self), fields(table = R::TABLE, id = %id), err)]
    async fn find_by_id(&self, id: R::Id) -> Result<Option<R>, RepositoryError> {
        let sql = format!(
            "SELECT id, {} AS label FROM {} WHERE id = $1",
            R::LABEL_COLUMN,
            R::TABLE
        );
        let key: i64 = id.into();
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_reference", e))?;

        row.map(|row| {
            ReferenceRow::from_row(&row)
                .map_err(|e| RepositoryError::Mapping(format!("failed to read {} row: {e}", R::TABLE)))
                .and_then(ReferenceRow::into_domain::<R>)
        })
        .transpose()
    }

    #[instrument(skip(self), fields(table = R::TABLE, page = pagination.page, size = pagination.size), err)]
    async fn find_all(&self, pagination: Pagination) -> Result<Page<R>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", R::TABLE))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_references", e))?;

        let sql = format!(
            "SELECT id, {} AS label FROM {} ORDER BY id ASC LIMIT $1 OFFSET $2",
            R::LABEL_COLUMN,
            R::TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_references", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let row = ReferenceRow::from_row(&row)
                .map_err(|e| RepositoryError::Mapping(format!("failed to read {} row: {e}", R::TABLE)))?;
            records.push(row.into_domain::<R>()?);
        }

        Ok(Page::new(records, total.max(0) as u64, pagination))
    }

    #[instrument(skip(self), fields(table = R::TABLE, id = %id), err)]
    async fn delete(&self, id: R::Id) -> Result<bool, RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", R::TABLE);
        let key: i64 = id.into();
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reference", e))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Map SQLx errors to RepositoryError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => RepositoryError::Conflict(msg),
                // Foreign key violation: unknown or still-referenced brand/type
                Some("23503") => RepositoryError::Conflict(msg),
                // Check constraint violation
                Some("23514") => RepositoryError::Conflict(msg),
                _ => RepositoryError::Database(msg),
            }
        }
        sqlx::Error::RowNotFound => {
            RepositoryError::NotFound(format!("unexpected row not found in {}", operation))
        }
        sqlx::Error::PoolClosed => {
            RepositoryError::Database(format!("connection pool closed in {}", operation))
        }
        _ => RepositoryError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
