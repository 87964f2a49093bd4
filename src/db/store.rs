use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::migrator::{SchemaMigrator, SchemaReport};
use super::schema::{self, quote_ident};
use crate::error::VirtcolError;
use crate::model::{
    CONTAINER_COLUMN, CREATED_AT, Container, FieldDeclaration, ModelType, PRIMARY_KEY, Record,
    UPDATED_AT, Value, ValueType,
};
use crate::utils::logging::with_pretty_json_debug;

/// Record persistence and additive migrations over one SQLite pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Column names currently present in `table`; empty if the table does not exist.
    pub async fn columns(&self, table: &str) -> Result<HashSet<String>, VirtcolError> {
        let names = sqlx::query_scalar::<_, String>(schema::TABLE_COLUMNS)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().collect())
    }

    /// Creates a record from an untrusted JSON object.
    ///
    /// Assignment is validated in full before anything is written; a rejected map
    /// leaves the table untouched.
    pub async fn create(
        &self,
        model: &Arc<ModelType>,
        attrs: &serde_json::Value,
    ) -> Result<Record, VirtcolError> {
        let mut record = Record::new(Arc::clone(model));
        record.assign(attrs)?;
        self.insert(&mut record).await?;
        Ok(record)
    }

    /// Inserts new records, updates persisted ones. Bumps `updated_at` either way.
    pub async fn save(&self, record: &mut Record) -> Result<(), VirtcolError> {
        match record.id() {
            None => self.insert(record).await,
            Some(id) => self.update(record, id).await,
        }
    }

    // `SELECT *` widens after `ADD COLUMN`, so these statements are not cached.
    pub async fn find(
        &self,
        model: &Arc<ModelType>,
        id: i64,
    ) -> Result<Option<Record>, VirtcolError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            quote_ident(model.table()),
            quote_ident(PRIMARY_KEY)
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_row(model, &row)).transpose()
    }

    pub async fn all(&self, model: &Arc<ModelType>) -> Result<Vec<Record>, VirtcolError> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY {}",
            quote_ident(model.table()),
            quote_ident(PRIMARY_KEY)
        );
        let rows = sqlx::query(&sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| decode_row(model, row)).collect()
    }

    pub async fn count(&self, model: &ModelType) -> Result<i64, VirtcolError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(model.table()));
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// The container cell exactly as stored.
    pub async fn raw_container(
        &self,
        model: &ModelType,
        id: i64,
    ) -> Result<Option<String>, VirtcolError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            quote_ident(CONTAINER_COLUMN),
            quote_ident(model.table()),
            quote_ident(PRIMARY_KEY)
        );
        let cell = sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cell.flatten())
    }

    async fn insert(&self, record: &mut Record) -> Result<(), VirtcolError> {
        record.touch(Utc::now());
        let model = Arc::clone(record.model());
        let columns: Vec<&FieldDeclaration> = model.columns().collect();

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("INSERT INTO {} (", quote_ident(model.table())));
        for (i, field) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(quote_ident(&field.name));
        }
        qb.push(") VALUES (");
        for (i, field) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            bind_value(&mut qb, record.persisted_value(field)?);
        }
        qb.push(") RETURNING ");
        qb.push(quote_ident(PRIMARY_KEY));

        let id: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        record.set_id(id);

        debug!(model = model.name(), id, "record inserted");
        with_pretty_json_debug(record.container().as_map(), |json| {
            debug!(model = model.name(), id, "container:\n{json}");
        });
        Ok(())
    }

    async fn update(&self, record: &mut Record, id: i64) -> Result<(), VirtcolError> {
        record.touch(Utc::now());
        let model = Arc::clone(record.model());

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("UPDATE {} SET ", quote_ident(model.table())));
        for (i, field) in model.columns().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(quote_ident(&field.name));
            qb.push(" = ");
            bind_value(&mut qb, record.persisted_value(field)?);
        }
        qb.push(" WHERE ");
        qb.push(quote_ident(PRIMARY_KEY));
        qb.push(" = ");
        qb.push_bind(id);

        let affected = qb.build().execute(&self.pool).await?.rows_affected();
        debug!(model = model.name(), id, affected, "record updated");

        if affected == 0 {
            return Err(VirtcolError::RecordNotFound {
                model: model.name().to_string(),
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaMigrator for Store {
    async fn apply_schema(&self, model: &ModelType) -> Result<SchemaReport, VirtcolError> {
        let table = model.table();
        let existing = self.columns(table).await?;
        let mut report = SchemaReport::default();

        if existing.is_empty() {
            sqlx::query(&schema::create_table(table))
                .execute(&self.pool)
                .await?;
            info!(model = model.name(), table, "table created");
            report.created_table = true;
        }

        for field in model.columns() {
            if existing.contains(&field.name) {
                continue;
            }
            sqlx::query(&schema::add_column(table, field))
                .execute(&self.pool)
                .await?;
            info!(
                model = model.name(),
                table,
                column = %field.name,
                ty = %field.ty,
                "column added"
            );
            report.added_columns.push(field.name.clone());
        }

        Ok(report)
    }
}

fn bind_value(qb: &mut QueryBuilder<'_, Sqlite>, value: Value) {
    match value {
        Value::Null => {
            qb.push_bind(None::<String>);
        }
        Value::String(s) => {
            qb.push_bind(s);
        }
        Value::Integer(i) => {
            qb.push_bind(i);
        }
        Value::Float(f) => {
            qb.push_bind(f);
        }
        Value::Boolean(b) => {
            qb.push_bind(b);
        }
        Value::Date(d) => {
            qb.push_bind(d);
        }
        Value::DateTime(dt) => {
            qb.push_bind(dt);
        }
        kv @ Value::KeyValue(_) => {
            qb.push_bind(kv.encode());
        }
    }
}

fn decode_row(model: &Arc<ModelType>, row: &SqliteRow) -> Result<Record, VirtcolError> {
    let id: i64 = row.try_get(PRIMARY_KEY)?;
    let mut columns = BTreeMap::new();
    let mut container = Container::new();
    let mut created_at = None;
    let mut updated_at = None;

    for field in model.columns() {
        match field.name.as_str() {
            CONTAINER_COLUMN => {
                let raw: Option<String> = row.try_get(CONTAINER_COLUMN)?;
                container = Container::decode(raw.as_deref())?;
            }
            CREATED_AT => created_at = row.try_get(CREATED_AT)?,
            UPDATED_AT => updated_at = row.try_get(UPDATED_AT)?,
            name => {
                columns.insert(name.to_string(), decode_cell(row, field)?);
            }
        }
    }

    Ok(Record::hydrate(
        Arc::clone(model),
        id,
        columns,
        container,
        created_at,
        updated_at,
    ))
}

fn decode_cell(row: &SqliteRow, field: &FieldDeclaration) -> Result<Value, VirtcolError> {
    let name = field.name.as_str();
    let value = match field.ty {
        ValueType::String | ValueType::Text | ValueType::KeyValue => {
            row.try_get::<Option<String>, _>(name)?.into()
        }
        ValueType::Integer => row.try_get::<Option<i64>, _>(name)?.into(),
        ValueType::Float => row.try_get::<Option<f64>, _>(name)?.into(),
        ValueType::Boolean => row.try_get::<Option<bool>, _>(name)?.into(),
        ValueType::Date => row.try_get::<Option<NaiveDate>, _>(name)?.into(),
        ValueType::DateTime => row.try_get::<Option<DateTime<Utc>>, _>(name)?.into(),
    };
    Ok(value)
}
