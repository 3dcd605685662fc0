//! Postgres-backed [`Repository`].
//!
//! Filters, ordering and `LIKE` run in SQL. Whether a table carries the
//! `deleted` column is read from `information_schema.columns`, so the same
//! record type works against tables with and without it.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |---|---|
//! | Database, code `23505` | `Duplicate` (unique column of the row) |
//! | anything else | `Backend` |
//!
//! The [`Repository`] trait is synchronous. [`PgStore`] owns a current-thread
//! runtime and blocks on it, so it must not be called from inside an async
//! task.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tokio::runtime::Runtime;
use uuid::Uuid;

use adminkit_core::DeleteStatus;

use super::query::{Filter, FilterOp, OrderBy, SortDirection};
use super::repository::Repository;
use crate::error::StoreError;
use crate::records::{PermissionRecord, Record, RoleRecord, UserRecord};

/// Schema for the users, roles and permissions tables plus their pivots.
pub const SCHEMA_SQL: &str = include_str!("../../migrations/0001_rbac.sql");

const DELETED: &str = "deleted";

/// SQL type of a column, used to bind filter values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    Timestamp,
    SmallInt,
}

/// A value bound into a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Uuid),
    Text(Option<String>),
    Timestamp(DateTime<Utc>),
    SmallInt(Option<i16>),
}

impl SqlValue {
    /// Convert a filter value for a column of type `ty`.
    pub fn from_json(column: &str, ty: ColumnType, value: &Value) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidQuery(format!("cannot compare {column} with {value}"));
        match (ty, value) {
            (ColumnType::Uuid, Value::String(s)) => Uuid::parse_str(s).map(SqlValue::Uuid).map_err(|_| invalid()),
            (ColumnType::Text, Value::Null) => Ok(SqlValue::Text(None)),
            (ColumnType::Text, Value::String(s)) => Ok(SqlValue::Text(Some(s.clone()))),
            (ColumnType::Text, Value::Number(n)) => Ok(SqlValue::Text(Some(n.to_string()))),
            (ColumnType::Text, Value::Bool(b)) => Ok(SqlValue::Text(Some(b.to_string()))),
            (ColumnType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|at| SqlValue::Timestamp(at.with_timezone(&Utc)))
                .map_err(|_| invalid()),
            (ColumnType::SmallInt, Value::Null) => Ok(SqlValue::SmallInt(None)),
            (ColumnType::SmallInt, Value::Number(n)) => n
                .as_i64()
                .and_then(|n| i16::try_from(n).ok())
                .map(|n| SqlValue::SmallInt(Some(n)))
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, SqlValue::Text(None) | SqlValue::SmallInt(None))
    }
}

/// A record type with a Postgres table.
pub trait PgRecord: Record + Sized {
    /// Written columns with their types, `id` first. `deleted` is not listed;
    /// it is written only when the table has it.
    const COLUMNS: &'static [(&'static str, ColumnType)];

    /// Columns that are stored but can never be filtered or ordered on.
    const WRITE_ONLY: &'static [&'static str] = &[];

    fn id_uuid(id: &Self::Id) -> Uuid;

    /// Values for [`Self::COLUMNS`], in the same order.
    fn values(&self) -> Vec<SqlValue>;

    fn decode(row: &PgRow) -> Result<Self, sqlx::Error>;
}

fn column_type<T: PgRecord>(column: &str) -> Result<ColumnType, StoreError> {
    if column == DELETED {
        return Ok(ColumnType::SmallInt);
    }
    T::COLUMNS
        .iter()
        .find(|(name, _)| *name == column && !T::WRITE_ONLY.contains(name))
        .map(|(_, ty)| *ty)
        .ok_or_else(|| StoreError::InvalidQuery(format!("unknown column '{column}' on {}", T::TABLE)))
}

fn ident(name: &str) -> String {
    format!("\"{name}\"")
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Uuid(v) => qb.push_bind(v),
        SqlValue::Text(v) => qb.push_bind(v),
        SqlValue::Timestamp(v) => qb.push_bind(v),
        SqlValue::SmallInt(v) => qb.push_bind(v),
    };
}

/// Append ` WHERE ...` for `filters`. Semantics match the in-memory store:
/// `LIKE` ignores case, `!=` treats NULL as a value, and NULL never satisfies
/// an ordering comparison.
fn push_where<T: PgRecord>(qb: &mut QueryBuilder<'static, Postgres>, filters: &[Filter]) -> Result<(), StoreError> {
    for (i, filter) in filters.iter().enumerate() {
        let ty = column_type::<T>(&filter.column)?;
        let column = ident(&filter.column);
        qb.push(if i == 0 { " WHERE " } else { " AND " });

        if filter.op == FilterOp::Like {
            match &filter.value {
                Value::String(pattern) => {
                    qb.push(format!("{column}::text ILIKE "));
                    qb.push_bind(pattern.clone());
                }
                _ => {
                    qb.push("FALSE");
                }
            }
            continue;
        }

        let value = SqlValue::from_json(&filter.column, ty, &filter.value)?;
        match filter.op {
            FilterOp::Eq if value.is_null() => {
                qb.push(format!("{column} IS NULL"));
            }
            FilterOp::Ne if value.is_null() => {
                qb.push(format!("{column} IS NOT NULL"));
            }
            FilterOp::Eq => {
                qb.push(format!("{column} = "));
                push_value(qb, value);
            }
            FilterOp::Ne => {
                qb.push(format!("{column} IS DISTINCT FROM "));
                push_value(qb, value);
            }
            _ if value.is_null() => {
                qb.push("FALSE");
            }
            op => {
                let sql_op = match op {
                    FilterOp::Gt => ">",
                    FilterOp::Gte => ">=",
                    FilterOp::Lt => "<",
                    _ => "<=",
                };
                qb.push(format!("{column} {sql_op} "));
                push_value(qb, value);
            }
        }
    }
    Ok(())
}

fn select_query<T: PgRecord>(
    filters: &[Filter],
    order: &OrderBy,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    column_type::<T>(&order.column)?;
    let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", ident(T::TABLE)));
    push_where::<T>(&mut qb, filters)?;
    let direction = match order.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    qb.push(format!(" ORDER BY {} {direction}", ident(&order.column)));
    Ok(qb)
}

fn count_query<T: PgRecord>(filters: &[Filter]) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) AS total FROM {}", ident(T::TABLE)));
    push_where::<T>(&mut qb, filters)?;
    Ok(qb)
}

fn insert_query<T: PgRecord>(row: &T, deleted: Option<DeleteStatus>) -> QueryBuilder<'static, Postgres> {
    let mut columns: Vec<String> = T::COLUMNS.iter().map(|(name, _)| ident(name)).collect();
    if deleted.is_some() {
        columns.push(ident(DELETED));
    }
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        ident(T::TABLE),
        columns.join(", ")
    ));
    for (i, value) in row.values().into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    if let Some(status) = deleted {
        qb.push(", ");
        qb.push_bind(i16::from(status.code()));
    }
    qb.push(") RETURNING *");
    qb
}

fn update_query<T: PgRecord>(row: &T, deleted: Option<DeleteStatus>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", ident(T::TABLE)));
    let mut first = true;
    for ((name, _), value) in T::COLUMNS.iter().zip(row.values()).skip(1) {
        if !first {
            qb.push(", ");
        }
        first = false;
        qb.push(format!("{} = ", ident(name)));
        push_value(&mut qb, value);
    }
    if let Some(status) = deleted {
        qb.push(format!(", {} = ", ident(DELETED)));
        qb.push_bind(i16::from(status.code()));
    }
    qb.push(" WHERE \"id\" = ");
    qb.push_bind(T::id_uuid(row.id()));
    qb.push(" RETURNING *");
    qb
}

fn by_id_query<T: PgRecord>(prefix: &str, id: &T::Id) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("{prefix} {} WHERE \"id\" = ", ident(T::TABLE)));
    qb.push_bind(T::id_uuid(id));
    qb
}

fn references_deleted(filters: &[Filter], order: &OrderBy) -> bool {
    order.column == DELETED || filters.iter().any(|f| f.column == DELETED)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().is_some_and(|code| code == "23505");
    }
    false
}

fn duplicate_of<T: PgRecord>(row: &T) -> StoreError {
    let (column, value) = row.unique_value().unwrap_or(("id", ""));
    let value = if value.is_empty() { row.id().to_string() } else { value.to_string() };
    StoreError::Duplicate {
        table: T::TABLE,
        column,
        value,
    }
}

/// Postgres store for every [`PgRecord`] type.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    runtime: Arc<Runtime>,
}

impl PgStore {
    /// Open a pool against `database_url`.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Backend(format!("failed to start runtime: {e}")))?;
        let pool = runtime
            .block_on(PgPoolOptions::new().max_connections(5).connect(database_url))
            .map_err(|e| map_sqlx_error("connect", e))?;
        tracing::debug!("postgres pool ready");
        Ok(Self {
            pool,
            runtime: Arc::new(runtime),
        })
    }

    /// Create the tables if they do not exist yet.
    pub fn migrate(&self) -> Result<(), StoreError> {
        self.block_on("migrate", async {
            sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await.map(|_| ())
        })
    }

    /// Whether `table` has a `deleted` column in the current schema.
    pub fn table_has_column(&self, table: &str, column: &str) -> Result<bool, StoreError> {
        self.block_on("table_has_column", async {
            let row = sqlx::query(
                r#"
                SELECT EXISTS (
                    SELECT 1
                    FROM information_schema.columns
                    WHERE table_schema = current_schema()
                        AND table_name = $1
                        AND column_name = $2
                ) AS present
                "#,
            )
            .bind(table)
            .bind(column)
            .fetch_one(&self.pool)
            .await?;
            row.try_get::<bool, _>("present")
        })
    }

    fn block_on<R>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<R, sqlx::Error>>,
    ) -> Result<R, StoreError> {
        self.runtime.block_on(fut).map_err(|e| map_sqlx_error(operation, e))
    }

    fn fetch_one_row<T: PgRecord>(
        &self,
        operation: &'static str,
        mut qb: QueryBuilder<'static, Postgres>,
    ) -> Result<Option<T>, StoreError> {
        self.block_on(operation, async {
            let row = qb.build().fetch_optional(&self.pool).await?;
            row.as_ref().map(T::decode).transpose()
        })
    }

    fn write<T: PgRecord>(
        &self,
        operation: &'static str,
        row: &T,
        mut qb: QueryBuilder<'static, Postgres>,
    ) -> Result<Option<T>, StoreError> {
        let result = self.runtime.block_on(async {
            let stored = qb.build().fetch_optional(&self.pool).await?;
            stored.as_ref().map(T::decode).transpose()
        });
        result.map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_of(row)
            } else {
                map_sqlx_error(operation, e)
            }
        })
    }

    /// The marker a written row carries: present exactly when the table has
    /// the column.
    fn marker_for<T: PgRecord>(&self, row: &T) -> Result<Option<DeleteStatus>, StoreError> {
        let soft = Repository::<T>::has_soft_delete_column(self)?;
        Ok(soft.then(|| row.deleted().unwrap_or(DeleteStatus::NotDeleted)))
    }

    fn check_marker_refs<T: PgRecord>(&self, filters: &[Filter], order: &OrderBy) -> Result<(), StoreError> {
        if references_deleted(filters, order) && !Repository::<T>::has_soft_delete_column(self)? {
            return Err(StoreError::InvalidQuery(format!("unknown column 'deleted' on {}", T::TABLE)));
        }
        Ok(())
    }

    fn missing<T: PgRecord>(id: &T::Id) -> StoreError {
        StoreError::Missing {
            table: T::TABLE,
            id: id.to_string(),
        }
    }
}

impl<T: PgRecord> Repository<T> for PgStore {
    fn find(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        self.fetch_one_row("find", by_id_query::<T>("SELECT * FROM", id))
    }

    fn list(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<T>, StoreError> {
        self.check_marker_refs::<T>(filters, order)?;
        let mut qb = select_query::<T>(filters, order)?;
        self.block_on("list", async {
            let rows = qb.build().fetch_all(&self.pool).await?;
            rows.iter().map(T::decode).collect::<Result<Vec<T>, _>>()
        })
    }

    fn count(&self, filters: &[Filter]) -> Result<usize, StoreError> {
        self.check_marker_refs::<T>(filters, &OrderBy::default())?;
        let mut qb = count_query::<T>(filters)?;
        let total = self.block_on("count", async {
            let row = qb.build().fetch_one(&self.pool).await?;
            row.try_get::<i64, _>("total")
        })?;
        usize::try_from(total).map_err(|e| StoreError::Backend(format!("row count {total}: {e}")))
    }

    fn insert(&self, row: T) -> Result<T, StoreError> {
        let qb = insert_query(&row, self.marker_for(&row)?);
        self.write("insert", &row, qb)?
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned no row", T::TABLE)))
    }

    fn update(&self, row: T) -> Result<T, StoreError> {
        let qb = update_query(&row, self.marker_for(&row)?);
        self.write("update", &row, qb)?
            .ok_or_else(|| Self::missing::<T>(row.id()))
    }

    fn remove(&self, id: &T::Id) -> Result<T, StoreError> {
        let mut qb = by_id_query::<T>("DELETE FROM", id);
        qb.push(" RETURNING *");
        self.fetch_one_row("remove", qb)?
            .ok_or_else(|| Self::missing::<T>(id))
    }

    fn mark_deleted(&self, id: &T::Id, status: DeleteStatus) -> Result<T, StoreError> {
        if !Repository::<T>::has_soft_delete_column(self)? {
            return Err(StoreError::NoSoftDeleteColumn(T::TABLE));
        }
        let mut qb = QueryBuilder::new(format!(
            "UPDATE {} SET \"deleted\" = ",
            ident(T::TABLE)
        ));
        qb.push_bind(i16::from(status.code()));
        qb.push(", \"updated_at\" = now() WHERE \"id\" = ");
        qb.push_bind(T::id_uuid(id));
        qb.push(" RETURNING *");
        self.fetch_one_row("mark_deleted", qb)?
            .ok_or_else(|| Self::missing::<T>(id))
    }

    fn has_soft_delete_column(&self) -> Result<bool, StoreError> {
        self.table_has_column(T::TABLE, DELETED)
    }
}

/// `deleted` as stored; absent when the table has no such column.
fn decode_deleted(row: &PgRow) -> Result<Option<DeleteStatus>, sqlx::Error> {
    let code = match row.try_get::<Option<i16>, _>(DELETED) {
        Ok(code) => code,
        Err(sqlx::Error::ColumnNotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    code.map(|code| {
        u8::try_from(code)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
            .and_then(|code| DeleteStatus::try_from(code).map_err(|e| sqlx::Error::Decode(Box::new(e))))
    })
    .transpose()
}

impl PgRecord for UserRecord {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("id", ColumnType::Uuid),
        ("name", ColumnType::Text),
        ("email", ColumnType::Text),
        ("phone", ColumnType::Text),
        ("password", ColumnType::Text),
        ("created_at", ColumnType::Timestamp),
        ("updated_at", ColumnType::Timestamp),
    ];

    const WRITE_ONLY: &'static [&'static str] = &["password"];

    fn id_uuid(id: &Self::Id) -> Uuid {
        *id.as_uuid()
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Uuid(*self.id.as_uuid()),
            SqlValue::Text(Some(self.name.clone())),
            SqlValue::Text(Some(self.email.clone())),
            SqlValue::Text(self.phone.clone()),
            SqlValue::Text(Some(self.password.clone())),
            SqlValue::Timestamp(self.created_at),
            SqlValue::Timestamp(self.updated_at),
        ]
    }

    fn decode(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRecord {
            id: row.try_get::<Uuid, _>("id")?.into(),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            password: row.try_get("password")?,
            deleted: decode_deleted(row)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl PgRecord for RoleRecord {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("id", ColumnType::Uuid),
        ("name", ColumnType::Text),
        ("guard_name", ColumnType::Text),
        ("created_at", ColumnType::Timestamp),
        ("updated_at", ColumnType::Timestamp),
    ];

    fn id_uuid(id: &Self::Id) -> Uuid {
        *id.as_uuid()
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Uuid(*self.id.as_uuid()),
            SqlValue::Text(Some(self.name.clone())),
            SqlValue::Text(Some(self.guard_name.clone())),
            SqlValue::Timestamp(self.created_at),
            SqlValue::Timestamp(self.updated_at),
        ]
    }

    fn decode(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(RoleRecord {
            id: row.try_get::<Uuid, _>("id")?.into(),
            name: row.try_get("name")?,
            guard_name: row.try_get("guard_name")?,
            deleted: decode_deleted(row)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl PgRecord for PermissionRecord {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("id", ColumnType::Uuid),
        ("name", ColumnType::Text),
        ("group_name", ColumnType::Text),
        ("guard_name", ColumnType::Text),
        ("created_at", ColumnType::Timestamp),
        ("updated_at", ColumnType::Timestamp),
    ];

    fn id_uuid(id: &Self::Id) -> Uuid {
        *id.as_uuid()
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Uuid(*self.id.as_uuid()),
            SqlValue::Text(Some(self.name.clone())),
            SqlValue::Text(self.group_name.clone()),
            SqlValue::Text(Some(self.guard_name.clone())),
            SqlValue::Timestamp(self.created_at),
            SqlValue::Timestamp(self.updated_at),
        ]
    }

    fn decode(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(PermissionRecord {
            id: row.try_get::<Uuid, _>("id")?.into(),
            name: row.try_get("name")?,
            group_name: row.try_get("group_name")?,
            guard_name: row.try_get("guard_name")?,
            deleted: decode_deleted(row)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::{CrudService, ResourceKind};

    #[test]
    fn select_renders_filters_and_order() {
        let filters = [
            Filter::like("email", "%@x.io"),
            Filter::new("deleted", FilterOp::Lt, 1),
            Filter::new("name", FilterOp::Ne, "Admin"),
        ];
        let qb = select_query::<UserRecord>(&filters, &OrderBy::asc("name")).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM \"users\" WHERE \"email\"::text ILIKE $1 AND \"deleted\" < $2 \
             AND \"name\" IS DISTINCT FROM $3 ORDER BY \"name\" ASC"
        );
    }

    #[test]
    fn null_comparisons_follow_the_memory_store() {
        let filters = [
            Filter::eq("phone", Value::Null),
            Filter::new("phone", FilterOp::Ne, Value::Null),
            Filter::new("phone", FilterOp::Gt, Value::Null),
        ];
        let qb = count_query::<UserRecord>(&filters).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) AS total FROM \"users\" WHERE \"phone\" IS NULL \
             AND \"phone\" IS NOT NULL AND FALSE"
        );
    }

    #[test]
    fn unknown_and_write_only_columns_are_rejected() {
        let err = select_query::<RoleRecord>(&[Filter::eq("email", "a")], &OrderBy::default()).err().unwrap();
        assert_eq!(err, StoreError::InvalidQuery("unknown column 'email' on roles".into()));

        assert!(select_query::<UserRecord>(&[Filter::eq("password", "pw")], &OrderBy::default()).is_err());
        assert!(select_query::<UserRecord>(&[], &OrderBy::asc("password")).is_err());
        assert!(select_query::<UserRecord>(&[], &OrderBy::asc("nope")).is_err());
    }

    #[test]
    fn filter_values_bind_with_the_column_type() {
        let id = Uuid::now_v7();
        assert_eq!(
            SqlValue::from_json("id", ColumnType::Uuid, &json!(id.to_string())).unwrap(),
            SqlValue::Uuid(id)
        );
        assert!(SqlValue::from_json("id", ColumnType::Uuid, &json!("nope")).is_err());
        assert_eq!(
            SqlValue::from_json("deleted", ColumnType::SmallInt, &json!(9)).unwrap(),
            SqlValue::SmallInt(Some(9))
        );
        assert!(SqlValue::from_json("deleted", ColumnType::SmallInt, &json!(70000)).is_err());
        assert!(matches!(
            SqlValue::from_json("created_at", ColumnType::Timestamp, &json!("2026-01-02T03:04:05Z")),
            Ok(SqlValue::Timestamp(_))
        ));
    }

    #[test]
    fn writes_include_the_marker_only_when_present() {
        let user = UserRecord::new("Ann", "ann@x.io", None, "pw");
        let with_marker = insert_query(&user, Some(DeleteStatus::NotDeleted));
        assert_eq!(
            with_marker.sql(),
            "INSERT INTO \"users\" (\"id\", \"name\", \"email\", \"phone\", \"password\", \"created_at\", \
             \"updated_at\", \"deleted\") VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *"
        );

        let role = RoleRecord::new("Cashier", "web");
        let update = update_query(&role, None);
        assert_eq!(
            update.sql(),
            "UPDATE \"roles\" SET \"name\" = $1, \"guard_name\" = $2, \"created_at\" = $3, \
             \"updated_at\" = $4 WHERE \"id\" = $5 RETURNING *"
        );
    }

    fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch database");
        let store = PgStore::connect(&url).unwrap();
        store.migrate().unwrap();
        store
    }

    #[test]
    #[ignore = "needs a Postgres database in DATABASE_URL"]
    fn schema_introspection_reads_information_schema() {
        let store = store();
        assert!(Repository::<UserRecord>::has_soft_delete_column(&store).unwrap());
        assert!(!Repository::<RoleRecord>::has_soft_delete_column(&store).unwrap());
    }

    #[test]
    #[ignore = "needs a Postgres database in DATABASE_URL"]
    fn crud_service_runs_against_postgres() {
        let store = store();
        let users: CrudService<UserRecord, PgStore> = CrudService::new(store.clone(), ResourceKind::USERS);
        let email = format!("{}@pg.test", Uuid::now_v7());
        let user = users.create(UserRecord::new("Ann", email.as_str(), None, "pw")).unwrap();
        assert_eq!(user.deleted, Some(DeleteStatus::NotDeleted));

        let err = users.create(UserRecord::new("Dup", email.as_str(), None, "pw")).unwrap_err();
        assert_eq!(err.status_code(), 409);

        let found = users.find_by_where(&[Filter::like("email", email.to_uppercase())]).unwrap();
        assert_eq!(found.len(), 1);

        users.delete(&user.id, DeleteStatus::SoftDelete).unwrap();
        assert_eq!(users.get_by_id(&user.id).unwrap().deleted, Some(DeleteStatus::SoftDelete));
        users.delete(&user.id, DeleteStatus::PermanentDelete).unwrap();
        assert!(users.get_by_id(&user.id).is_err());

        let roles: CrudService<RoleRecord, PgStore> = CrudService::new(store, ResourceKind::ROLES);
        let role = roles.create(RoleRecord::new(format!("role-{}", Uuid::now_v7()), "web")).unwrap();
        assert!(roles.find_by_where(&[Filter::eq("deleted", 0)]).is_err());
        assert_eq!(
            roles.delete(&role.id, DeleteStatus::SoftDelete).unwrap(),
            DeleteStatus::PermanentDelete
        );
    }
}
