use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::queries;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, info, warn};

/// Core value types for SQLite operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Boolean(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
            Value::Boolean(b) => ToSqlOutput::from(*b),
        })
    }
}

/// Named parameter bindings for SQL queries.
///
/// Names are stored with their SQLite prefix; a bare `id` becomes `:id`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub values: HashMap<String, Value>,
}

impl Params {
    /// Create a new Params object
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = if name.starts_with([':', '@', '$']) {
            name.to_string()
        } else {
            format!(":{name}")
        };
        self.values.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .get(name)
            .or_else(|| self.values.get(&format!(":{name}")))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn bindings(&self) -> Vec<(&str, &dyn ToSql)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

/// SQL statement with its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Params,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Params::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params = self.params.with_value(name, value);
        self
    }
}

impl From<&str> for SqlQuery {
    fn from(statement: &str) -> Self {
        SqlQuery::new(statement)
    }
}

impl From<String> for SqlQuery {
    fn from(statement: String) -> Self {
        Self {
            statement,
            params: Params::new(),
        }
    }
}

/// One result row, keyed by result column name.
pub type Row = HashMap<String, Value>;

/// A column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    /// Declared type as the engine reports it. Standard type names come back
    /// upper-cased (`INTEGER` for a column declared `integer`).
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Value,
    /// 1-based position in the primary key, 0 when not a key column
    pub pk: i64,
}

impl ColumnInfo {
    pub fn is_primary_key(&self) -> bool {
        self.pk > 0
    }
}

/// Handle owning a single connection to an on-disk SQLite file.
///
/// The connection is moved onto tokio's blocking pool for the duration of
/// each call and handed back afterwards, so every method takes `&mut self`
/// and calls on one handle never overlap.
pub struct Database {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Database {
    /// Create or open the database file at `path`.
    pub async fn open_fresh(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_fresh_with(path, &DatabaseConfig::default()).await
    }

    /// Create or open the database file at `path`, applying `config`'s connection settings.
    pub async fn open_fresh_with(path: impl AsRef<Path>, config: &DatabaseConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let foreign_keys = config.foreign_keys;
        let open_path = path.clone();
        let conn = task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&open_path)
                .map_err(|e| Error::io(&open_path, io::Error::new(io::ErrorKind::Other, e)))?;
            // The bundled engine enforces foreign keys unless told otherwise.
            let pragma = if foreign_keys {
                "PRAGMA foreign_keys = ON"
            } else {
                "PRAGMA foreign_keys = OFF"
            };
            conn.execute_batch(pragma).map_err(|e| Error::query(pragma, e))?;
            // Reads page 1, so a file that is not a database fails here.
            const SCHEMA_VERSION: &str = "PRAGMA schema_version";
            conn.query_row(SCHEMA_VERSION, [], |row| row.get::<_, i64>(0))
                .map_err(|e| Error::query(SCHEMA_VERSION, e))?;
            Ok(conn)
        })
        .await??;

        info!(path = %path.display(), foreign_keys, "opened database");
        Ok(Self {
            path,
            conn: Some(conn),
        })
    }

    /// Copy the `source` snapshot of `dataset` forward to `target` and open the copy.
    ///
    /// An existing `target` is overwritten. `source` and `target` must name
    /// different files. If the copy cannot be opened it is removed again.
    pub async fn open_from_snapshot(
        config: &DatabaseConfig,
        dataset: &str,
        source: &str,
        target: &str,
    ) -> Result<Self> {
        let source_path = config.snapshot_path(dataset, source);
        let target_path = config.snapshot_path(dataset, target);

        if source_path == target_path {
            return Err(Error::SnapshotOverlap {
                dataset: dataset.to_string(),
                label: target.to_string(),
            });
        }

        let exists = tokio::fs::try_exists(&source_path)
            .await
            .map_err(|e| Error::io(&source_path, e))?;
        if !exists {
            return Err(Error::NotFound(format!(
                "snapshot '{dataset}-{source}' at {}",
                source_path.display()
            )));
        }

        tokio::fs::copy(&source_path, &target_path)
            .await
            .map_err(|e| Error::io(&target_path, e))?;
        info!(
            from = %source_path.display(),
            to = %target_path.display(),
            "copied snapshot"
        );

        match Self::open_fresh_with(&target_path, config).await {
            Ok(db) => Ok(db),
            Err(err) => {
                warn!(path = %target_path.display(), error = %err, "removing unusable snapshot copy");
                if let Err(e) = tokio::fs::remove_file(&target_path).await {
                    if e.kind() != io::ErrorKind::NotFound {
                        return Err(Error::io(&target_path, e));
                    }
                }
                Err(err)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Run a statement that returns no rows. Returns the number of rows changed.
    pub async fn execute(&mut self, query: impl Into<SqlQuery>) -> Result<usize> {
        let query = query.into();
        debug!(sql = %query.statement, "execute");
        self.with_connection(move |conn| {
            let bindings = query.params.bindings();
            conn.execute(&query.statement, bindings.as_slice())
                .map_err(|e| Error::query(&query.statement, e))
        })
        .await
    }

    /// Run several `;`-separated statements without parameters.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<()> {
        let sql = sql.to_string();
        debug!(%sql, "execute batch");
        self.with_connection(move |conn| conn.execute_batch(&sql).map_err(|e| Error::query(&sql, e)))
            .await
    }

    /// Fetch the single row a query returns, `None` when it returns nothing.
    ///
    /// More than one row is an error; use [`Database::fetch_first`] when
    /// extra rows should be ignored.
    pub async fn fetch_one(&mut self, query: impl Into<SqlQuery>) -> Result<Option<Row>> {
        let query = query.into();
        debug!(sql = %query.statement, "fetch one");
        let sql = query.statement.clone();
        let mut rows = self
            .with_connection(move |conn| collect_rows(conn, &query, Some(2)))
            .await?;
        if rows.len() > 1 {
            return Err(Error::TooManyRows { sql });
        }
        Ok(rows.pop())
    }

    /// Fetch the first row a query returns, if any.
    pub async fn fetch_first(&mut self, query: impl Into<SqlQuery>) -> Result<Option<Row>> {
        let query = query.into();
        debug!(sql = %query.statement, "fetch first");
        let rows = self
            .with_connection(move |conn| collect_rows(conn, &query, Some(1)))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Fetch every row a query returns, in the engine's order.
    pub async fn fetch_many(&mut self, query: impl Into<SqlQuery>) -> Result<Vec<Row>> {
        let query = query.into();
        debug!(sql = %query.statement, "fetch many");
        self.with_connection(move |conn| collect_rows(conn, &query, None))
            .await
    }

    pub async fn table_exists(&mut self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.with_connection(move |conn| {
            const SQL: &str = "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";
            conn.query_row(SQL, [&name], |_| Ok(()))
                .optional()
                .map(|found| found.is_some())
                .map_err(|e| Error::query(SQL, e))
        })
        .await
    }

    /// True when `table` exists and has a column called `column`.
    pub async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool> {
        let table = table.to_string();
        let column = column.to_string();
        self.with_connection(move |conn| {
            let columns = read_table_info(conn, &table)?;
            Ok(columns.iter().any(|c| c.name == column))
        })
        .await
    }

    /// Column descriptors for `table`, in declaration order.
    pub async fn column_info(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let table = table.to_string();
        self.with_connection(move |conn| {
            let columns = read_table_info(conn, &table)?;
            if columns.is_empty() {
                return Err(Error::NotFound(format!("table '{table}'")));
            }
            Ok(columns)
        })
        .await
    }

    /// Release the connection. Closing an already closed handle does nothing.
    pub async fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        task::spawn_blocking(move || conn.close().map_err(|(_, e)| Error::query("<close>", e)))
            .await??;
        info!(path = %self.path.display(), "closed database");
        Ok(())
    }

    async fn with_connection<T, F>(&mut self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.take().ok_or(Error::Closed)?;
        // A panic inside `op` drops the connection and leaves the handle closed.
        let (conn, result) = task::spawn_blocking(move || {
            let result = op(&conn);
            (conn, result)
        })
        .await?;
        self.conn = Some(conn);
        result
    }
}

fn collect_rows(conn: &Connection, query: &SqlQuery, limit: Option<usize>) -> Result<Vec<Row>> {
    let sql = query.statement.as_str();
    let mut stmt = conn.prepare(sql).map_err(|e| Error::query(sql, e))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let bindings = query.params.bindings();
    let mut rows = stmt
        .query(bindings.as_slice())
        .map_err(|e| Error::query(sql, e))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(|e| Error::query(sql, e))? {
        let mut record = Row::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            let value = row.get_ref(idx).map_err(|e| Error::query(sql, e))?;
            record.insert(name.clone(), Value::from(value));
        }
        out.push(record);
        if limit.is_some_and(|limit| out.len() >= limit) {
            break;
        }
    }
    Ok(out)
}

fn read_table_info(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let query = queries::table_info(table);
    let sql = query.statement.as_str();
    let mut stmt = conn.prepare(sql).map_err(|e| Error::query(sql, e))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                cid: row.get("cid")?,
                name: row.get("name")?,
                declared_type: row.get("type")?,
                not_null: row.get::<_, i64>("notnull")? != 0,
                default_value: Value::from(row.get_ref("dflt_value")?),
                pk: row.get("pk")?,
            })
        })
        .map_err(|e| Error::query(sql, e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::query(sql, e))?;
    Ok(columns)
}
