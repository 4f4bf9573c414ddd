//! Table descriptors and the DDL they render to.

use crate::error::{Error, Result};
use crate::sqlite::{ColumnInfo, SqlQuery};
use std::fmt;

/// Ordered set of tables created together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// `CREATE TABLE` statements followed by `CREATE INDEX` statements, in table order.
    pub fn create_queries(&self) -> Vec<SqlQuery> {
        let mut queries: Vec<SqlQuery> = self
            .tables
            .iter()
            .map(|t| SqlQuery::from(t.create_statement()))
            .collect();
        queries.extend(
            self.tables
                .iter()
                .flat_map(|t| t.index_statements())
                .map(SqlQuery::from),
        );
        queries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    /// Table-level (possibly composite) primary key
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Junction table: two `integer NOT NULL` columns forming a composite
    /// primary key, each referencing `id` on its parent table.
    pub fn relationship(
        name: impl Into<String>,
        (left_column, left_parent): (&str, &str),
        (right_column, right_parent): (&str, &str),
    ) -> Self {
        Self::new(name)
            .column(ColumnDefinition::new(left_column, DataType::Integer).not_null())
            .column(ColumnDefinition::new(right_column, DataType::Integer).not_null())
            .primary_key([left_column, right_column])
            .foreign_key(ForeignKey::new(left_column, left_parent, "id"))
            .foreign_key(ForeignKey::new(right_column, right_parent, "id"))
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn foreign_key(mut self, key: ForeignKey) -> Self {
        self.foreign_keys.push(key);
        self
    }

    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn create_statement(&self) -> String {
        let mut lines: Vec<String> = self.columns.iter().map(|c| c.to_string()).collect();
        if !self.primary_key.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        lines.extend(self.foreign_keys.iter().map(|fk| fk.to_string()));
        format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.name,
            lines.join(",\n  ")
        )
    }

    pub fn index_statements(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE INDEX {} ON {} ({})",
                    index.name,
                    self.name,
                    index.columns.join(", ")
                )
            })
            .collect()
    }

    /// Compare introspected columns against this definition: same names,
    /// same declared types, same order.
    pub fn check_columns(&self, actual: &[ColumnInfo]) -> Result<()> {
        let expected: Vec<(&str, String)> = self
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.to_string()))
            .collect();
        let found: Vec<(&str, String)> = actual
            .iter()
            .map(|c| (c.name.as_str(), c.declared_type.to_ascii_lowercase()))
            .collect();
        if expected != found {
            return Err(Error::Schema {
                table: self.name.clone(),
                reason: format!("expected columns {expected:?}, found {found:?}"),
            });
        }
        Ok(())
    }
}

/// Check the junction-table shape: exactly two `integer` columns, both
/// named `*_id`, both NOT NULL and both members of the primary key.
pub fn verify_relationship_table(table: &str, columns: &[ColumnInfo]) -> Result<()> {
    let violation = |reason: String| Error::Schema {
        table: table.to_string(),
        reason,
    };

    if columns.len() != 2 {
        return Err(violation(format!("expected 2 columns, found {}", columns.len())));
    }
    for column in columns {
        let is_key_name = column.name.ends_with("_id");
        if !is_key_name {
            return Err(violation(format!("column '{}' is not an _id column", column.name)));
        }
        if !column.declared_type.eq_ignore_ascii_case("integer") {
            return Err(violation(format!(
                "column '{}' has type '{}', expected integer",
                column.name, column.declared_type
            )));
        }
        if !column.not_null {
            return Err(violation(format!("column '{}' is nullable", column.name)));
        }
        if !column.is_primary_key() {
            return Err(violation(format!(
                "column '{}' is not part of the primary key",
                column.name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            constraints: Vec::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.push(ColumnConstraint::NotNull);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.constraints.push(ColumnConstraint::PrimaryKey);
        self
    }
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        for constraint in &self.constraints {
            write!(f, " {constraint}")?;
        }
        Ok(())
    }
}

/// Declared column type, rendered lowercase in DDL. `PRAGMA table_info`
/// reports these names upper-cased, so compare case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Text,
    Real,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Integer => "integer",
            DataType::Text => "text",
            DataType::Real => "real",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
}

impl fmt::Display for ColumnConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::NotNull => "NOT NULL",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            foreign_table: foreign_table.into(),
            foreign_column: foreign_column.into(),
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FOREIGN KEY ({}) REFERENCES {}({})",
            self.column, self.foreign_table, self.foreign_column
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
}

impl IndexDefinition {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}
