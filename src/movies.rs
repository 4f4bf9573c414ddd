//! Movies dataset: parent entity tables and their junction tables.

use crate::schema::{ColumnDefinition, DataType, Schema, TableDefinition};
use crate::stage::SqlStage;
use crate::tables::{Table, TableNames};

/// Snapshot file prefix for this dataset.
pub const DATASET: &str = "movies";

fn entity(name: &str, label_column: &str) -> TableDefinition {
    TableDefinition::new(name)
        .column(ColumnDefinition::new("id", DataType::Integer).not_null().primary_key())
        .column(ColumnDefinition::new(label_column, DataType::Text).not_null())
}

/// Movies and the entities they relate to.
pub fn base_schema(names: &TableNames) -> Schema {
    let movies = TableDefinition::new(names.name(Table::Movies))
        .column(ColumnDefinition::new("id", DataType::Integer).not_null().primary_key())
        .column(ColumnDefinition::new("imdb_id", DataType::Text))
        .column(ColumnDefinition::new("popularity", DataType::Real))
        .column(ColumnDefinition::new("budget", DataType::Real))
        .column(ColumnDefinition::new("budget_adjusted", DataType::Real))
        .column(ColumnDefinition::new("revenue", DataType::Real))
        .column(ColumnDefinition::new("revenue_adjusted", DataType::Real))
        .column(ColumnDefinition::new("original_title", DataType::Text).not_null())
        .column(ColumnDefinition::new("homepage", DataType::Text))
        .column(ColumnDefinition::new("tagline", DataType::Text))
        .column(ColumnDefinition::new("overview", DataType::Text))
        .column(ColumnDefinition::new("runtime", DataType::Integer))
        .column(ColumnDefinition::new("release_date", DataType::Text));

    Schema::new()
        .add_table(movies)
        .add_table(entity(names.name(Table::Genres), "genre"))
        .add_table(entity(names.name(Table::Actors), "full_name"))
        .add_table(entity(names.name(Table::Directors), "full_name"))
        .add_table(entity(names.name(Table::Keywords), "keyword"))
        .add_table(entity(names.name(Table::ProductionCompanies), "company_name"))
}

/// The five junction tables linking movies to genres, actors, directors,
/// keywords and production companies.
pub fn relationship_schema(names: &TableNames) -> Schema {
    let movies = names.name(Table::Movies);
    let link = |table: Table, column: &str, parent: Table| {
        TableDefinition::relationship(
            names.name(table),
            ("movie_id", movies),
            (column, names.name(parent)),
        )
    };

    Schema::new()
        .add_table(link(Table::MovieGenres, "genre_id", Table::Genres))
        .add_table(link(Table::MovieActors, "actor_id", Table::Actors))
        .add_table(link(Table::MovieDirectors, "director_id", Table::Directors))
        .add_table(link(Table::MovieKeywords, "keyword_id", Table::Keywords))
        .add_table(link(
            Table::MovieProductionCompanies,
            "company_id",
            Table::ProductionCompanies,
        ))
}

pub fn base_tables_stage(names: &TableNames) -> SqlStage {
    SqlStage::new("create movie tables", base_schema(names).create_queries())
}

pub fn relationship_tables_stage(names: &TableNames) -> SqlStage {
    SqlStage::new(
        "create movie relationship tables",
        relationship_schema(names).create_queries(),
    )
}
