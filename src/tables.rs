//! Registry of physical table names.
//!
//! Schema and query code never spells out a table name; it asks a
//! [`TableNames`] built once at startup and handed down explicitly.

use std::collections::HashMap;

/// Every logical table the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Movies,
    Genres,
    Actors,
    Directors,
    Keywords,
    ProductionCompanies,
    MovieGenres,
    MovieActors,
    MovieDirectors,
    MovieKeywords,
    MovieProductionCompanies,
    Apps,
    Categories,
    AppsCategories,
    Reviews,
    PricingPlans,
    AppsPricingPlans,
    KeyBenefits,
}

impl Table {
    /// Movie junction tables, in creation order.
    pub const MOVIE_RELATIONSHIPS: [Table; 5] = [
        Table::MovieGenres,
        Table::MovieActors,
        Table::MovieDirectors,
        Table::MovieKeywords,
        Table::MovieProductionCompanies,
    ];

    /// Shopify junction tables, in creation order.
    pub const SHOPIFY_RELATIONSHIPS: [Table; 2] = [Table::AppsCategories, Table::AppsPricingPlans];

    pub fn default_name(self) -> &'static str {
        match self {
            Table::Movies => "movies",
            Table::Genres => "genres",
            Table::Actors => "actors",
            Table::Directors => "directors",
            Table::Keywords => "keywords",
            Table::ProductionCompanies => "production_companies",
            Table::MovieGenres => "movie_genres",
            Table::MovieActors => "movie_actors",
            Table::MovieDirectors => "movie_directors",
            Table::MovieKeywords => "movie_keywords",
            Table::MovieProductionCompanies => "movie_production_companies",
            Table::Apps => "apps",
            Table::Categories => "categories",
            Table::AppsCategories => "apps_categories",
            Table::Reviews => "reviews",
            Table::PricingPlans => "pricing_plans",
            Table::AppsPricingPlans => "apps_pricing_plans",
            Table::KeyBenefits => "key_benefits",
        }
    }
}

/// Immutable mapping from [`Table`] to its physical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableNames {
    overrides: HashMap<Table, String>,
}

impl TableNames {
    /// Registry using the default physical names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the physical name of one table.
    pub fn with_name(mut self, table: Table, name: impl Into<String>) -> Self {
        self.overrides.insert(table, name.into());
        self
    }

    pub fn name(&self, table: Table) -> &str {
        self.overrides
            .get(&table)
            .map(String::as_str)
            .unwrap_or_else(|| table.default_name())
    }

    pub fn movie_relationship_tables(&self) -> Vec<&str> {
        Table::MOVIE_RELATIONSHIPS
            .iter()
            .map(|table| self.name(*table))
            .collect()
    }

    pub fn shopify_relationship_tables(&self) -> Vec<&str> {
        Table::SHOPIFY_RELATIONSHIPS
            .iter()
            .map(|table| self.name(*table))
            .collect()
    }
}
