//! SQL statement builders.
//!
//! Every function is pure and returns a [`SqlQuery`]. Values supplied by the
//! caller (ids, titles, authors, bounds) are bound as named parameters.
//! Table and column names cannot be bound and are interpolated as given, so
//! they must come from [`TableNames`] or another trusted source.

use crate::sqlite::SqlQuery;
use crate::tables::{Table, TableNames};

pub fn select_count(table: &str) -> SqlQuery {
    SqlQuery::from(format!("SELECT COUNT(*) AS c FROM {table}"))
}

pub fn select_row_by_id(id: i64, table: &str) -> SqlQuery {
    SqlQuery::from(format!(
        "SELECT * FROM {table}
    WHERE id = :id"
    ))
    .with_param("id", id)
}

pub fn select_category_by_title(names: &TableNames, title: &str) -> SqlQuery {
    SqlQuery::from(format!(
        "SELECT * FROM {categories}
    WHERE title = :title",
        categories = names.name(Table::Categories)
    ))
    .with_param("title", title)
}

/// Categories of one app, as `app_title`, `category_id`, `category_title`.
pub fn select_app_categories_by_app_id(names: &TableNames, app_id: i64) -> SqlQuery {
    let apps_categories = names.name(Table::AppsCategories);
    SqlQuery::from(format!(
        "SELECT app.title AS app_title, category_id, categ.title AS category_title FROM {apps_categories}
    JOIN {apps} app ON {apps_categories}.app_id = app.id
    JOIN {categories} categ ON {apps_categories}.category_id = categ.id
    WHERE app_id = :app_id",
        apps = names.name(Table::Apps),
        categories = names.name(Table::Categories),
    ))
    .with_param("app_id", app_id)
}

pub fn select_unique_row_count(table: &str, column: &str) -> SqlQuery {
    SqlQuery::from(format!("SELECT COUNT(DISTINCT {column}) AS c FROM {table}"))
}

pub fn select_review_by_app_id_author(names: &TableNames, app_id: i64, author: &str) -> SqlQuery {
    SqlQuery::from(format!(
        "SELECT * FROM {reviews}
    WHERE app_id = :app_id
    AND author = :author",
        reviews = names.name(Table::Reviews)
    ))
    .with_param("app_id", app_id)
    .with_param("author", author)
}

pub fn select_column_from_table(column: &str, table: &str) -> SqlQuery {
    SqlQuery::from(format!("SELECT {column} FROM {table}"))
}

pub fn table_info(table: &str) -> SqlQuery {
    SqlQuery::from(format!("PRAGMA table_info({table})"))
}

/// Number of app/plan pairings whose price matches the `LIKE` pattern, as `count`.
pub fn count_apps_with_pricing_like(names: &TableNames, pattern: &str) -> SqlQuery {
    let apps = names.name(Table::Apps);
    let apps_pricing_plans = names.name(Table::AppsPricingPlans);
    let pricing_plans = names.name(Table::PricingPlans);
    SqlQuery::from(format!(
        "SELECT COUNT(app_id) AS count FROM {apps}
    JOIN {apps_pricing_plans} ON {apps}.id = {apps_pricing_plans}.app_id
    JOIN {pricing_plans} ON {apps_pricing_plans}.pricing_plan_id = {pricing_plans}.id
    WHERE price LIKE :pattern"
    ))
    .with_param("pattern", pattern)
}

/// Most common categories across apps, as `count` and `category`.
pub fn top_categories(names: &TableNames, limit: i64) -> SqlQuery {
    let apps_categories = names.name(Table::AppsCategories);
    SqlQuery::from(format!(
        "SELECT COUNT(categ.title) AS count, categ.title AS category FROM {apps_categories}
    JOIN {apps} ap ON {apps_categories}.app_id = ap.id
    JOIN {categories} categ ON {apps_categories}.category_id = categ.id
    GROUP BY categ.title
    ORDER BY count DESC
    LIMIT :limit",
        apps = names.name(Table::Apps),
        categories = names.name(Table::Categories),
    ))
    .with_param("limit", limit)
}

/// Most common paid prices whose numeric part lies in `[min, max]`, as
/// `count`, `price` and `casted_price`. Monthly and one-time prices are
/// grouped together.
pub fn top_prices_in_range(names: &TableNames, min: f64, max: f64, limit: i64) -> SqlQuery {
    let apps_pricing_plans = names.name(Table::AppsPricingPlans);
    let pricing_plans = names.name(Table::PricingPlans);
    SqlQuery::from(format!(
        "SELECT COUNT(price) AS count, price, CAST(substr(price, 2) AS REAL) AS casted_price FROM {apps_pricing_plans}
    JOIN {apps} ON {apps_pricing_plans}.app_id = {apps}.id
    JOIN {pricing_plans} ON {apps_pricing_plans}.pricing_plan_id = {pricing_plans}.id
    WHERE price NOT LIKE 'Free'
    AND casted_price >= :min_price
    AND casted_price <= :max_price
    GROUP BY casted_price
    ORDER BY count DESC
    LIMIT :limit",
        apps = names.name(Table::Apps),
    ))
    .with_param("min_price", min)
    .with_param("max_price", max)
    .with_param("limit", limit)
}

/// Link two rows through a junction table.
pub fn insert_relationship(
    table: &str,
    left_column: &str,
    right_column: &str,
    left_id: i64,
    right_id: i64,
) -> SqlQuery {
    SqlQuery::from(format!(
        "INSERT INTO {table} ({left_column}, {right_column}) VALUES (:left_id, :right_id)"
    ))
    .with_param("left_id", left_id)
    .with_param("right_id", right_id)
}
