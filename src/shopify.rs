//! Shopify app store dataset.

use crate::schema::{ColumnDefinition, DataType, ForeignKey, IndexDefinition, Schema, TableDefinition};
use crate::stage::SqlStage;
use crate::tables::{Table, TableNames};

/// Snapshot file prefix for this dataset.
pub const DATASET: &str = "shopify";

pub fn schema(names: &TableNames) -> Schema {
    let apps = names.name(Table::Apps);
    let categories = names.name(Table::Categories);
    let reviews = names.name(Table::Reviews);
    let pricing_plans = names.name(Table::PricingPlans);
    let key_benefits = names.name(Table::KeyBenefits);

    Schema::new()
        .add_table(
            TableDefinition::new(apps)
                .column(ColumnDefinition::new("id", DataType::Integer).not_null().primary_key())
                .column(ColumnDefinition::new("url", DataType::Text))
                .column(ColumnDefinition::new("title", DataType::Text).not_null())
                .column(ColumnDefinition::new("developer", DataType::Text))
                .column(ColumnDefinition::new("developer_link", DataType::Text))
                .column(ColumnDefinition::new("icon", DataType::Text))
                .column(ColumnDefinition::new("rating", DataType::Real))
                .column(ColumnDefinition::new("reviews_count", DataType::Integer))
                .column(ColumnDefinition::new("description", DataType::Text))
                .column(ColumnDefinition::new("tagline", DataType::Text)),
        )
        .add_table(
            TableDefinition::new(categories)
                .column(ColumnDefinition::new("id", DataType::Integer).not_null().primary_key())
                .column(ColumnDefinition::new("title", DataType::Text).not_null()),
        )
        .add_table(TableDefinition::relationship(
            names.name(Table::AppsCategories),
            ("app_id", apps),
            ("category_id", categories),
        ))
        .add_table(
            TableDefinition::new(reviews)
                .column(ColumnDefinition::new("app_id", DataType::Integer).not_null())
                .column(ColumnDefinition::new("author", DataType::Text))
                .column(ColumnDefinition::new("body", DataType::Text))
                .column(ColumnDefinition::new("rating", DataType::Integer))
                .column(ColumnDefinition::new("helpful_count", DataType::Integer))
                .column(ColumnDefinition::new("date_created", DataType::Text))
                .column(ColumnDefinition::new("developer_reply", DataType::Text))
                .column(ColumnDefinition::new("developer_reply_date", DataType::Text))
                .foreign_key(ForeignKey::new("app_id", apps, "id"))
                .index(IndexDefinition::new(format!("idx_{reviews}_app_id"), ["app_id"])),
        )
        .add_table(
            TableDefinition::new(pricing_plans)
                .column(ColumnDefinition::new("id", DataType::Integer).not_null().primary_key())
                .column(ColumnDefinition::new("price", DataType::Text).not_null()),
        )
        .add_table(TableDefinition::relationship(
            names.name(Table::AppsPricingPlans),
            ("app_id", apps),
            ("pricing_plan_id", pricing_plans),
        ))
        .add_table(
            TableDefinition::new(key_benefits)
                .column(ColumnDefinition::new("app_id", DataType::Integer).not_null())
                .column(ColumnDefinition::new("title", DataType::Text))
                .column(ColumnDefinition::new("description", DataType::Text))
                .foreign_key(ForeignKey::new("app_id", apps, "id")),
        )
}

pub fn base_tables_stage(names: &TableNames) -> SqlStage {
    SqlStage::new("create shopify tables", schema(names).create_queries())
}
