use sqlite_catalog::stage::{run_stage, Pipeline};
use sqlite_catalog::{queries, shopify, Database, DatabaseConfig, Row, SqlStage, TableNames, Value};
use tempfile::TempDir;

fn row(fields: &[(&str, Value)]) -> Row {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn fixture_rows() -> SqlStage {
    let statements = [
        "INSERT INTO apps (id, title, developer, rating) VALUES
            (1, 'Alpha', 'Acme', 4.5), (2, 'Beta', 'Acme', 4.0), (3, 'Gamma', 'Bolt', 3.5), (4, 'Delta', 'Core', 5.0)",
        "INSERT INTO categories (id, title) VALUES
            (1, 'Store design'), (2, 'Marketing'), (3, 'Sales and conversion optimization')",
        "INSERT INTO apps_categories (app_id, category_id) VALUES
            (1, 1), (2, 1), (3, 1), (4, 1), (1, 3), (2, 3), (3, 3), (1, 2), (4, 2)",
        "INSERT INTO pricing_plans (id, price) VALUES
            (1, 'Free'), (2, 'Free to install'), (3, '$9.99/month'), (4, '$5/month'),
            (5, '$10/month'), (6, '$4.99/month'), (7, '$15/month')",
        "INSERT INTO apps_pricing_plans (app_id, pricing_plan_id) VALUES
            (1, 1), (2, 1), (3, 2),
            (1, 3), (2, 3), (3, 3),
            (1, 4), (4, 4),
            (4, 5),
            (2, 6), (3, 6),
            (1, 7), (2, 7), (3, 7), (4, 7)",
        "INSERT INTO reviews (app_id, author, body, rating) VALUES
            (1, 'Ann', 'Great', 5), (1, 'O''Brien', 'Fine', 4), (2, 'Ann', 'Meh', 3)",
    ];
    SqlStage::new(
        "shopify fixture rows",
        statements.into_iter().map(Into::into).collect(),
    )
}

// "01" creates the tables, "02" loads the fixture rows, tests work on "03".
async fn open_fixture() -> anyhow::Result<(Database, TempDir)> {
    let dir = tempfile::tempdir()?;
    let config = DatabaseConfig::new(dir.path());
    let names = TableNames::new();

    Pipeline::new(shopify::DATASET)
        .stage("01", shopify::base_tables_stage(&names))
        .stage("02", fixture_rows())
        .run(&config)
        .await?;

    let db = Database::open_from_snapshot(&config, shopify::DATASET, "02", "03").await?;
    Ok((db, dir))
}

#[tokio::test]
async fn test_select_category_by_title() -> anyhow::Result<()> {
    let (mut db, _dir) = open_fixture().await?;
    let names = TableNames::new();

    let category = db
        .fetch_one(queries::select_category_by_title(&names, "Marketing"))
        .await?
        .expect("Marketing category");
    assert_eq!(category["title"], Value::Text("Marketing".to_string()));
    assert_eq!(category["id"], Value::Integer(2));

    let missing = db
        .fetch_one(queries::select_category_by_title(&names, "Marketing' OR '1'='1"))
        .await?;
    assert!(missing.is_none());

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_row_by_id_round_trip() -> anyhow::Result<()> {
    let (mut db, _dir) = open_fixture().await?;

    db.execute(
        sqlite_catalog::SqlQuery::new("INSERT INTO apps (id, title, rating) VALUES (:id, :title, :rating)")
            .with_param("id", 42)
            .with_param("title", "Omega")
            .with_param("rating", 2.5),
    )
    .await?;

    let app = db
        .fetch_one(queries::select_row_by_id(42, "apps"))
        .await?
        .expect("inserted app");
    assert_eq!(app["title"], Value::Text("Omega".to_string()));
    assert_eq!(app["rating"], Value::Real(2.5));
    assert_eq!(app["developer"], Value::Null);

    assert!(db.fetch_one(queries::select_row_by_id(43, "apps")).await?.is_none());

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_count_apps_with_free_pricing_plan() -> anyhow::Result<()> {
    let (mut db, _dir) = open_fixture().await?;
    let names = TableNames::new();

    let result = db
        .fetch_one(queries::count_apps_with_pricing_like(&names, "%Free%"))
        .await?;
    assert_eq!(result, Some(row(&[("count", Value::Integer(3))])));

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_top_categories() -> anyhow::Result<()> {
    let (mut db, _dir) = open_fixture().await?;
    let names = TableNames::new();

    let result = db.fetch_many(queries::top_categories(&names, 3)).await?;
    assert_eq!(
        result,
        vec![
            row(&[("count", Value::Integer(4)), ("category", "Store design".into())]),
            row(&[
                ("count", Value::Integer(3)),
                ("category", "Sales and conversion optimization".into())
            ]),
            row(&[("count", Value::Integer(2)), ("category", "Marketing".into())]),
        ]
    );

    let top_one = db.fetch_many(queries::top_categories(&names, 1)).await?;
    assert_eq!(top_one.len(), 1);

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_top_prices_in_range() -> anyhow::Result<()> {
    let (mut db, _dir) = open_fixture().await?;
    let names = TableNames::new();

    let result = db
        .fetch_many(queries::top_prices_in_range(&names, 5.0, 10.0, 3))
        .await?;
    assert_eq!(
        result,
        vec![
            row(&[
                ("count", Value::Integer(3)),
                ("price", "$9.99/month".into()),
                ("casted_price", Value::Real(9.99)),
            ]),
            row(&[
                ("count", Value::Integer(2)),
                ("price", "$5/month".into()),
                ("casted_price", Value::Real(5.0)),
            ]),
            row(&[
                ("count", Value::Integer(1)),
                ("price", "$10/month".into()),
                ("casted_price", Value::Real(10.0)),
            ]),
        ]
    );

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_app_categories_and_reviews() -> anyhow::Result<()> {
    let (mut db, _dir) = open_fixture().await?;
    let names = TableNames::new();

    let categories = db
        .fetch_many(queries::select_app_categories_by_app_id(&names, 4))
        .await?;
    let mut titles: Vec<&str> = categories
        .iter()
        .filter_map(|r| r["category_title"].as_str())
        .collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Marketing", "Store design"]);
    assert!(categories
        .iter()
        .all(|r| r["app_title"] == Value::Text("Delta".to_string())));

    let review = db
        .fetch_one(queries::select_review_by_app_id_author(&names, 1, "O'Brien"))
        .await?
        .expect("review by O'Brien");
    assert_eq!(review["body"], Value::Text("Fine".to_string()));

    let authors = db
        .fetch_one(queries::select_unique_row_count("reviews", "author"))
        .await?
        .unwrap();
    assert_eq!(authors["c"], Value::Integer(2));

    let titles = db
        .fetch_many(queries::select_column_from_table("title", "apps"))
        .await?;
    assert_eq!(titles.len(), 4);
    assert!(titles.iter().all(|r| r.len() == 1));

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_shopify_relationship_tables() -> anyhow::Result<()> {
    let (mut db, _dir) = open_fixture().await?;
    let names = TableNames::new();

    for table in names.shopify_relationship_tables() {
        let columns = db.column_info(table).await?;
        sqlite_catalog::schema::verify_relationship_table(table, &columns)?;
    }
    assert!(db.column_exists("reviews", "author").await?);
    assert!(!db.column_exists("reviews", "stars").await?);

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_failed_fixture_stage_breaks_the_chain() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = DatabaseConfig::new(dir.path());
    let names = TableNames::new();

    run_stage(&config, shopify::DATASET, None, "01", &shopify::base_tables_stage(&names)).await?;
    let broken = SqlStage::new(
        "broken rows",
        vec!["INSERT INTO categories (id) VALUES (1)".into()],
    );
    let err = run_stage(&config, shopify::DATASET, Some("01"), "02", &broken)
        .await
        .unwrap_err();
    assert!(err.is_query());
    assert!(!config.snapshot_path(shopify::DATASET, "02").exists());

    let next = Database::open_from_snapshot(&config, shopify::DATASET, "02", "03").await;
    assert!(matches!(next, Err(sqlite_catalog::Error::NotFound(_))));
    Ok(())
}

/// Runs against the full Shopify app store snapshot. Point
/// `SQLITE_CATALOG_DATA_DIR` at a directory holding `shopify-03.sqlite3`.
#[tokio::test]
#[ignore = "needs the reference Shopify dataset snapshot"]
async fn test_reference_dataset_queries() -> anyhow::Result<()> {
    let config = DatabaseConfig::from_env();
    let names = TableNames::new();
    let mut db = Database::open_from_snapshot(&config, shopify::DATASET, "03", "04").await?;

    let free = db
        .fetch_one(queries::count_apps_with_pricing_like(&names, "%Free%"))
        .await?;
    assert_eq!(free, Some(row(&[("count", Value::Integer(1112))])));

    let categories = db.fetch_many(queries::top_categories(&names, 3)).await?;
    assert_eq!(
        categories,
        vec![
            row(&[("count", Value::Integer(1193)), ("category", "Store design".into())]),
            row(&[
                ("count", Value::Integer(723)),
                ("category", "Sales and conversion optimization".into())
            ]),
            row(&[("count", Value::Integer(629)), ("category", "Marketing".into())]),
        ]
    );

    let prices = db
        .fetch_many(queries::top_prices_in_range(&names, 5.0, 10.0, 3))
        .await?;
    assert_eq!(
        prices,
        vec![
            row(&[
                ("count", Value::Integer(225)),
                ("price", "$9.99/month".into()),
                ("casted_price", Value::Real(9.99)),
            ]),
            row(&[
                ("count", Value::Integer(135)),
                ("price", "$5/month".into()),
                ("casted_price", Value::Real(5.0)),
            ]),
            row(&[
                ("count", Value::Integer(114)),
                ("price", "$10/month".into()),
                ("casted_price", Value::Real(10.0)),
            ]),
        ]
    );

    db.close().await?;
    Ok(())
}
