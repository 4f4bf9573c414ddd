//! Staged schema and fixture scripts.
//!
//! A dataset is built by a chain of stages. Each stage opens the snapshot
//! left by the previous one, copies it forward to its own label and applies
//! its statements there. A stage that fails leaves no snapshot behind, so
//! nothing downstream can run against a half-built database.

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::sqlite::{Database, SqlQuery};
use async_trait::async_trait;
use tracing::{info, warn};

/// One step in building a dataset's database.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, db: &mut Database) -> Result<()>;
}

/// Stage that runs a fixed list of statements in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStage {
    name: String,
    queries: Vec<SqlQuery>,
}

impl SqlStage {
    pub fn new(name: impl Into<String>, queries: Vec<SqlQuery>) -> Self {
        Self {
            name: name.into(),
            queries,
        }
    }

    pub fn queries(&self) -> &[SqlQuery] {
        &self.queries
    }
}

#[async_trait]
impl Stage for SqlStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, db: &mut Database) -> Result<()> {
        for query in &self.queries {
            db.execute(query.clone()).await?;
        }
        Ok(())
    }
}

/// Run `stage`, producing the `target` snapshot of `dataset`.
///
/// With a `source` label the stage starts from a copy of that snapshot,
/// otherwise from an empty file. On failure the target file is removed.
pub async fn run_stage(
    config: &DatabaseConfig,
    dataset: &str,
    source: Option<&str>,
    target: &str,
    stage: &dyn Stage,
) -> Result<()> {
    let target_path = config.snapshot_path(dataset, target);
    tokio::fs::create_dir_all(config.data_dir())
        .await
        .map_err(|e| Error::io(config.data_dir(), e))?;

    info!(dataset, ?source, target, stage = stage.name(), "running stage");
    let mut db = match source {
        Some(source) => Database::open_from_snapshot(config, dataset, source, target).await?,
        None => {
            remove_snapshot(&target_path).await?;
            Database::open_fresh_with(&target_path, config).await?
        }
    };

    let applied = stage.apply(&mut db).await;
    let closed = db.close().await;
    if let Err(err) = applied.and(closed) {
        warn!(
            dataset,
            target,
            stage = stage.name(),
            error = %err,
            "stage failed, removing snapshot"
        );
        remove_snapshot(&target_path).await?;
        return Err(err);
    }

    info!(dataset, target, stage = stage.name(), "stage complete");
    Ok(())
}

async fn remove_snapshot(path: &std::path::Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Ordered chain of labelled stages for one dataset.
pub struct Pipeline {
    dataset: String,
    stages: Vec<(String, Box<dyn Stage>)>,
}

impl Pipeline {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, label: impl Into<String>, stage: impl Stage + 'static) -> Self {
        self.stages.push((label.into(), Box::new(stage)));
        self
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn labels(&self) -> Vec<&str> {
        self.stages.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Run every stage, the first one on a fresh file.
    pub async fn run(&self, config: &DatabaseConfig) -> Result<()> {
        self.run_chain(config, None).await
    }

    /// Run every stage, the first one on a copy of the `source` snapshot.
    pub async fn run_from(&self, config: &DatabaseConfig, source: &str) -> Result<()> {
        self.run_chain(config, Some(source)).await
    }

    async fn run_chain(&self, config: &DatabaseConfig, source: Option<&str>) -> Result<()> {
        let mut previous = source;
        for (label, stage) in &self.stages {
            run_stage(config, &self.dataset, previous, label, stage.as_ref()).await?;
            previous = Some(label.as_str());
        }
        Ok(())
    }
}
