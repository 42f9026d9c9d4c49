//! Pipeline context: owns the data source and runs load → filter-pivot for a selection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::PolarsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{Dataset, LoadError, LoadOptions};
use crate::pivot::{filter_pivot, WideTable};
use crate::selection::Selection;

/// Whether each run re-reads the source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Re-read the CSV on every run.
    #[default]
    EveryRun,
    /// Load once and reuse the dataset.
    Snapshot,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("pivot failed: {0}")]
    Pivot(#[from] PolarsError),
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub dataset: Arc<Dataset>,
    pub table: WideTable,
}

/// Everything a run needs: where the data lives, how to read it, when to re-read it.
#[derive(Debug)]
pub struct PipelineContext {
    path: PathBuf,
    options: LoadOptions,
    policy: ReloadPolicy,
    snapshot: Option<Arc<Dataset>>,
}

impl PipelineContext {
    pub fn new(path: impl Into<PathBuf>, options: LoadOptions, policy: ReloadPolicy) -> Self {
        Self {
            path: path.into(),
            options,
            policy,
            snapshot: None,
        }
    }

    /// Seed the context with an already loaded dataset (the startup load).
    pub fn with_snapshot(mut self, dataset: Dataset) -> Self {
        self.snapshot = Some(Arc::new(dataset));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> ReloadPolicy {
        self.policy
    }

    /// Most recently loaded dataset, if any.
    pub fn last_dataset(&self) -> Option<&Arc<Dataset>> {
        self.snapshot.as_ref()
    }

    /// Dataset for the current run, reloading according to the policy.
    pub fn dataset(&mut self) -> Result<Arc<Dataset>, LoadError> {
        match (self.policy, &self.snapshot) {
            (ReloadPolicy::Snapshot, Some(dataset)) => Ok(Arc::clone(dataset)),
            _ => {
                tracing::debug!(path = %self.path.display(), policy = ?self.policy, "loading dataset");
                let dataset = Arc::new(Dataset::load(&self.path, &self.options)?);
                self.snapshot = Some(Arc::clone(&dataset));
                Ok(dataset)
            }
        }
    }

    /// Load (per policy) and filter-pivot for `selection`.
    pub fn run(&mut self, selection: &Selection) -> Result<PipelineRun, PipelineError> {
        let dataset = self.dataset()?;
        let table = filter_pivot(&dataset, selection)?;
        Ok(PipelineRun { dataset, table })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::YearRange;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("music_genres_summary.csv");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_every_run_rereads_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "genre,year,popularity\nPop,2000,5\n");
        let mut ctx = PipelineContext::new(&path, LoadOptions::default(), ReloadPolicy::EveryRun);
        let selection = Selection::new(["Pop"], YearRange::new(2000, 2000));

        let first = ctx.run(&selection).unwrap();
        assert_eq!(first.table.get("2000", "Pop"), Some(5.0));

        write_csv(&dir, "genre,year,popularity\nPop,2000,9\n");
        let second = ctx.run(&selection).unwrap();
        assert_eq!(second.table.get("2000", "Pop"), Some(9.0));
    }

    #[test]
    fn test_snapshot_reuses_dataset() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "genre,year,popularity\nPop,2000,5\n");
        let mut ctx = PipelineContext::new(&path, LoadOptions::default(), ReloadPolicy::Snapshot);
        let selection = Selection::new(["Pop"], YearRange::new(2000, 2000));

        ctx.run(&selection).unwrap();
        fs::remove_file(&path).unwrap();
        let run = ctx.run(&selection).unwrap();
        assert_eq!(run.table.get("2000", "Pop"), Some(5.0));
    }

    #[test]
    fn test_every_run_fails_when_file_disappears() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "genre,year,popularity\nPop,2000,5\n");
        let mut ctx = PipelineContext::new(&path, LoadOptions::default(), ReloadPolicy::EveryRun);
        let selection = Selection::new(["Pop"], YearRange::new(2000, 2000));

        ctx.run(&selection).unwrap();
        fs::remove_file(&path).unwrap();
        let err = ctx.run(&selection).unwrap_err();
        assert!(matches!(err, PipelineError::Load(LoadError::NotFound(_))));
        assert!(ctx.last_dataset().is_some());
    }

    #[test]
    fn test_reload_policy_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            reload: ReloadPolicy,
        }
        let w: Wrapper = toml::from_str("reload = \"snapshot\"").unwrap();
        assert_eq!(w.reload, ReloadPolicy::Snapshot);
        let w: Wrapper = toml::from_str("reload = \"every_run\"").unwrap();
        assert_eq!(w.reload, ReloadPolicy::EveryRun);
    }
}
