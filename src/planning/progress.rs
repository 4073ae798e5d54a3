//! Progress file: `{ "<account>": { "current_step": n, "route": ["action:network", ...] } }`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::ActionPlan;
use crate::error::{Result, WayfarerError};

/// Plans keyed by account name, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress {
    plans: IndexMap<String, ActionPlan>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the plan of `account`; a replaced plan keeps its position
    pub fn insert(&mut self, account: impl Into<String>, plan: ActionPlan) {
        self.plans.insert(account.into(), plan);
    }

    pub fn get(&self, account: &str) -> Option<&ActionPlan> {
        self.plans.get(account)
    }

    pub fn get_mut(&mut self, account: &str) -> Option<&mut ActionPlan> {
        self.plans.get_mut(account)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionPlan)> {
        self.plans.iter().map(|(name, plan)| (name.as_str(), plan))
    }

    pub fn accounts(&self) -> Vec<String> {
        self.plans.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// JSON-file persistence of every account's plan and cursor.
///
/// Only the generator and the sequential plan consumer write it.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the file to `{}`
    pub async fn reset(&self) -> Result<()> {
        self.save_all(&Progress::new()).await
    }

    /// True when no plans are stored. A missing file is created as `{}`.
    pub async fn is_empty(&self) -> Result<bool> {
        if tokio::fs::metadata(&self.path).await.is_err() {
            self.reset().await?;
            return Ok(true);
        }
        Ok(self.load().await?.is_empty())
    }

    /// Replace the whole file with `progress`
    pub async fn save_all(&self, progress: &Progress) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(progress)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Saved {} plans to {}", progress.len(), self.path.display());
        Ok(())
    }

    pub async fn load(&self) -> Result<Progress> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            WayfarerError::Configuration(format!(
                "Can not read progress file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        if raw.trim().is_empty() {
            return Ok(Progress::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the cursor of `account` moved past its completed step.
    /// Returns the updated plan.
    pub async fn advance(&self, account: &str) -> Result<ActionPlan> {
        let mut progress = self.load().await?;
        let plan = progress.get_mut(account).ok_or_else(|| {
            WayfarerError::Internal(format!("Account {} has no plan in progress file", account))
        })?;
        plan.advance();
        let updated = plan.clone();
        self.save_all(&progress).await?;

        if updated.is_complete() {
            info!(account, "Route completed ({} steps)", updated.route.len());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanStep;

    fn temp_store() -> ProgressStore {
        ProgressStore::new(
            std::env::temp_dir()
                .join(format!("wayfarer-progress-{}", uuid::Uuid::new_v4()))
                .join("wallets_progress.json"),
        )
    }

    fn plan(steps: &[(&str, &str)]) -> ActionPlan {
        ActionPlan::new(steps.iter().map(|(a, n)| PlanStep::new(*a, *n)).collect())
    }

    #[tokio::test]
    async fn missing_file_is_created_empty() {
        let store = temp_store();
        assert!(store.is_empty().await.unwrap());
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.trim(), "{}");
    }

    #[tokio::test]
    async fn order_survives_round_trip() {
        let store = temp_store();
        let mut progress = Progress::new();
        progress.insert("zeta", plan(&[("wrap_native", "BeraChain")]));
        progress.insert("alpha", plan(&[("unwrap_native", "BeraChain")]));
        store.save_all(&progress).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.accounts(), vec!["zeta", "alpha"]);
        assert_eq!(loaded, progress);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.find("zeta").unwrap() < raw.find("alpha").unwrap());
    }

    #[test]
    fn replacing_a_plan_keeps_its_position() {
        let mut progress = Progress::new();
        progress.insert("first", plan(&[("wrap_native", "BeraChain")]));
        progress.insert("second", plan(&[("wrap_native", "BeraChain")]));
        progress.insert("first", plan(&[("unwrap_native", "Scroll")]));

        assert_eq!(progress.accounts(), vec!["first", "second"]);
        assert_eq!(progress.get("first").unwrap().route[0], PlanStep::new("unwrap_native", "Scroll"));
    }

    #[tokio::test]
    async fn advance_persists_cursor() {
        let store = temp_store();
        let mut progress = Progress::new();
        progress.insert(
            "main",
            plan(&[("wrap_native", "BeraChain"), ("transfer_eth", "Ethereum")]),
        );
        store.save_all(&progress).await.unwrap();

        let updated = store.advance("main").await.unwrap();
        assert_eq!(updated.current_step, 1);
        assert_eq!(store.load().await.unwrap().get("main").unwrap().current_step, 1);
        assert!(store.advance("ghost").await.is_err());
    }
}
