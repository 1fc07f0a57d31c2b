//! In-memory catalog of configs and runs
//!
//! Both store implementations keep their data in a [`Catalog`]; the file
//! store additionally serializes it after every change.

use barrage_config::Validatable;
use barrage_engine::{Run, StressTestConfig};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Runs kept per profile unless configured otherwise
pub const DEFAULT_MAX_RUNS_PER_PROFILE: usize = 100;

/// All stored configs and runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    next_config_id: i64,
    #[serde(default)]
    configs: Vec<StressTestConfig>,
    #[serde(default)]
    runs: Vec<Run>,
    #[serde(skip, default = "default_max_runs")]
    max_runs_per_profile: usize,
}

fn default_max_runs() -> usize {
    DEFAULT_MAX_RUNS_PER_PROFILE
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RUNS_PER_PROFILE)
    }
}

impl Catalog {
    pub fn new(max_runs_per_profile: usize) -> Self {
        Self {
            next_config_id: 1,
            configs: Vec::new(),
            runs: Vec::new(),
            max_runs_per_profile,
        }
    }

    /// Change the retention cap; `0` keeps every run
    pub fn set_retention(&mut self, max_runs_per_profile: usize) {
        self.max_runs_per_profile = max_runs_per_profile;
    }

    pub fn save_config(&mut self, mut config: StressTestConfig) -> StoreResult<StressTestConfig> {
        if config.is_scratch() {
            return Err(StoreError::Validation(
                "config name cannot be empty".to_string(),
            ));
        }
        config.name = config.name.trim().to_string();
        config
            .validate()
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let duplicate = self.configs.iter().any(|existing| {
            existing.profile_name == config.profile_name
                && existing.name == config.name
                && existing.id != config.id
        });
        if duplicate {
            return Err(StoreError::Constraint(format!(
                "config '{}' already exists in profile '{}'",
                config.name, config.profile_name
            )));
        }

        config.updated_at = Some(Utc::now());

        match config.id {
            Some(id) => {
                let slot = self
                    .configs
                    .iter_mut()
                    .find(|existing| existing.id == Some(id))
                    .ok_or_else(|| StoreError::NotFound(format!("config {}", id)))?;
                *slot = config.clone();
                debug!(config_id = id, name = %config.name, "Updated config");
            }
            None => {
                // Ids are never reused, even after deletes
                let id = self
                    .configs
                    .iter()
                    .filter_map(|c| c.id)
                    .max()
                    .map_or(1, |max| max + 1)
                    .max(self.next_config_id);
                self.next_config_id = id + 1;
                config.id = Some(id);
                self.configs.push(config.clone());
                debug!(config_id = id, name = %config.name, "Created config");
            }
        }

        Ok(config)
    }

    pub fn list_configs(&self, profile: &str) -> Vec<StressTestConfig> {
        let mut configs: Vec<_> = self
            .configs
            .iter()
            .filter(|c| c.profile_name == profile)
            .cloned()
            .collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
    }

    pub fn get_config(&self, id: i64) -> StoreResult<StressTestConfig> {
        self.configs
            .iter()
            .find(|c| c.id == Some(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("config {}", id)))
    }

    pub fn get_config_by_name(&self, profile: &str, name: &str) -> StoreResult<StressTestConfig> {
        self.configs
            .iter()
            .find(|c| c.profile_name == profile && c.name == name)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("config '{}' in profile '{}'", name, profile))
            })
    }

    pub fn delete_config(&mut self, id: i64) -> StoreResult<()> {
        let before = self.configs.len();
        self.configs.retain(|c| c.id != Some(id));
        if self.configs.len() == before {
            return Err(StoreError::NotFound(format!("config {}", id)));
        }
        Ok(())
    }

    pub fn save_run(&mut self, run: Run) -> StoreResult<()> {
        if !run.status.is_terminal() {
            return Err(StoreError::Constraint(format!(
                "run {} is still {}; only finished runs can be saved",
                run.id, run.status
            )));
        }

        let profile = run.profile_name.clone();
        match self.runs.iter_mut().find(|r| r.id == run.id) {
            Some(existing) => *existing = run,
            None => self.runs.push(run),
        }
        self.enforce_retention(&profile);
        Ok(())
    }

    /// Drop the oldest runs of a profile beyond the retention cap
    fn enforce_retention(&mut self, profile: &str) {
        if self.max_runs_per_profile == 0 {
            return;
        }

        let mut ages: Vec<_> = self
            .runs
            .iter()
            .filter(|r| r.profile_name == profile)
            .map(|r| (r.started_at, r.id))
            .collect();
        if ages.len() <= self.max_runs_per_profile {
            return;
        }

        ages.sort_by_key(|&(started, _)| Reverse(started));
        let expired: Vec<Uuid> = ages
            .into_iter()
            .skip(self.max_runs_per_profile)
            .map(|(_, id)| id)
            .collect();

        debug!(profile, expired = expired.len(), "Pruning old runs");
        self.runs.retain(|r| !expired.contains(&r.id));
    }

    pub fn list_runs(&self, profile: &str, limit: usize) -> Vec<Run> {
        let mut runs: Vec<_> = self
            .runs
            .iter()
            .filter(|r| r.profile_name == profile)
            .cloned()
            .collect();
        runs.sort_by_key(|r| Reverse(r.started_at));
        if limit > 0 {
            runs.truncate(limit);
        }
        runs
    }

    pub fn get_run(&self, id: Uuid) -> StoreResult<Run> {
        self.runs
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("run {}", id)))
    }

    pub fn delete_run(&mut self, id: Uuid) -> StoreResult<()> {
        let before = self.runs.len();
        self.runs.retain(|r| r.id != id);
        if self.runs.len() == before {
            return Err(StoreError::NotFound(format!("run {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barrage_engine::RunStatus;
    use chrono::Duration;

    fn config(name: &str) -> StressTestConfig {
        StressTestConfig::new(5, 100)
            .with_name(name)
            .with_request_file("requests/ping.yaml")
    }

    fn finished_run(profile: &str, minutes_ago: i64) -> Run {
        let mut run = Run::start(&config("ping").with_profile(profile));
        run.started_at = Utc::now() - Duration::minutes(minutes_ago);
        run.status = RunStatus::Completed;
        run.completed_at = Some(run.started_at + Duration::seconds(5));
        run
    }

    #[test]
    fn test_save_assigns_ids_and_updates() {
        let mut catalog = Catalog::default();
        let first = catalog.save_config(config("alpha")).unwrap();
        let second = catalog.save_config(config("beta")).unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert!(first.updated_at.is_some());

        let mut edited = first.clone();
        edited.total_requests = 500;
        catalog.save_config(edited).unwrap();
        assert_eq!(catalog.get_config(1).unwrap().total_requests, 500);
        assert_eq!(catalog.list_configs("default").len(), 2);
    }

    #[test]
    fn test_names_unique_per_profile() {
        let mut catalog = Catalog::default();
        catalog.save_config(config("alpha")).unwrap();

        let err = catalog.save_config(config("alpha")).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        // Same name in another profile is fine
        catalog
            .save_config(config("alpha").with_profile("staging"))
            .unwrap();
        assert_eq!(
            catalog
                .get_config_by_name("staging", "alpha")
                .unwrap()
                .profile_name,
            "staging"
        );
    }

    #[test]
    fn test_scratch_and_invalid_configs_rejected() {
        let mut catalog = Catalog::default();
        assert!(matches!(
            catalog.save_config(config("   ")),
            Err(StoreError::Validation(_))
        ));

        let mut bad = config("bad");
        bad.concurrent_conns = 0;
        assert!(matches!(
            catalog.save_config(bad),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_update_of_unknown_id_is_not_found() {
        let mut catalog = Catalog::default();
        let mut ghost = config("ghost");
        ghost.id = Some(42);
        assert!(catalog.save_config(ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut catalog = Catalog::default();
        let saved = catalog.save_config(config("alpha")).unwrap();
        catalog.delete_config(saved.id.unwrap()).unwrap();
        assert!(catalog.delete_config(saved.id.unwrap()).is_err());

        let again = catalog.save_config(config("alpha")).unwrap();
        assert_eq!(again.id, Some(2));
    }

    #[test]
    fn test_only_terminal_runs_saved() {
        let mut catalog = Catalog::default();
        let running = Run::start(&config("ping"));
        assert!(matches!(
            catalog.save_run(running),
            Err(StoreError::Constraint(_))
        ));
    }

    #[test]
    fn test_list_runs_newest_first_with_limit() {
        let mut catalog = Catalog::default();
        let old = finished_run("default", 30);
        let new = finished_run("default", 1);
        let other = finished_run("staging", 0);
        catalog.save_run(old.clone()).unwrap();
        catalog.save_run(new.clone()).unwrap();
        catalog.save_run(other).unwrap();

        let runs = catalog.list_runs("default", 0);
        assert_eq!(
            runs.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![new.id, old.id]
        );
        assert_eq!(catalog.list_runs("default", 1)[0].id, new.id);

        catalog.delete_run(new.id).unwrap();
        assert!(catalog.get_run(new.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_retention_prunes_oldest_runs() {
        let mut catalog = Catalog::new(2);
        let runs: Vec<_> = (0..4).map(|i| finished_run("default", 40 - i * 10)).collect();
        for run in &runs {
            catalog.save_run(run.clone()).unwrap();
        }
        catalog.save_run(finished_run("staging", 100)).unwrap();

        let kept: Vec<_> = catalog.list_runs("default", 0).iter().map(|r| r.id).collect();
        assert_eq!(kept, vec![runs[3].id, runs[2].id]);
        assert_eq!(catalog.list_runs("staging", 0).len(), 1);
    }
}
