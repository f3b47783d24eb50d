//! CLI configuration structures and loaders.
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use behavior_tree::{LibraryConfig, SemaphoreRepository};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub library: LibraryConfig,
    pub run: RunConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of steps to run.
    pub steps: u32,
    /// Seconds the timepiece advances before each step.
    pub delta: f32,
    /// Seed for the tree's random decisions.
    pub seed: Option<u64>,
    /// Named semaphores and their resource counts, for `semaphoreGuard` tasks.
    pub semaphores: BTreeMap<String, usize>,
}

impl RunConfig {
    pub fn semaphore_repository(&self) -> SemaphoreRepository {
        let repository = SemaphoreRepository::new();
        for (name, max) in &self.semaphores {
            repository.add(name.as_str(), *max);
        }
        repository
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            delta: 0.1,
            seed: None,
            semaphores: BTreeMap::new(),
        }
    }
}

impl CliConfig {
    /// Reads `path` if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Environment variables:
    /// - `BTREE_BASE_DIR` - Directory tree references are resolved against
    /// - `BTREE_STEPS` - Number of steps for `run` (default: 10)
    /// - `BTREE_DELTA` - Seconds per step (default: 0.1)
    /// - `BTREE_SEED` - Seed for random decisions (default: entropy)
    /// - `BTREE_DEBUG_LEVEL` - Parser debug output: none, low, high
    pub fn apply_env(&mut self) {
        if let Ok(base_dir) = env::var("BTREE_BASE_DIR") {
            self.library.base_dir = PathBuf::from(base_dir);
        }
        if let Some(steps) = read_env::<u32>("BTREE_STEPS") {
            self.run.steps = steps;
        }
        if let Some(delta) = read_env::<f32>("BTREE_DELTA") {
            self.run.delta = delta.max(0.0);
        }
        if let Some(seed) = read_env::<u64>("BTREE_SEED") {
            self.run.seed = Some(seed);
        }
        if let Some(level) = read_env("BTREE_DEBUG_LEVEL") {
            self.library.debug_level = level;
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
