use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use taskflow_shared::{Category, Task, User};
use tracing::{debug, info};

const TASKS_SEED: &str = include_str!("../fixtures/tasks.json");
const CATEGORIES_SEED: &str = include_str!("../fixtures/categories.json");
const USERS_SEED: &str = include_str!("../fixtures/users.json");

pub const TASKS_FILE: &str = "tasks.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const USERS_FILE: &str = "users.json";

/// Seed contents for the three in-memory collections.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
    pub users: Vec<User>,
}

impl Fixtures {
    #[tracing::instrument]
    pub fn embedded() -> anyhow::Result<Self> {
        let fixtures = Self {
            tasks: parse_seed(TASKS_SEED, TASKS_FILE)?,
            categories: parse_seed(CATEGORIES_SEED, CATEGORIES_FILE)?,
            users: parse_seed(USERS_SEED, USERS_FILE)?,
        };
        debug!(
            tasks = fixtures.tasks.len(),
            categories = fixtures.categories.len(),
            users = fixtures.users.len(),
            "parsed embedded fixtures"
        );
        Ok(fixtures)
    }

    /// Reads `tasks.json`, `categories.json` and `users.json` from `dir`.
    /// A missing file seeds an empty collection.
    #[tracing::instrument(skip(dir), fields(dir = %dir.display()))]
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        let fixtures = Self {
            tasks: load_seed_file(&dir.join(TASKS_FILE))?,
            categories: load_seed_file(&dir.join(CATEGORIES_FILE))?,
            users: load_seed_file(&dir.join(USERS_FILE))?,
        };
        info!(
            tasks = fixtures.tasks.len(),
            categories = fixtures.categories.len(),
            users = fixtures.users.len(),
            "loaded fixtures from directory"
        );
        Ok(fixtures)
    }

    pub fn load(dir: Option<&Path>) -> anyhow::Result<Self> {
        match dir {
            Some(dir) => Self::load_dir(dir),
            None => Self::embedded(),
        }
    }
}

fn parse_seed<T: DeserializeOwned>(raw: &str, name: &str) -> anyhow::Result<Vec<T>> {
    serde_json::from_str(raw).with_context(|| format!("failed parsing {name}"))
}

fn load_seed_file<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    if !path.exists() {
        debug!(file = %path.display(), "seed file missing; starting empty");
        return Ok(vec![]);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_seed(&raw, &path.display().to_string())
}
