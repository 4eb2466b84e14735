use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;
use tracing::debug;

static DEFAULT_DB_NAME: &str = "studyplan.sqlite3";
static ENV_DATA_DIR: &str = "STUDYPLAN_DATA_DIR";

/// Storage key holding the serialized task collection.
pub static DEFAULT_STORAGE_KEY: &str = "study_tasks";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "studyplan", "studyplan"));

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    db_path: PathBuf,
    storage_key: String,
}

impl AppConfig {
    /// Construct [`AppConfig`] by resolving the data directory using the provided override,
    /// environment variables, and platform defaults.
    pub fn discover(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let (data_dir, source) = resolve_data_dir(
            data_dir_override,
            env::var_os(ENV_DATA_DIR),
            cfg!(debug_assertions),
        )?;
        debug!(path = %data_dir.display(), ?source, "resolved data directory");
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }
        Self::from_data_dir(data_dir)
    }

    /// Construct [`AppConfig`] directly from a resolved data directory.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        let db_path = data_dir.join(DEFAULT_DB_NAME);
        Ok(Self {
            data_dir,
            db_path,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        })
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}

/// Where the data directory came from, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirSource {
    Flag,
    Env,
    DevBuild,
    Platform,
    Home,
    WorkingDir,
}

fn resolve_data_dir(
    data_dir_override: Option<PathBuf>,
    env_dir: Option<OsString>,
    dev_build: bool,
) -> Result<(PathBuf, DataDirSource)> {
    if let Some(dir) = data_dir_override {
        return Ok((dir, DataDirSource::Flag));
    }

    if let Some(dir) = env_dir.filter(|dir| !dir.is_empty()) {
        return Ok((PathBuf::from(dir), DataDirSource::Env));
    }

    if dev_build {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let dev_dir = manifest_dir.join("..").join("tmp").join("dev-studyplan");
        return Ok((dev_dir, DataDirSource::DevBuild));
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok((project.data_dir().to_path_buf(), DataDirSource::Platform));
    }

    if let Some(base) = BaseDirs::new() {
        return Ok((base.home_dir().join(".studyplan"), DataDirSource::Home));
    }

    Ok((env::current_dir()?.join(".studyplan"), DataDirSource::WorkingDir))
}
