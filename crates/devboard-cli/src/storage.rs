use std::path::{Path, PathBuf};

use crate::config::Config;
use color_eyre::Result;
use devboard_storage::JsonFileStore;
use dirs::data_dir;
use tracing::debug;

pub const TASKS_FILE_ENV: &str = "DEVBOARD_TASKS_FILE";

/// Resolve the default tasks file for Devboard.
pub fn default_tasks_file() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("devboard").join("tasks.json"))
}

/// Pick the tasks file: explicit flag, then environment, then config, then the
/// platform data dir.
pub fn resolve_tasks_file(
    flag: Option<&Path>,
    env: Option<PathBuf>,
    config: &Config,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = &config.tasks_file {
        return Ok(path.clone());
    }
    default_tasks_file()
}

/// Build the file store honoring flag, environment and config overrides.
pub fn store_from_config(flag: Option<&Path>, config: &Config) -> Result<JsonFileStore> {
    let env = std::env::var_os(TASKS_FILE_ENV).map(PathBuf::from);
    let path = resolve_tasks_file(flag, env, config)?;
    debug!(?path, "using tasks file");
    Ok(JsonFileStore::new(path))
}
