// Kit files live next to the samples they reference.
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::loader::sample_loader;
use crate::pipeline::project::KitConfig;

const DRUMMER_DIR: &str = ".drummer";
const KIT_FILE: &str = "kit.json";

// <project_dir>/.drummer/kit.json
pub fn kit_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(DRUMMER_DIR).join(KIT_FILE)
}

/// `Ok(None)` when the directory has no kit yet. A kit that exists but does
/// not parse is an error; we never fall back to defaults over a broken file.
pub fn load_kit(project_dir: &Path) -> anyhow::Result<Option<KitConfig>> {
    let path = kit_file_path(project_dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = serde_json::from_str(&data)
        .with_context(|| format!("malformed kit file {}", path.display()))?;
    tracing::info!(path = %path.display(), "kit loaded");
    Ok(Some(config))
}

// Save the kit to disk, making the files if they don't exist already
pub fn save_kit(project_dir: &Path, config: &KitConfig) -> anyhow::Result<PathBuf> {
    let path = kit_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .drummer/ if needed
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// The default kit, with any WAV files in `project_dir` taking over the
/// built-in drums in file-name order.
pub fn starter_kit(project_dir: &Path) -> anyhow::Result<KitConfig> {
    let mut config = KitConfig::default();
    let wav_paths = sample_loader::index_wav_in_dir(project_dir)
        .with_context(|| format!("failed to list {}", project_dir.display()))?;
    for (entry, path) in config.samples.iter_mut().zip(wav_paths) {
        let relative = path.strip_prefix(project_dir).unwrap_or(&path).to_path_buf();
        tracing::info!(drum = %entry.name, file = %relative.display(), "using sample from project");
        entry.path = Some(relative);
    }
    Ok(config)
}
