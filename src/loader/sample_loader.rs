use std::path::Path;

use super::builtin;
use crate::audio::{SampleBank, load_wav};
use crate::error::KitError;
use crate::pipeline::project::SampleEntry;

// Build the bank for a kit: WAV files relative to `base_dir`, or built-ins by name
pub fn load_bank(entries: &[SampleEntry], base_dir: &Path, sample_rate: u32) -> Result<SampleBank, KitError> {
    let mut bank = SampleBank::new();
    for entry in entries {
        let waveform = match &entry.path {
            Some(path) => load_wav(&base_dir.join(path), sample_rate)?,
            None => builtin::waveform(&entry.name, sample_rate)?,
        };
        let id = bank.insert(&entry.name, &waveform)?;
        tracing::debug!(
            name = %entry.name,
            id = id.0,
            frames = waveform.len(),
            source = %entry.path.as_ref().map_or(String::from("builtin"), |p| p.display().to_string()),
            "sample loaded"
        );
    }
    Ok(bank)
}

// Every *.wav in a directory, sorted by file name
pub fn index_wav_in_dir(dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
