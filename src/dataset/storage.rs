use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::Serialize;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use super::types::{CumulativeDataset, DATASET_VERSION};

/// Load the persisted dataset.
///
/// A missing file returns `None`, which the caller reports as a first run.
/// A file that exists but cannot be decoded is an error.
pub fn load_dataset(path: &Path) -> Result<Option<CumulativeDataset>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to open dataset at {}", path.display()))
        }
    };

    let dataset: CumulativeDataset = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load dataset from {}", path.display()))?;

    if dataset.version != DATASET_VERSION {
        anyhow::bail!("Unsupported dataset version: {}", dataset.version);
    }

    tracing::debug!(path = %path.display(), records = dataset.len(), "loaded dataset");
    Ok(Some(dataset))
}

/// Write `value` as pretty JSON, atomically. Parent directories are created
/// as needed.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;

    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(())
}

/// Save the dataset atomically so a crash never leaves a half-written file.
pub fn save_dataset(path: &Path, dataset: &CumulativeDataset) -> Result<()> {
    write_json_atomic(path, dataset)?;
    tracing::debug!(path = %path.display(), records = dataset.len(), "saved dataset");
    Ok(())
}

/// Save the copy sorted by test and score that operators review before
/// the results phase.
pub fn save_final_dataset(path: &Path, dataset: &CumulativeDataset) -> Result<()> {
    save_dataset(path, &dataset.sorted_by_test_and_score())
}
