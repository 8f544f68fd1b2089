use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Delete zero-byte files left behind by aborted pipeline runs, walking
/// each directory recursively.
pub fn run(directories: Vec<PathBuf>) -> Result<()> {
    for directory in &directories {
        remove_empty_files(directory)?;
    }
    Ok(())
}

fn remove_empty_files(directory: &Path) -> Result<()> {
    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("Failed to read directory {}", directory.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            remove_empty_files(&path)?;
        } else if entry.metadata()?.len() == 0 {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            println!("Removed empty file: {}", path.display());
        }
    }
    Ok(())
}
