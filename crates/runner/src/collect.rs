use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Copies everything under `src` into `dest`, creating `dest` and any nested
/// directories. Existing files are overwritten. Returns the copied
/// destination paths in sorted order.
pub fn collect_outputs(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    let mut copied = Vec::new();
    copy_dir(src, dest, &mut copied)?;
    Ok(copied)
}

fn copy_dir(src: &Path, dest: &Path, copied: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(src)
        .with_context(|| format!("read {}", src.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&to).with_context(|| format!("create {}", to.display()))?;
            copy_dir(&from, &to, copied)?;
        } else {
            fs::copy(&from, &to)
                .with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
            info!(path = %to.display(), "copied");
            copied.push(to);
        }
    }
    Ok(())
}
