//! Merge segment files into the output, consuming them as it goes.
//!
//! The first segment file is renamed to the output path; every later file is
//! appended and deleted right away, so peak disk use stays near one output
//! plus one unmerged segment.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Regular files in `temp_dir`, sorted by file name.
pub fn list_segment_files(temp_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(temp_dir)
        .with_context(|| format!("read temp dir {}", temp_dir.display()))?
    {
        let entry = entry.with_context(|| format!("read temp dir {}", temp_dir.display()))?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Concatenates `files` in order into `output`. Any existing output is deleted
/// first. Returns `Ok(false)` when there is nothing to merge.
pub fn merge_segment_files(files: &[PathBuf], output: &Path, chunk_size: usize) -> Result<bool> {
    if output.exists() {
        fs::remove_file(output)
            .with_context(|| format!("remove existing output {}", output.display()))?;
    }
    let Some((first, rest)) = files.split_first() else {
        return Ok(false);
    };

    move_file(first, output)?;
    let mut out = OpenOptions::new()
        .append(true)
        .open(output)
        .with_context(|| format!("open output {}", output.display()))?;
    let mut buf = vec![0u8; chunk_size.max(1)];
    for file in rest {
        let mut src = File::open(file).with_context(|| format!("open {}", file.display()))?;
        loop {
            let n = src
                .read(&mut buf)
                .with_context(|| format!("read {}", file.display()))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])
                .with_context(|| format!("append to {}", output.display()))?;
        }
        drop(src);
        fs::remove_file(file).with_context(|| format!("remove {}", file.display()))?;
        tracing::trace!(file = %file.display(), "segment merged");
    }
    out.sync_all()
        .with_context(|| format!("sync output {}", output.display()))?;
    Ok(true)
}

/// Rename, falling back to copy + delete (e.g. temp dir on another filesystem).
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Err(rename_err) = fs::rename(from, to) {
        tracing::debug!(error = %rename_err, "rename failed, copying {}", from.display());
        fs::copy(from, to).with_context(|| {
            format!("move {} to {}: {}", from.display(), to.display(), rename_err)
        })?;
        fs::remove_file(from).with_context(|| format!("remove {}", from.display()))?;
    }
    Ok(())
}
