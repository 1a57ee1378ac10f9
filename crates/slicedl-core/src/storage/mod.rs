//! Disk layout and file lifecycle for a job.
//!
//! Each segment is appended to its own file in the job's temp directory,
//! named by its zero-padded ordinal so lexicographic order equals merge order.
//! The temp directory is wiped at job start and removed at job end.

mod merge;

pub use merge::{list_segment_files, merge_segment_files};

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix of the default temp directory next to the output file.
pub const PARTS_SUFFIX: &str = ".parts";

/// Segment files a job may create; ordinals above this would outgrow the
/// five-digit names and break lexicographic merge order.
pub const MAX_SEGMENT_FILES: u64 = 100_000;

/// File name for a segment: five-digit zero-padded ordinal (`00007`).
pub fn segment_file_name(ordinal: usize) -> String {
    format!("{:05}", ordinal)
}

pub fn segment_path(temp_dir: &Path, ordinal: usize) -> PathBuf {
    temp_dir.join(segment_file_name(ordinal))
}

/// Default temp directory: appends `.parts` to the output path (`file.iso` -> `file.iso.parts`).
pub fn parts_dir(output_path: &Path) -> PathBuf {
    let mut o = output_path.as_os_str().to_owned();
    o.push(PARTS_SUFFIX);
    PathBuf::from(o)
}

/// Deletes `dir` and everything in it, then creates it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    wipe_dir(dir)?;
    fs::create_dir_all(dir).with_context(|| format!("create temp dir {}", dir.display()))?;
    Ok(())
}

/// Deletes `dir` recursively. A missing directory is not an error.
pub fn wipe_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove temp dir {}", dir.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_names_are_zero_padded() {
        assert_eq!(segment_file_name(0), "00000");
        assert_eq!(segment_file_name(7), "00007");
        assert_eq!(segment_file_name(12345), "12345");
        assert!(segment_file_name(9) < segment_file_name(10));
    }

    #[test]
    fn names_keep_width_up_to_segment_limit() {
        let last = (MAX_SEGMENT_FILES - 1) as usize;
        assert_eq!(segment_file_name(last), "99999");
        assert!(segment_file_name(last - 1) < segment_file_name(last));
        assert!(segment_file_name(last).len() == segment_file_name(0).len());
    }

    #[test]
    fn parts_dir_appends_suffix() {
        let p = parts_dir(Path::new("file.iso"));
        assert_eq!(p.to_string_lossy(), "file.iso.parts");
        let p2 = parts_dir(Path::new("/tmp/archive.zip"));
        assert_eq!(p2.to_string_lossy(), "/tmp/archive.zip.parts");
    }

    #[test]
    fn reset_wipes_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("parts");
        fs::create_dir_all(temp.join("nested")).unwrap();
        fs::write(temp.join("00000"), b"stale").unwrap();
        reset_dir(&temp).unwrap();
        assert!(temp.is_dir());
        assert_eq!(fs::read_dir(&temp).unwrap().count(), 0);
    }

    #[test]
    fn wipe_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("never-created");
        wipe_dir(&temp).unwrap();
        assert!(!temp.exists());
    }
}
