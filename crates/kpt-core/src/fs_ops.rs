use crate::error::{Error, Result};
use log::debug;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub fn read_patch_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a batch of files with all-or-nothing discipline: every text is first
/// staged to a temporary sibling, and only once all stages succeed are they
/// renamed over the originals. A staging failure removes every staged file and
/// leaves all originals untouched.
pub fn write_files(batch: &[(PathBuf, String)]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(batch.len());

    for (path, text) in batch {
        let stage = stage_path(path);
        if let Err(source) = fs::write(&stage, text) {
            discard_staged(&staged);
            let _ = fs::remove_file(&stage);
            return Err(Error::Write {
                path: path.clone(),
                source,
            });
        }
        debug!("Staged {:?} -> {:?}", path, stage);
        staged.push((stage, path.as_path()));
    }

    for (stage, path) in &staged {
        if let Err(source) = fs::rename(stage, path) {
            discard_staged(&staged);
            return Err(Error::Write {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    Ok(())
}

fn discard_staged(staged: &[(PathBuf, &Path)]) {
    for (stage, _) in staged {
        let _ = fs::remove_file(stage);
    }
}

fn stage_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}
