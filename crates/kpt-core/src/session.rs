use crate::error::Result;
use crate::fs_ops;
use crate::parser;
use crate::serializer;
use crate::types::{PatchFile, PatchStatus};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// In-memory state for one batch of patch files: the working copy the caller
/// mutates through toggles, and the baseline snapshot taken at load time. The
/// baseline is only ever read, to hand out fresh copies on restore.
#[derive(Debug)]
pub struct Session {
    files: Vec<PatchFile>,
    baseline: Vec<PatchFile>,
}

impl Session {
    /// Read and parse every path up front. Any read or parse failure aborts
    /// the whole load; no partial session is kept.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Session> {
        let mut baseline = Vec::with_capacity(paths.len());

        for path in paths {
            let path = path.as_ref();
            let text = fs_ops::read_patch_file(path)?;
            let options = parser::parse(path, &text)?;
            info!("Loaded {} options from {:?}", options.len(), path);
            baseline.push(PatchFile {
                path: path.to_path_buf(),
                text,
                options,
            });
        }

        Ok(Session {
            files: baseline.clone(),
            baseline,
        })
    }

    /// Build a session from already-parsed files, for callers that own their
    /// file I/O.
    pub fn from_files(files: Vec<PatchFile>) -> Session {
        Session {
            baseline: files.clone(),
            files,
        }
    }

    pub fn files(&self) -> &[PatchFile] {
        &self.files
    }

    /// Set one option's status, matched by file path and stable id. An
    /// unknown path or id is ignored.
    pub fn set_status(&mut self, path: &Path, id: usize, status: PatchStatus) {
        let option = self
            .files
            .iter_mut()
            .find(|file| file.path == path)
            .and_then(|file| file.options.iter_mut().find(|opt| opt.id == id));

        match option {
            Some(opt) => opt.status = status,
            None => debug!("Ignoring toggle for unknown option {} in {:?}", id, path),
        }
    }

    /// Name-based convenience for front-ends; reports whether anything
    /// matched so the caller can surface a miss.
    pub fn set_status_by_name(&mut self, path: &Path, name: &str, status: PatchStatus) -> bool {
        let option = self
            .files
            .iter_mut()
            .find(|file| file.path == path)
            .and_then(|file| file.options.iter_mut().find(|opt| opt.name == name));

        match option {
            Some(opt) => {
                opt.status = status;
                true
            }
            None => {
                debug!("No option named '{}' in {:?}", name, path);
                false
            }
        }
    }

    pub fn disable_all(&mut self) {
        for file in &mut self.files {
            for option in &mut file.options {
                option.status = PatchStatus::Disabled;
            }
        }
    }

    /// Drop all edits and replace the working copy with a fresh copy of the
    /// baseline.
    pub fn restore_defaults(&mut self) {
        self.files = self.baseline.clone();
    }

    pub fn modified_files(&self) -> Vec<&PatchFile> {
        self.files.iter().filter(|file| file.is_modified()).collect()
    }

    pub fn is_modified(&self) -> bool {
        self.files.iter().any(|file| file.is_modified())
    }

    /// Serialize every modified file, then commit the batch to disk
    /// all-or-nothing. Returns the paths that were written. A serialization
    /// failure on any file means no file is touched; in-memory edits survive
    /// so the caller can retry.
    pub fn apply(&self) -> Result<Vec<PathBuf>> {
        let mut batch = Vec::new();
        for file in self.files.iter().filter(|file| file.is_modified()) {
            batch.push((file.path.clone(), serializer::render(file)?));
        }

        if batch.is_empty() {
            info!("No status changes to write");
            return Ok(Vec::new());
        }

        fs_ops::write_files(&batch)?;
        info!("Wrote {} patch file(s)", batch.len());
        Ok(batch.into_iter().map(|(path, _)| path).collect())
    }
}
