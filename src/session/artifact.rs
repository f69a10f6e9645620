use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// A converted file waiting to be saved.
///
/// The contents live in a temp file until [`persist_in`](Self::persist_in)
/// copies them out. Dropping or [`release`](Self::release)-ing the artifact
/// removes the temp file.
#[derive(Debug)]
pub struct DownloadArtifact {
    file: NamedTempFile,
    file_name: String,
    len: u64,
}

impl DownloadArtifact {
    pub fn stage(file_name: impl Into<String>, contents: &str) -> Result<Self> {
        let file_name = file_name.into();
        let mut file = tempfile::Builder::new()
            .prefix("timefix-")
            .suffix(".csv")
            .tempfile()
            .context("creating staging file")?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("writing staged {}", file_name))?;
        file.flush()?;
        debug!(name = %file_name, path = %file.path().display(), "staged artifact");
        Ok(Self {
            file,
            file_name,
            len: contents.len() as u64,
        })
    }

    /// Suggested name for the saved file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &'static str {
        CSV_MIME
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Where the staged bytes currently live.
    pub fn staged_path(&self) -> &Path {
        self.file.path()
    }

    pub fn contents(&self) -> Result<String> {
        fs::read_to_string(self.file.path())
            .with_context(|| format!("reading staged {}", self.file_name))
    }

    /// Copy the staged bytes to `dir/<file_name>`, overwriting any file there.
    pub fn persist_in(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {:?}", dir))?;
        }
        let target = dir.join(&self.file_name);
        fs::copy(self.file.path(), &target)
            .with_context(|| format!("saving {} to {:?}", self.file_name, target))?;
        info!(path = %target.display(), bytes = self.len, "saved");
        Ok(target)
    }

    pub fn release(self) -> Result<()> {
        let name = self.file_name;
        self.file
            .close()
            .with_context(|| format!("removing staged {}", name))?;
        debug!(name = %name, "released artifact");
        Ok(())
    }
}
