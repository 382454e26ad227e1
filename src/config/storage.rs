//! Collaborators the settings root talks to: file storage, the settings
//! location, and the prompt shown for documents written by a newer version.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::constants::config;

/// File operations used by load and save
pub trait ConfigStorage {
    fn exists(&self, path: &Path) -> bool;

    fn read_text(&self, path: &Path) -> io::Result<String>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Replace `path` with `contents` so readers see either the old or the new file
    fn write_text_atomic(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// Local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl ConfigStorage for FsStorage {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn write_text_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        // Same directory so the final rename never crosses file systems
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Asked whether a document from a newer version may be loaded.
/// Returning false keeps the newer file intact.
pub trait VersionPrompt {
    fn confirm_future_version(&self, found: u32, supported: u32, is_portable: bool) -> bool;
}

impl<F> VersionPrompt for F
where
    F: Fn(u32, u32, bool) -> bool,
{
    fn confirm_future_version(&self, found: u32, supported: u32, is_portable: bool) -> bool {
        self(found, supported, is_portable)
    }
}

/// Prompt with a fixed answer, for non-interactive callers
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl VersionPrompt for FixedAnswer {
    fn confirm_future_version(&self, _found: u32, _supported: u32, _is_portable: bool) -> bool {
        self.0
    }
}

/// The two places a settings document may live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocations {
    /// Next to the executable; a document here turns on portable mode
    pub portable_dir: PathBuf,
    /// Per-user application data
    pub user_dir: PathBuf,
}

impl ConfigLocations {
    pub fn new(portable_dir: impl Into<PathBuf>, user_dir: impl Into<PathBuf>) -> Self {
        Self {
            portable_dir: portable_dir.into(),
            user_dir: user_dir.into(),
        }
    }

    /// `<exe dir>/config` and `<local data dir>/Magnifier/config`
    pub fn from_environment() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let exe_dir = exe
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))?;

        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no local data directory for this user"))?;

        Ok(Self::new(
            exe_dir.join(config::CONFIG_DIR),
            data_dir.join(config::APP_DIR).join(config::CONFIG_DIR),
        ))
    }

    pub fn config_dir(&self, is_portable: bool) -> &Path {
        if is_portable { &self.portable_dir } else { &self.user_dir }
    }

    pub fn config_path(&self, is_portable: bool) -> PathBuf {
        self.config_dir(is_portable).join(config::FILENAME)
    }
}
