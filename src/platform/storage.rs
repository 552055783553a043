//! Clocked storage and user alerts

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::Result;

/// Named-file storage supplied by the host
pub trait Storage {
    /// Read a document; `Ok(None)` when it does not exist
    fn read(&self, name: &str) -> Result<Option<String>>;
    fn write(&self, name: &str, contents: &str) -> Result<()>;

    fn exists(&self, name: &str) -> bool {
        matches!(self.read(name), Ok(Some(_)))
    }
}

/// Storage rooted at a single local directory
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Storage for DirStorage {
    fn read(&self, name: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(name)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to a temp file first so a crash never leaves half a save
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }
}

/// In-memory storage (tests, headless tools)
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, name: &str, contents: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(name.to_string(), contents.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn read(&self, name: &str) -> Result<Option<String>> {
        Ok(self.files.borrow().get(name).cloned())
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

/// User-visible warnings (the corrupted-save dialog)
pub trait UserAlerts {
    fn warn_user(&mut self, title: &str, message: &str);
}

/// Alerts routed to the log only
#[derive(Debug, Default)]
pub struct LogAlerts;

impl UserAlerts for LogAlerts {
    fn warn_user(&mut self, title: &str, message: &str) {
        log::warn!("[{}] {}", title, message);
    }
}

/// Alerts kept for later inspection
#[derive(Debug, Default)]
pub struct RecordedAlerts {
    pub messages: Vec<(String, String)>,
}

impl UserAlerts for RecordedAlerts {
    fn warn_user(&mut self, title: &str, message: &str) {
        log::warn!("[{}] {}", title, message);
        self.messages.push((title.to_string(), message.to_string()));
    }
}
