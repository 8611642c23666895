use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// `--db` value that names neither memory nor a file.
#[derive(Debug)]
pub struct InvalidDbUrl(String);

impl fmt::Display for InvalidDbUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported --db value {:?}: expected a file path or sqlite: URL",
            self.0
        )
    }
}

impl std::error::Error for InvalidDbUrl {}

/// Where the quiz snapshot is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    Memory,
    File(PathBuf),
}

impl DbLocation {
    /// Accepts a bare path, a `sqlite:` or `sqlite://` URL, or `sqlite::memory:`.
    /// Relative paths resolve against the working directory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDbUrl` for other schemes and for URLs without a path.
    pub fn parse(raw: &str) -> Result<Self, InvalidDbUrl> {
        let raw = raw.trim();
        let invalid = || InvalidDbUrl(raw.to_owned());
        if matches!(raw, "sqlite::memory:" | ":memory:") {
            return Ok(Self::Memory);
        }

        let path = match raw.strip_prefix("sqlite:") {
            Some(rest) => rest.strip_prefix("//").unwrap_or(rest),
            None if raw.contains("://") => return Err(invalid()),
            None => raw,
        };
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() {
            return Err(invalid());
        }
        let absolute = std::path::absolute(Path::new(path)).map_err(|_| invalid())?;
        Ok(Self::File(absolute))
    }

    #[must_use]
    pub fn url(&self) -> String {
        match self {
            Self::Memory => "sqlite::memory:".to_owned(),
            Self::File(path) => format!("sqlite://{}", path.display()),
        }
    }

    /// Creates the directory a file database lives in. The file itself is
    /// created when the database is opened.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from creating the directory.
    pub fn ensure_parent_dir(&self) -> io::Result<()> {
        if let Self::File(path) = self {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
