//! The signed-in session: the bearer token and who it belongs to.
//!
//! A `Session` is created once at startup and handed to the API client;
//! nothing else reads the token. It is persisted as JSON in the data directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Stored {
    token: Option<String>,
    #[serde(default)]
    user_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Session {
    stored: Stored,
    path: Option<PathBuf>,
}

impl Session {
    /// A session that is never written to disk.
    #[cfg(test)]
    pub(crate) fn with_token(token: &str) -> Self {
        Self {
            stored: Stored {
                token: Some(token.to_string()),
                user_id: None,
            },
            path: None,
        }
    }

    /// Load the session stored at `path`. A missing file is a signed-out session.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let stored = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Corrupt session file: {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Stored::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session: {}", path.display()))
            }
        };
        Ok(Self {
            stored,
            path: Some(path.to_path_buf()),
        })
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.stored.token.as_deref().filter(|t| !t.is_empty())
    }

    pub(crate) fn user_id(&self) -> Option<i64> {
        self.stored.user_id
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub(crate) fn sign_in(&mut self, token: String, user_id: Option<i64>) -> Result<()> {
        self.stored = Stored {
            token: Some(token),
            user_id,
        };
        self.save()
    }

    pub(crate) fn sign_out(&mut self) -> Result<()> {
        self.stored = Stored::default();
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove session: {}", path.display())
                    })
                }
            }
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(&self.stored)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // Owner-only from the moment the file exists.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("Failed to open session: {}", path.display()))?;
        // `mode` only applies on creation; tighten a file left by an older version.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(raw.as_bytes())
            .with_context(|| format!("Failed to write session: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
