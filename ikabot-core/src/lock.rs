//! Advisory lock files for background jobs.
//!
//! A job creates `<dir>/<name>.lock` exclusively before it runs and removes
//! it afterwards. A lock file older than the TTL belongs to a run that died
//! without cleaning up; it is removed and acquisition is retried once.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Held lock. The lock file is removed on drop.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("lock: failed to release {}: {err}", self.path.display()),
        }
    }
}

/// Try to take the lock `name` in `dir`.
///
/// Returns `Ok(None)` while another live run holds it.
pub fn acquire_lock(dir: &Path, name: &str, ttl: Duration) -> Result<Option<LockGuard>, LockError> {
    let io_err = |path: &Path, source| LockError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let path = dir.join(format!("{name}.lock"));

    for attempt in 0..2 {
        match try_create(&path) {
            Ok(()) => return Ok(Some(LockGuard { path })),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if attempt > 0 || !is_stale(&path, ttl) {
                    debug!("lock: {} is held", path.display());
                    return Ok(None);
                }
                warn!("lock: removing stale {}", path.display());
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(io_err(&path, e)),
                }
            }
            Err(err) => return Err(io_err(&path, err)),
        }
    }

    Ok(None)
}

fn try_create(path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let stamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    writeln!(file, "{stamp}")?;
    Ok(())
}

/// A lock whose age cannot be read counts as stale.
fn is_stale(path: &Path, ttl: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age > ttl)
        .unwrap_or(true)
}
