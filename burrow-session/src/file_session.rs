//! Local file session storage.
//!
//! Each session is one file, `<app_root>/tmp/<session_id>.session`, holding
//! a JSON snapshot of the session's mapping. Expiry is judged from the
//! file's modification time.
//!
//! Two locks guard the files:
//!
//! - one mutex per [`FileSessionManager`], taken by every load, save and
//!   clear of every session created from that manager. Create a single
//!   manager per process and share it.
//! - an exclusive advisory lock (`flock`) on the open file while it is read
//!   or written, which is what other processes see.
//!
//! The expiry check on load happens before the advisory lock is taken, so
//! two processes sharing a directory can disagree about whether a session
//! has expired.

use crate::config::{SessionConfig, clamp_expire};
use crate::error::{SessionError, SessionResult};
use crate::traits::{BackendFactory, SessionBackend, SessionData, decode_snapshot, encode_snapshot};
use burrow_log::debug;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const LOG_TARGET: &str = "burrow::session::file";
const FILE_SUFFIX: &str = "session";

/// Owns the storage directory and the process-wide file lock, and builds a
/// [`FileSessionStore`] per session.
///
/// # Examples
///
/// ```no_run
/// use burrow_session::{FileSessionManager, Session, DEFAULT_EXPIRE};
/// use std::sync::Arc;
///
/// # fn example() -> burrow_session::SessionResult<()> {
/// // Once at start-up; `/srv/app/tmp` must already exist.
/// let files = Arc::new(FileSessionManager::new("/srv/app"));
///
/// // Per request
/// let mut session = Session::new("4f1c2a", files.as_ref(), DEFAULT_EXPIRE)?;
/// session.set("cart", vec![17, 23])?;
/// session.save()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileSessionManager {
    dir: PathBuf,
    max_expire: Duration,
    lock: Arc<Mutex<()>>,
}

impl FileSessionManager {
    /// Store sessions under `<app_root>/tmp`. The directory is not created.
    pub fn new(app_root: impl AsRef<Path>) -> Self {
        Self::with_max_expire(app_root, SessionConfig::default().max_expire)
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_max_expire(&config.app_root, config.max_expire)
    }

    fn with_max_expire(app_root: impl AsRef<Path>, max_expire: Duration) -> Self {
        Self {
            dir: app_root.as_ref().join("tmp"),
            max_expire,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Directory holding the session files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that stores `session_id`.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", session_id, FILE_SUFFIX))
    }

    /// Delete session files whose modification time is older than
    /// `expire`. Returns how many were removed.
    ///
    /// Runs under the same lock as session I/O.
    pub fn purge_expired(&self, expire: Duration) -> SessionResult<usize> {
        let _guard = self.lock.lock();
        let mut removed = 0;

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_SUFFIX) {
                continue;
            }
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };
            if !metadata.is_file() || !is_older_than(metadata.modified()?, expire) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => debug!(target: LOG_TARGET, "could not purge {}: {}", path.display(), e),
            }
        }

        debug!(target: LOG_TARGET, "purged {} expired session files", removed);
        Ok(removed)
    }

    #[cfg(test)]
    pub(crate) fn lock_for_test(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

impl BackendFactory for FileSessionManager {
    fn create(&self, expire: Duration, session_id: &str) -> SessionResult<Box<dyn SessionBackend>> {
        validate_file_name(session_id)?;
        Ok(Box::new(FileSessionStore {
            path: self.path_for(session_id),
            expire: clamp_expire(expire, self.max_expire),
            lock: Arc::clone(&self.lock),
        }))
    }
}

/// Reject IDs that would name a file outside the session directory.
fn validate_file_name(session_id: &str) -> SessionResult<()> {
    let bad = session_id.is_empty()
        || session_id == "."
        || session_id == ".."
        || session_id.contains(['/', '\\', '\0']);

    if bad {
        return Err(SessionError::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}

fn is_older_than(modified: SystemTime, expire: Duration) -> bool {
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    age.as_secs() > expire.as_secs()
}

/// File backend for one session.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    expire: Duration,
    lock: Arc<Mutex<()>>,
}

impl FileSessionStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_expired(&self) -> SessionResult<bool> {
        match fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_file() => {
                Ok(is_older_than(metadata.modified()?, self.expire))
            }
            Ok(_) => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionBackend for FileSessionStore {
    fn load(&self, data: &mut SessionData) -> SessionResult<()> {
        let _guard = self.lock.lock();

        if self.is_expired()? {
            // The stale file stays on disk until the next save or clear.
            debug!(target: LOG_TARGET, "session expired: {}", self.path.display());
            data.clear();
            return Ok(());
        }

        if !self.path.is_file() {
            data.clear();
            return Ok(());
        }

        let file = File::open(&self.path)?;
        let mut bytes = Vec::new();
        {
            let _flock = FileLock::exclusive(&file)?;
            (&file).read_to_end(&mut bytes)?;
        }

        data.extend(decode_snapshot(&bytes)?);
        debug!(target: LOG_TARGET, "loaded {} keys from {}", data.len(), self.path.display());
        Ok(())
    }

    fn save(&self, data: &SessionData) -> SessionResult<()> {
        let _guard = self.lock.lock();

        let bytes = encode_snapshot(data)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;

        let _flock = FileLock::exclusive(&file)?;
        (&file).write_all(&bytes)?;
        (&file).flush()?;
        file.sync_all()?;

        debug!(target: LOG_TARGET, "saved {} keys to {}", data.len(), self.path.display());
        Ok(())
    }

    fn clear(&self, data: &mut SessionData) -> SessionResult<()> {
        let _guard = self.lock.lock();

        data.clear();
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(target: LOG_TARGET, "ignoring failed removal of {}: {}", self.path.display(), e);
        }
        Ok(())
    }
}

/// Exclusive `flock` held until dropped.
struct FileLock<'a> {
    #[cfg_attr(not(unix), allow(dead_code))]
    file: &'a File,
}

impl<'a> FileLock<'a> {
    #[cfg(unix)]
    fn exclusive(file: &'a File) -> io::Result<Self> {
        use std::os::unix::io::AsRawFd;

        loop {
            // SAFETY: the descriptor is owned by `file`, which outlives the lock.
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
            if rc == 0 {
                return Ok(Self { file });
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    #[cfg(not(unix))]
    fn exclusive(file: &'a File) -> io::Result<Self> {
        Ok(Self { file })
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            // SAFETY: see `exclusive`.
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
    }
}
