//! Size-based rotation for the daemon log file.
//!
//! `rarewatch.log` is rotated once it reaches 10 MiB, keeping at most 5 old
//! copies: `rarewatch.log` → `rarewatch.log.1` → … → `rarewatch.log.5`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;

/// Maximum log file size before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated backup files to keep.
pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_path` if its size is at least `max_bytes`.
///
/// Returns `true` if rotation occurred. A missing file is not an error.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }

    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..max_files).rev() {
        let src = numbered_path(log_path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, numbered_path(log_path, 1))?;
    Ok(true)
}

fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("rarewatch.log");
    base.with_file_name(format!("{name}.{n}"))
}

fn open_append(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

struct LogState {
    file: Option<File>,
    written: u64,
}

/// Append-only log file that rotates itself as it is written to.
///
/// Used as the writer of the file layer in [`init_tracing`](crate::init_tracing).
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    max_files: usize,
    state: Mutex<LogState>,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::with_limits(path, MAX_LOG_BYTES, MAX_ROTATED_FILES)
    }

    pub fn with_limits(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        max_files: usize,
    ) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        rotate_if_needed(&path, max_bytes, max_files)?;
        let (file, written) = open_append(&path)?;
        Ok(Self {
            path,
            max_bytes,
            max_files,
            state: Mutex::new(LogState {
                file: Some(file),
                written,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;

        if state.written >= self.max_bytes || state.file.is_none() {
            // Close before renaming so rotation also works where open files can't move.
            state.file = None;
            rotate_if_needed(&self.path, self.max_bytes, self.max_files)?;
            let (file, written) = open_append(&self.path)?;
            state.file = Some(file);
            state.written = written;
        }

        let Some(file) = state.file.as_mut() else {
            return Err(io::Error::other("log file not open"));
        };
        let n = file.write(buf)?;
        state.written += n as u64;
        Ok(n)
    }
}

pub struct RotatingWriter<'a>(&'a RotatingFile);

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_line(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .0
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_log(dir: &TempDir, name: &str, size_bytes: usize) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, vec![b'x'; size_bytes]).unwrap();
        path
    }

    #[test]
    fn rotation_noop_when_file_under_threshold() {
        let dir = TempDir::new().unwrap();
        let log = make_log(&dir, "rarewatch.log", 10);
        assert!(!rotate_if_needed(&log, 64, 3).unwrap());
        assert!(!numbered_path(&log, 1).exists());
    }

    #[test]
    fn rotation_moves_oversized_file_aside() {
        let dir = TempDir::new().unwrap();
        let log = make_log(&dir, "rarewatch.log", 65);
        assert!(rotate_if_needed(&log, 64, 3).unwrap());
        assert!(!log.exists());
        assert_eq!(fs::metadata(numbered_path(&log, 1)).unwrap().len(), 65);
    }

    #[test]
    fn rotated_copies_are_capped() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("rarewatch.log");
        for n in 1..=3 {
            fs::write(numbered_path(&log, n), format!("rotated-{n}")).unwrap();
        }
        make_log(&dir, "rarewatch.log", 100);

        assert!(rotate_if_needed(&log, 64, 3).unwrap());
        assert_eq!(fs::read_to_string(numbered_path(&log, 3)).unwrap(), "rotated-2");
        assert_eq!(fs::read_to_string(numbered_path(&log, 2)).unwrap(), "rotated-1");
        assert!(!numbered_path(&log, 4).exists());
    }

    #[test]
    fn rotation_skips_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(!rotate_if_needed(&dir.path().join("missing.log"), 64, 3).unwrap());
    }

    #[test]
    fn open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".rarewatch").join("rarewatch.log");
        let log = RotatingFile::open(&path).unwrap();
        log.make_writer().write_all(b"started\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "started\n");
    }

    #[test]
    fn writer_rotates_once_limit_is_reached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rarewatch.log");
        let log = RotatingFile::with_limits(&path, 16, 2).unwrap();

        log.make_writer().write_all(b"first line, long\n").unwrap();
        log.make_writer().write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert_eq!(
            fs::read_to_string(numbered_path(&path, 1)).unwrap(),
            "first line, long\n"
        );
    }

    #[test]
    fn existing_log_is_appended_to() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rarewatch.log");
        fs::write(&path, "earlier run\n").unwrap();

        let log = RotatingFile::open(&path).unwrap();
        log.make_writer().write_all(b"this run\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier run\nthis run\n");
    }
}
