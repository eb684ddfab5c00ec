//! Filesystem capability: modification times, `touch`, and `unlink`, abstracted behind a trait so
//! the evaluator can be exercised against an in-memory fake.

use std::fs::{self, OpenOptions};
use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A logical modification time in nanoseconds since the epoch.
///
/// `MISSING` (zero) doubles as "not probed yet" and "no such file"; `OLDEST` is the accumulator
/// seed every real mtime exceeds, so a missing target always compares out of date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const MISSING: Self = Self(0);
    pub const OLDEST: Self = Self(1);

    pub fn now() -> Self {
        Self::from_system(SystemTime::now())
    }

    /// One year ahead of now, for `-W`/what-if pinning.
    pub fn far_future() -> Self {
        Self::from_system(SystemTime::now() + Duration::from_secs(365 * 24 * 60 * 60))
    }

    pub fn from_system(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            // Clamp into the "exists" range; a file stamped exactly at the epoch still exists.
            Ok(d) => Self((d.as_nanos() as u64).max(1)),
            // Pre-epoch mtimes also count as existing.
            Err(_) => Self::OLDEST,
        }
    }

    pub fn is_missing(self) -> bool {
        self == Self::MISSING
    }

    #[cfg(test)]
    pub(crate) const fn at(raw: u64) -> Self {
        Self(raw)
    }
}

/// The host capabilities the evaluator consumes.
pub trait FileSystem {
    /// The file's modification time, or `Timestamp::MISSING` when the file does not exist or is
    /// not accessible.
    fn modtime(&self, path: &str) -> Timestamp;

    /// Set the file's modification time to now, creating the file when absent.
    fn touch(&self, path: &str) -> io::Result<()>;

    fn unlink(&self, path: &str) -> io::Result<()>;
}

/// The real filesystem.
pub struct HostFs;

impl FileSystem for HostFs {
    fn modtime(&self, path: &str) -> Timestamp {
        match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => Timestamp::from_system(mtime),
            Err(_) => Timestamp::MISSING,
        }
    }

    fn touch(&self, path: &str) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        file.set_modified(SystemTime::now())
    }

    fn unlink(&self, path: &str) -> io::Result<()> {
        fs::remove_file(path)
    }
}
