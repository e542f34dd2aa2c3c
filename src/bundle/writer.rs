//! First-writer-wins persistence of bundle files.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{self, ErrorKind, Write};
use std::path::Path;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::models::WriteOutcome;

const DEFAULT_STRIPES: usize = 16;

/// Writes bundle files at most once per destination.
///
/// The existence check and the write happen under the same lock. Locks are striped by
/// destination path, so writes to different bundles rarely contend while two threads writing
/// the same bundle are always serialised. Content goes to a temporary file in the destination
/// directory first and is renamed into place without clobbering, so readers never observe a
/// partially written bundle, and a file created meanwhile by another process is kept.
#[derive(Debug)]
pub struct BundleWriter {
  stripes: Vec<Mutex<()>>,
}

impl Default for BundleWriter {
  fn default() -> Self {
    Self::with_stripes(DEFAULT_STRIPES)
  }
}

impl BundleWriter {
  /// Create a writer with the default number of lock stripes.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a writer with `count` lock stripes. A single stripe gives one process-wide lock.
  pub fn with_stripes(count: usize) -> Self {
    Self {
      stripes: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
    }
  }

  /// Write `content` to `destination` unless a file already exists there.
  pub fn write_once(&self, destination: &Path, content: &str) -> io::Result<WriteOutcome> {
    let _guard = self.stripe_for(destination).lock();

    if destination.exists() {
      return Ok(WriteOutcome::AlreadyPresent);
    }

    let directory = match destination.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(directory)?;
    staged.write_all(content.as_bytes())?;
    staged.flush()?;

    match staged.persist_noclobber(destination) {
      Ok(_) => Ok(WriteOutcome::Written),
      Err(err) if err.error.kind() == ErrorKind::AlreadyExists => Ok(WriteOutcome::AlreadyPresent),
      Err(err) => Err(err.error),
    }
  }

  fn stripe_for(&self, destination: &Path) -> &Mutex<()> {
    let mut hasher = DefaultHasher::new();
    destination.hash(&mut hasher);
    let index = (hasher.finish() % self.stripes.len() as u64) as usize;
    &self.stripes[index]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::sync::Arc;
  use std::thread;
  use tempfile::tempdir;

  #[test]
  fn writes_missing_files() -> io::Result<()> {
    let temp = tempdir()?;
    let destination = temp.path().join("abc.js");

    let outcome = BundleWriter::new().write_once(&destination, "var a=1;\n")?;

    assert_eq!(outcome, WriteOutcome::Written);
    assert_eq!(fs::read_to_string(&destination)?, "var a=1;\n");
    Ok(())
  }

  #[test]
  fn never_overwrites_existing_files() -> io::Result<()> {
    let temp = tempdir()?;
    let destination = temp.path().join("abc.css");
    fs::write(&destination, "original")?;

    let outcome = BundleWriter::with_stripes(1).write_once(&destination, "replacement")?;

    assert_eq!(outcome, WriteOutcome::AlreadyPresent);
    assert_eq!(fs::read_to_string(&destination)?, "original");
    Ok(())
  }

  #[test]
  fn leaves_no_staging_files_behind() -> io::Result<()> {
    let temp = tempdir()?;
    let writer = BundleWriter::new();
    writer.write_once(&temp.path().join("one.js"), "1")?;
    writer.write_once(&temp.path().join("one.js"), "1")?;

    let entries: Vec<_> = fs::read_dir(temp.path())?.collect::<Result<_, _>>()?;
    assert_eq!(entries.len(), 1);
    Ok(())
  }

  #[test]
  fn reports_missing_directories() {
    let temp = tempdir().unwrap();
    let destination = temp.path().join("missing").join("abc.js");
    assert!(BundleWriter::new().write_once(&destination, "x").is_err());
  }

  #[test]
  fn concurrent_writers_produce_one_complete_file() -> io::Result<()> {
    let temp = tempdir()?;
    let destination = Arc::new(temp.path().join("shared.js"));
    let writer = Arc::new(BundleWriter::new());
    let content = Arc::new("x".repeat(64 * 1024));

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let writer = Arc::clone(&writer);
        let destination = Arc::clone(&destination);
        let content = Arc::clone(&content);
        thread::spawn(move || writer.write_once(&destination, &content))
      })
      .collect();

    let mut written = 0;
    for handle in handles {
      if handle.join().expect("writer thread panicked")? == WriteOutcome::Written {
        written += 1;
      }
    }

    assert_eq!(written, 1);
    assert_eq!(fs::read_to_string(destination.as_path())?, *content);
    Ok(())
  }
}
