//! [`JsonFileBuffer`] keeps the punch buffer as one JSON array per device per
//! day, named `attendance_{device_ip}_{YYYY-MM-DD}.json`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use punchcard_core::{punch::BufferedPunch, store::PunchBuffer};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BufferError {
  #[error("io error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("corrupt buffer {path}: {source}")]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BufferError + '_ {
  move |source| BufferError::Io {
    path: path.to_owned(),
    source,
  }
}

#[derive(Debug, Clone)]
pub struct JsonFileBuffer {
  dir: PathBuf,
}

impl JsonFileBuffer {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn dir(&self) -> &Path { &self.dir }

  pub fn path_for(&self, device_ip: &str, day: NaiveDate) -> PathBuf {
    self
      .dir
      .join(format!("attendance_{device_ip}_{}.json", day.format("%Y-%m-%d")))
  }

  /// The day encoded in a buffer file name, if it is one.
  fn day_of(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name
      .strip_prefix("attendance_")?
      .strip_suffix(".json")?;
    let (_, day) = stem.rsplit_once('_')?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
  }

  async fn read(&self, path: &Path) -> Result<Vec<BufferedPunch>, BufferError> {
    let text = match fs::read_to_string(path).await {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(io_err(path)(e)),
    };
    if text.trim().is_empty() {
      return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|source| BufferError::Json {
      path: path.to_owned(),
      source,
    })
  }
}

impl PunchBuffer for JsonFileBuffer {
  type Error = BufferError;

  async fn append(
    &self,
    device_ip: &str,
    day: NaiveDate,
    punches: &[BufferedPunch],
  ) -> Result<(), BufferError> {
    if punches.is_empty() {
      return Ok(());
    }
    fs::create_dir_all(&self.dir).await.map_err(io_err(&self.dir))?;

    let path = self.path_for(device_ip, day);
    let mut all = self.read(&path).await?;
    all.extend_from_slice(punches);

    let json = serde_json::to_vec_pretty(&all).map_err(|source| BufferError::Json {
      path: path.clone(),
      source,
    })?;
    // Write-then-rename so a crash never leaves a truncated log.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await.map_err(io_err(&tmp))?;
    fs::rename(&tmp, &path).await.map_err(io_err(&path))?;

    debug!(path = %path.display(), appended = punches.len(), total = all.len(), "buffer written");
    Ok(())
  }

  async fn load_all(
    &self,
    device_ip: &str,
    day: NaiveDate,
  ) -> Result<Vec<BufferedPunch>, BufferError> {
    self.read(&self.path_for(device_ip, day)).await
  }

  async fn rotate(&self, keep: NaiveDate) -> Result<usize, BufferError> {
    let mut entries = match fs::read_dir(&self.dir).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
      Err(e) => return Err(io_err(&self.dir)(e)),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await.map_err(io_err(&self.dir))? {
      let name = entry.file_name();
      let Some(day) = name.to_str().and_then(Self::day_of) else {
        continue;
      };
      if day != keep {
        let path = entry.path();
        fs::remove_file(&path).await.map_err(io_err(&path))?;
        debug!(path = %path.display(), "old buffer removed");
        removed += 1;
      }
    }
    Ok(removed)
  }
}
