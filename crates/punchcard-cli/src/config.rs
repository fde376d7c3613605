//! Runtime configuration: an optional TOML file layered under
//! `PUNCHCARD_*` environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use punchcard_core::settings::AttendanceSettings;
use punchcard_engine::device::DeviceConfig;
use serde::Deserialize;

fn default_store_path() -> PathBuf { PathBuf::from("punchcard.db") }

fn default_buffer_dir() -> PathBuf { PathBuf::from("attendance_logs") }

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Directory holding the per-device, per-day punch buffers.
  #[serde(default = "default_buffer_dir")]
  pub buffer_dir: PathBuf,
  #[serde(default)]
  pub devices:    Vec<DeviceConfig>,
  #[serde(default)]
  pub settings:   AttendanceSettings,
  #[serde(default)]
  pub schedule:   Schedule,
}

/// Job intervals for `punchcard run`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Schedule {
  pub poll_minutes:   u64,
  pub submit_minutes: u64,
  pub mark_minutes:   u64,
  pub cleanup_hours:  u64,
}

impl Default for Schedule {
  fn default() -> Self {
    Self {
      poll_minutes:   15,
      submit_minutes: 30,
      mark_minutes:   60,
      cleanup_hours:  24,
    }
  }
}

impl Schedule {
  pub fn poll(&self) -> Duration { minutes(self.poll_minutes) }

  pub fn submit(&self) -> Duration { minutes(self.submit_minutes) }

  pub fn mark(&self) -> Duration { minutes(self.mark_minutes) }

  pub fn cleanup(&self) -> Duration { minutes(self.cleanup_hours.saturating_mul(60)) }
}

/// Zero would make `tokio::time::interval` panic.
fn minutes(n: u64) -> Duration { Duration::from_secs(n.max(1).saturating_mul(60)) }

/// Load `path` if it exists, then apply `PUNCHCARD_*` overrides, e.g.
/// `PUNCHCARD_STORE_PATH` or `PUNCHCARD_SETTINGS__MIN_WORKING_HOURS`.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("PUNCHCARD")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .with_context(|| format!("failed to read config from {}", path.display()))?;

  settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_values_and_defaults() {
    let path = std::env::temp_dir().join(format!("punchcard-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
      &path,
      r#"
        store_path = "/var/lib/punchcard/att.db"

        [settings]
        enable_regularization = true
        min_working_hours = 6

        [[devices]]
        name = "Front door"
        ip = "10.0.0.5"

        [schedule]
        poll_minutes = 5
      "#,
    )
    .unwrap();

    let cfg = load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/punchcard/att.db"));
    assert_eq!(cfg.buffer_dir, default_buffer_dir());
    assert!(cfg.settings.enable_regularization);
    assert_eq!(cfg.settings.min_working_hours, 6.0);
    assert_eq!(cfg.settings.max_requests_per_month, 3);
    assert_eq!(cfg.devices[0].port, 4370);
    assert_eq!(cfg.schedule.poll(), Duration::from_secs(300));
    assert_eq!(cfg.schedule.submit(), Duration::from_secs(1800));
  }

  #[test]
  fn zero_interval_is_clamped() {
    let s = Schedule {
      poll_minutes: 0,
      ..Schedule::default()
    };
    assert_eq!(s.poll(), Duration::from_secs(60));
  }
}
