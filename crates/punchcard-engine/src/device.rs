//! The device collaborator: connect to a time clock, read its punch log,
//! disconnect. Transports implement [`DeviceConnector`].

use std::{future::Future, time::Duration};

use punchcard_core::punch::RawPunch;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DeviceError;

fn default_port() -> u16 { 4370 }

fn default_timeout_secs() -> u64 { 10 }

/// One biometric device to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
  #[serde(default)]
  pub name:         Option<String>,
  pub ip:           String,
  #[serde(default = "default_port")]
  pub port:         u16,
  /// Upper bound on one whole fetch: connect, read and disconnect.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  #[serde(default)]
  pub username:     Option<String>,
  #[serde(default)]
  pub password:     Option<String>,
}

impl DeviceConfig {
  pub fn new(ip: impl Into<String>) -> Self {
    Self {
      name:         None,
      ip:           ip.into(),
      port:         default_port(),
      timeout_secs: default_timeout_secs(),
      username:     None,
      password:     None,
    }
  }

  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// Human-facing name for logs and reports.
  pub fn label(&self) -> String {
    match &self.name {
      Some(name) => format!("{name} ({}:{})", self.ip, self.port),
      None => format!("{}:{}", self.ip, self.port),
    }
  }
}

/// An open connection to one device.
pub trait DeviceSession: Send {
  /// Every punch currently held in device memory.
  fn get_punches(
    &mut self,
  ) -> impl Future<Output = Result<Vec<RawPunch>, DeviceError>> + Send + '_;

  fn disconnect(self) -> impl Future<Output = ()> + Send;
}

pub trait DeviceConnector: Send + Sync {
  type Session: DeviceSession;

  fn connect<'a>(
    &'a self,
    device: &'a DeviceConfig,
  ) -> impl Future<Output = Result<Self::Session, DeviceError>> + Send + 'a;
}

/// Connect, read every punch and disconnect, all within the device's
/// timeout. The session is disconnected even when reading fails.
pub async fn fetch_punches<C: DeviceConnector>(
  connector: &C,
  device: &DeviceConfig,
) -> Result<Vec<RawPunch>, DeviceError> {
  let limit = device.timeout();
  let fetch = async {
    let mut session = connector.connect(device).await?;
    let punches = session.get_punches().await;
    session.disconnect().await;
    punches
  };

  let punches = tokio::time::timeout(limit, fetch)
    .await
    .map_err(|_| DeviceError::Timeout {
      device: device.label(),
      after:  limit,
    })??;
  debug!(device = %device.label(), count = punches.len(), "punches fetched");
  Ok(punches)
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Stalled;

  struct StalledSession;

  impl DeviceSession for StalledSession {
    async fn get_punches(&mut self) -> Result<Vec<RawPunch>, DeviceError> {
      tokio::time::sleep(Duration::from_secs(3600)).await;
      Ok(Vec::new())
    }

    async fn disconnect(self) {}
  }

  impl DeviceConnector for Stalled {
    type Session = StalledSession;

    async fn connect(&self, _device: &DeviceConfig) -> Result<StalledSession, DeviceError> {
      Ok(StalledSession)
    }
  }

  #[test]
  fn config_defaults() {
    let d: DeviceConfig = serde_json::from_str(r#"{"ip":"10.0.0.5"}"#).unwrap();
    assert_eq!(d, DeviceConfig::new("10.0.0.5"));
    assert_eq!(d.timeout(), Duration::from_secs(10));
    assert_eq!(d.label(), "10.0.0.5:4370");
  }

  #[tokio::test(start_paused = true)]
  async fn stalled_device_times_out() {
    let device = DeviceConfig {
      timeout_secs: 2,
      ..DeviceConfig::new("10.0.0.9")
    };
    let err = fetch_punches(&Stalled, &device).await.unwrap_err();
    assert!(matches!(err, DeviceError::Timeout { after, .. } if after == Duration::from_secs(2)));
  }
}
