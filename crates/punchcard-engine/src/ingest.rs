//! Punch ingestion: raw device punches → the per-device, per-day buffer.

use std::collections::HashSet;

use chrono::NaiveDate;
use punchcard_core::{
  punch::{BufferedPunch, RawPunch},
  store::PunchBuffer,
};
use tracing::debug;

use crate::{Error, Result};

/// The punches in `incoming` whose `(user_id, timestamp)` key is not
/// already in `existing`. Duplicates within `incoming` are also dropped,
/// first occurrence wins.
pub fn new_punches(
  existing: &[BufferedPunch],
  incoming: &[RawPunch],
  device_ip: &str,
) -> Vec<BufferedPunch> {
  let mut seen: HashSet<(String, String)> = existing
    .iter()
    .map(|p| (p.user_id.clone(), p.timestamp.clone()))
    .collect();

  incoming
    .iter()
    .map(|raw| BufferedPunch::from_raw(raw, device_ip))
    .filter(|p| seen.insert((p.user_id.clone(), p.timestamp.clone())))
    .collect()
}

/// Merge a device fetch into the buffer for `day`. Stored punches are never
/// removed or rewritten. Returns the punches that were appended.
pub async fn ingest<B: PunchBuffer>(
  buffer: &B,
  device_ip: &str,
  day: NaiveDate,
  raw: &[RawPunch],
) -> Result<Vec<BufferedPunch>> {
  let existing = buffer.load_all(device_ip, day).await.map_err(Error::buffer)?;
  let fresh = new_punches(&existing, raw, device_ip);

  if !fresh.is_empty() {
    buffer
      .append(device_ip, day, &fresh)
      .await
      .map_err(Error::buffer)?;
  }
  debug!(
    %device_ip,
    %day,
    fetched = raw.len(),
    appended = fresh.len(),
    "punches ingested"
  );
  Ok(fresh)
}
