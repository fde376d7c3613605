//! The batch jobs the scheduler runs: device polling, forced
//! reconciliation, the auto-submit sweep and buffer cleanup.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use punchcard_core::store::{AttendanceStore, Directory, PunchBuffer};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  device::{DeviceConfig, DeviceConnector, fetch_punches},
  ingest::ingest,
  reconcile::Reconciliation,
  report::{BatchReport, SyncReport},
};

/// What a forced reconciliation pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarkReport {
  pub reconciled: BatchReport<Reconciliation>,
  pub submitted:  BatchReport<Uuid>,
}

/// The engine plus the punch buffer and the devices feeding it.
pub struct Jobs<S, D, B, C> {
  engine:    Engine<S, D>,
  buffer:    B,
  connector: C,
  devices:   Vec<DeviceConfig>,
}

impl<S, D, B, C> Jobs<S, D, B, C>
where
  S: AttendanceStore,
  D: Directory,
  B: PunchBuffer,
  C: DeviceConnector,
{
  pub fn new(
    engine: Engine<S, D>,
    buffer: B,
    connector: C,
    devices: Vec<DeviceConfig>,
  ) -> Self {
    Self {
      engine,
      buffer,
      connector,
      devices,
    }
  }

  pub fn engine(&self) -> &Engine<S, D> { &self.engine }

  pub fn devices(&self) -> &[DeviceConfig] { &self.devices }

  /// Fetch one device into the buffer and normalize its day. Returns the
  /// summary line. Employees that gained check-ins are added to `affected`,
  /// including those stored before a failure part way through.
  async fn sync_device(
    &self,
    device: &DeviceConfig,
    day: NaiveDate,
    affected: &mut BTreeSet<String>,
  ) -> Result<String> {
    let raw = fetch_punches(&self.connector, device).await?;
    let appended = ingest(&self.buffer, &device.ip, day, &raw).await?;
    let buffered = self
      .buffer
      .load_all(&device.ip, day)
      .await
      .map_err(Error::buffer)?;

    let mut created = Vec::new();
    let normalized = self.engine.normalize_into(&buffered, &mut created).await;
    affected.extend(created.iter().map(|e| e.employee_id.clone()));
    normalized?;

    Ok(format!(
      "{}: fetched {}, buffered {} new, {} new check-ins",
      device.label(),
      raw.len(),
      appended.len(),
      created.len()
    ))
  }

  /// Poll every device, then reconcile the employees that gained check-ins
  /// and try to submit what changed. A failing device is reported and the
  /// others still run.
  pub async fn fetch_and_upload(&self, now: NaiveDateTime) -> SyncReport {
    let day = now.date();
    let mut report = SyncReport::default();
    let mut affected = BTreeSet::new();

    for device in &self.devices {
      match self.sync_device(device, day, &mut affected).await {
        Ok(line) => {
          info!(device = %device.label(), "{line}");
          report.success.push(line);
        }
        Err(e) => {
          error!(device = %device.label(), error = %e, "device sync failed");
          report.errors.push(format!("{}: {e}", device.label()));
        }
      }
    }

    let mut touched = Vec::new();
    for employee_id in &affected {
      match self.engine.reconcile_employee(employee_id, day).await {
        Ok(rec) => {
          for (date, reason) in &rec.failed {
            report.errors.push(format!("{employee_id}/{date}: {reason}"));
          }
          touched.extend(rec.touched());
        }
        Err(e) => {
          error!(%employee_id, error = %e, "reconciliation failed");
          report.errors.push(format!("{employee_id}: {e}"));
        }
      }
    }

    let submitted = self.submit(&touched, now).await;
    report
      .errors
      .extend(submitted.failed.iter().map(|f| format!("{}: {}", f.unit, f.reason)));
    report
  }

  /// Submit `touched` where due, then sweep all open records.
  async fn submit(&self, touched: &[Uuid], now: NaiveDateTime) -> BatchReport<Uuid> {
    let mut report = BatchReport::default();
    for result in [
      self.engine.submit_records(touched, now).await,
      self.engine.auto_submit_due(now).await,
    ] {
      match result {
        Ok(r) => report.merge(r),
        Err(e) => {
          error!(error = %e, "auto-submit failed");
          report.push_err("auto-submit", e);
        }
      }
    }
    report
  }

  /// Reconcile every active employee and submit whatever is due.
  pub async fn mark_attendance(&self, now: NaiveDateTime) -> Result<MarkReport> {
    let reconciled = self.engine.reconcile_all(now.date()).await?;
    let touched: Vec<Uuid> = reconciled
      .succeeded
      .iter()
      .flat_map(Reconciliation::touched)
      .collect();
    let submitted = self.submit(&touched, now).await;
    Ok(MarkReport {
      reconciled,
      submitted,
    })
  }

  pub async fn auto_submit_due(&self, now: NaiveDateTime) -> Result<BatchReport<Uuid>> {
    self.engine.auto_submit_due(now).await
  }

  /// Keep only `today`'s punch buffers.
  pub async fn cleanup_old_logs(&self, today: NaiveDate) -> Result<usize> {
    let removed = self.buffer.rotate(today).await.map_err(Error::buffer)?;
    info!(removed, %today, "old punch buffers removed");
    Ok(removed)
  }
}
