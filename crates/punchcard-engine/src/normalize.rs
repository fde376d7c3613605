//! Checkin normalizer: buffered punches → check-in events.

use std::collections::HashMap;

use punchcard_core::{
  checkin::{CheckinEvent, CheckinSource, NewCheckin},
  employee::Employee,
  punch::BufferedPunch,
  store::{AttendanceStore, Directory},
};
use tracing::{debug, warn};

use crate::{Engine, Error, Result};

/// The check-in a punch becomes for `employee`. Direction is provisional.
pub fn checkin_for(
  punch: &BufferedPunch,
  employee: &Employee,
) -> punchcard_core::Result<NewCheckin> {
  Ok(NewCheckin {
    employee_id: employee.employee_id.clone(),
    timestamp:   punch.parsed_timestamp()?,
    direction:   punch.subtype().direction(),
    device_id:   Some(punch.user_id.clone()),
    device_ip:   Some(punch.device_ip.clone()),
    source:      CheckinSource::Device,
  })
}

impl<S, D> Engine<S, D>
where
  S: AttendanceStore,
  D: Directory,
{
  /// Persist a check-in for every punch that maps to an active employee.
  ///
  /// Punches for unknown or inactive users, and punches with unreadable
  /// timestamps, are dropped with a warning. Punches already recorded for
  /// the same employee and second are skipped. Returns only the events this
  /// call created.
  pub async fn normalize(
    &self,
    punches: &[BufferedPunch],
  ) -> Result<Vec<CheckinEvent>> {
    let mut created = Vec::new();
    self.normalize_into(punches, &mut created).await?;
    Ok(created)
  }

  /// [`Engine::normalize`], pushing each created event into `created` as it
  /// is stored. On error, `created` still holds what was persisted before
  /// the failure.
  pub async fn normalize_into(
    &self,
    punches: &[BufferedPunch],
    created: &mut Vec<CheckinEvent>,
  ) -> Result<()> {
    let mut employees: HashMap<String, Option<Employee>> = HashMap::new();

    for punch in punches {
      if !employees.contains_key(&punch.user_id) {
        let found = self
          .directory
          .employee_by_device_user(&punch.user_id)
          .await
          .map_err(Error::directory)?;
        employees.insert(punch.user_id.clone(), found);
      }

      let employee = match employees.get(&punch.user_id) {
        Some(Some(e)) if e.active => e,
        Some(Some(_)) => {
          warn!(user_id = %punch.user_id, "dropping punch for inactive employee");
          continue;
        }
        _ => {
          warn!(
            user_id = %punch.user_id,
            device_ip = %punch.device_ip,
            "dropping punch for unknown device user"
          );
          continue;
        }
      };

      let input = match checkin_for(punch, employee) {
        Ok(input) => input,
        Err(e) => {
          warn!(user_id = %punch.user_id, error = %e, "dropping punch");
          continue;
        }
      };

      match self.store.record_checkin(input).await.map_err(Error::store)? {
        Some(event) => {
          debug!(
            employee_id = %event.employee_id,
            timestamp = %event.timestamp,
            direction = %event.direction,
            "check-in recorded"
          );
          created.push(event);
        }
        None => debug!(
          employee_id = %employee.employee_id,
          timestamp = %punch.timestamp,
          "check-in already recorded"
        ),
      }
    }

    Ok(())
  }
}
