//! [`Engine`]: the stateless core bound to its collaborators.
//!
//! The reconciliation, submission and regularization steps are `impl`
//! blocks in their own modules; this file only holds construction.

use std::sync::Arc;

use punchcard_core::{
  settings::AttendanceSettings,
  store::{AttendanceStore, Directory},
  strategy::{FirstLastStrategy, WorkingHoursStrategy},
};

use crate::notify::{LogNotifier, Notifier};

/// Settings are fixed for the engine's lifetime; build a new engine to pick
/// up changed settings.
#[derive(Clone)]
pub struct Engine<S, D> {
  pub(crate) store:     S,
  pub(crate) directory: D,
  pub(crate) settings:  AttendanceSettings,
  pub(crate) strategy:  Arc<dyn WorkingHoursStrategy>,
  pub(crate) notifier:  Arc<dyn Notifier>,
}

impl<S, D> Engine<S, D>
where
  S: AttendanceStore,
  D: Directory,
{
  /// First/last working hours, notifications to the log.
  pub fn new(store: S, directory: D, settings: AttendanceSettings) -> Self {
    Self {
      store,
      directory,
      settings,
      strategy: Arc::new(FirstLastStrategy),
      notifier: Arc::new(LogNotifier),
    }
  }

  pub fn with_strategy(
    mut self,
    strategy: impl WorkingHoursStrategy + 'static,
  ) -> Self {
    self.strategy = Arc::new(strategy);
    self
  }

  pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
    self.notifier = Arc::new(notifier);
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn directory(&self) -> &D { &self.directory }

  pub fn settings(&self) -> &AttendanceSettings { &self.settings }
}
