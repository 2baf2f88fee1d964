//! Application state and its transitions.
//!
//! `AppState` is owned and threaded through `AppState::apply`, which takes
//! the current state by value and returns the next one together with an
//! `Outcome` describing what happened. Nothing here touches storage or the
//! terminal; the tracker persists and the renderer projects.

use crate::{Banner, Config, DoseLog, MedicineFilter};
use chrono::{DateTime, Duration, Utc};

/// The modal dialog currently open, if any
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    Closed,
    /// A dose is waiting for confirmation before it is appended
    ConfirmRecord {
        medicine: String,
        date_time: DateTime<Utc>,
    },
    /// Editing the time of an existing record
    Edit {
        log_id: i64,
        medicine: String,
        /// Preselected value for the time picker
        date_time: DateTime<Utc>,
    },
    /// Deleting an existing record
    Delete { log_id: i64, medicine: String },
}

/// User interactions that drive the state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// A medicine card was activated
    Record {
        medicine: String,
        date_time: DateTime<Utc>,
    },
    /// Confirm the pending dose; the PIN is only checked when required
    ConfirmRecord { pin: Option<String> },
    OpenEdit { log_id: i64 },
    SaveEdit {
        pin: String,
        date_time: DateTime<Utc>,
    },
    OpenDelete { log_id: i64 },
    ConfirmDelete { pin: String },
    /// Close whatever dialog is open without changing anything
    Cancel,
    SetFilter(MedicineFilter),
    /// Switch between latest-only and all-records views
    ToggleView,
}

/// What a transition did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Recorded(DoseLog),
    Edited(DoseLog),
    Deleted(DoseLog),
    DialogOpened,
    DialogClosed,
    ViewChanged,
    /// Wrong PIN; the dialog stays open for another attempt
    PinRejected,
    /// Missing required input; nothing changed
    Invalid(String),
    /// The action referred to something that no longer exists
    Ignored,
}

impl Outcome {
    /// Whether the log list changed and must be persisted
    pub fn mutated(&self) -> bool {
        matches!(
            self,
            Outcome::Recorded(_) | Outcome::Edited(_) | Outcome::Deleted(_)
        )
    }
}

/// Rules the state machine enforces, taken from configuration
#[derive(Clone, Debug)]
pub struct Policy {
    pin: String,
    pub confirm_recording: bool,
    pub require_pin_to_record: bool,
    pub banner_ttl: Duration,
}

impl Policy {
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            confirm_recording: false,
            require_pin_to_record: false,
            banner_ttl: Duration::seconds(3),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            pin: config.security.pin.clone(),
            confirm_recording: config.confirm_recording(),
            require_pin_to_record: config.recording.require_pin,
            banner_ttl: Duration::seconds(i64::from(config.ui.banner_seconds)),
        }
    }

    /// Exact comparison against the shared PIN
    pub fn pin_matches(&self, entered: &str) -> bool {
        entered == self.pin
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new("0000")
    }
}

/// Everything the tracker knows at a given moment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    /// Records in insertion order
    pub logs: Vec<DoseLog>,
    pub filter: MedicineFilter,
    /// false shows the latest record per medicine only
    pub show_all: bool,
    pub dialog: Dialog,
    /// Inline "incorrect PIN" message in the open dialog
    pub pin_error: bool,
    pub banner: Option<Banner>,
}

impl AppState {
    pub fn new(logs: Vec<DoseLog>) -> Self {
        Self {
            logs,
            ..Self::default()
        }
    }

    pub fn find(&self, log_id: i64) -> Option<&DoseLog> {
        self.logs.iter().find(|log| log.id == log_id)
    }

    /// Apply one action, returning the next state and what happened
    pub fn apply(
        mut self,
        action: Action,
        policy: &Policy,
        now: DateTime<Utc>,
    ) -> (AppState, Outcome) {
        // Any dialog interaction hides a previous PIN error
        self.pin_error = false;

        let outcome = match action {
            Action::Record {
                medicine,
                date_time,
            } => self.record(medicine, date_time, policy, now),
            Action::ConfirmRecord { pin } => self.confirm_record(pin, policy, now),
            Action::OpenEdit { log_id } => self.open_edit(log_id),
            Action::SaveEdit { pin, date_time } => self.save_edit(&pin, date_time, policy, now),
            Action::OpenDelete { log_id } => self.open_delete(log_id),
            Action::ConfirmDelete { pin } => self.confirm_delete(&pin, policy, now),
            Action::Cancel => {
                self.dialog = Dialog::Closed;
                Outcome::DialogClosed
            }
            Action::SetFilter(filter) => {
                self.filter = filter;
                Outcome::ViewChanged
            }
            Action::ToggleView => {
                self.show_all = !self.show_all;
                Outcome::ViewChanged
            }
        };

        if outcome == Outcome::PinRejected {
            self.pin_error = true;
        }

        (self, outcome)
    }

    /// Banner text if one is still showing at `now`
    pub fn visible_banner(&self, now: DateTime<Utc>) -> Option<&str> {
        self.banner
            .as_ref()
            .filter(|banner| banner.is_visible(now))
            .map(|banner| banner.message.as_str())
    }

    fn record(
        &mut self,
        medicine: String,
        date_time: DateTime<Utc>,
        policy: &Policy,
        now: DateTime<Utc>,
    ) -> Outcome {
        let medicine = medicine.trim().to_string();
        if medicine.is_empty() {
            return Outcome::Invalid("medicine name is required".into());
        }

        if policy.confirm_recording {
            self.dialog = Dialog::ConfirmRecord {
                medicine,
                date_time,
            };
            return Outcome::DialogOpened;
        }

        self.append(medicine, date_time, policy, now)
    }

    fn confirm_record(
        &mut self,
        pin: Option<String>,
        policy: &Policy,
        now: DateTime<Utc>,
    ) -> Outcome {
        let Dialog::ConfirmRecord {
            medicine,
            date_time,
        } = self.dialog.clone()
        else {
            return Outcome::Ignored;
        };

        if policy.require_pin_to_record && !pin.is_some_and(|p| policy.pin_matches(&p)) {
            return Outcome::PinRejected;
        }

        self.dialog = Dialog::Closed;
        self.append(medicine, date_time, policy, now)
    }

    fn append(
        &mut self,
        medicine: String,
        date_time: DateTime<Utc>,
        policy: &Policy,
        now: DateTime<Utc>,
    ) -> Outcome {
        let log = DoseLog {
            id: DoseLog::next_id(&self.logs, now),
            medicine,
            date_time,
            is_edited: false,
        };
        self.logs.push(log.clone());
        self.show_banner(format!("{} taken successfully!", log.medicine), policy, now);
        tracing::info!("Recorded {} at {}", log.medicine, log.date_time);
        Outcome::Recorded(log)
    }

    fn open_edit(&mut self, log_id: i64) -> Outcome {
        let Some(log) = self.find(log_id) else {
            tracing::debug!("No log with id {} to edit", log_id);
            return Outcome::Ignored;
        };

        self.dialog = Dialog::Edit {
            log_id,
            medicine: log.medicine.clone(),
            date_time: log.date_time,
        };
        Outcome::DialogOpened
    }

    fn save_edit(
        &mut self,
        pin: &str,
        date_time: DateTime<Utc>,
        policy: &Policy,
        now: DateTime<Utc>,
    ) -> Outcome {
        let Dialog::Edit { log_id, .. } = self.dialog else {
            return Outcome::Ignored;
        };

        if !policy.pin_matches(pin) {
            return Outcome::PinRejected;
        }

        self.dialog = Dialog::Closed;
        let Some(log) = self.logs.iter_mut().find(|log| log.id == log_id) else {
            return Outcome::Ignored;
        };

        log.date_time = date_time;
        log.is_edited = true;
        let edited = log.clone();

        self.show_banner(
            format!("Time for {} updated successfully!", edited.medicine),
            policy,
            now,
        );
        tracing::info!("Edited log {} to {}", edited.id, edited.date_time);
        Outcome::Edited(edited)
    }

    fn open_delete(&mut self, log_id: i64) -> Outcome {
        let Some(log) = self.find(log_id) else {
            tracing::debug!("No log with id {} to delete", log_id);
            return Outcome::Ignored;
        };

        self.dialog = Dialog::Delete {
            log_id,
            medicine: log.medicine.clone(),
        };
        Outcome::DialogOpened
    }

    fn confirm_delete(&mut self, pin: &str, policy: &Policy, now: DateTime<Utc>) -> Outcome {
        let Dialog::Delete { log_id, .. } = self.dialog else {
            return Outcome::Ignored;
        };

        if !policy.pin_matches(pin) {
            return Outcome::PinRejected;
        }

        self.dialog = Dialog::Closed;
        let Some(index) = self.logs.iter().position(|log| log.id == log_id) else {
            return Outcome::Ignored;
        };

        let removed = self.logs.remove(index);
        self.show_banner(format!("{} entry deleted.", removed.medicine), policy, now);
        tracing::info!("Deleted log {}", removed.id);
        Outcome::Deleted(removed)
    }

    fn show_banner(&mut self, message: String, policy: &Policy, now: DateTime<Utc>) {
        self.banner = Some(Banner::new(message, now, policy.banner_ttl));
    }
}
