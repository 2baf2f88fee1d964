//! Core domain types for the Medlog system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Dose log records and their id generation
//! - Medicine cards (the fixed set of loggable medicines)
//! - Table filter selection
//! - The transient confirmation banner

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Dose Log
// ============================================================================

/// One record of a medication having been taken
///
/// Field names serialize in camelCase so the persisted array matches the
/// `medicationLogs` format of the browser tracker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseLog {
    /// Creation timestamp in epoch milliseconds, unique within the list
    pub id: i64,
    pub medicine: String,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
}

impl DoseLog {
    /// Allocate an id for a record created at `now`
    ///
    /// Ids are creation timestamps in milliseconds. If the clock has not
    /// advanced past the largest existing id, the next integer is used so
    /// ids stay unique and increasing. Once the largest id is `i64::MAX`
    /// the smallest unused non-negative id is handed out instead.
    pub fn next_id(existing: &[DoseLog], now: DateTime<Utc>) -> i64 {
        let stamp = now.timestamp_millis();
        match existing.iter().map(|log| log.id).max() {
            Some(max) if max >= stamp => max
                .checked_add(1)
                .unwrap_or_else(|| Self::smallest_free_id(existing)),
            _ => stamp,
        }
    }

    fn smallest_free_id(existing: &[DoseLog]) -> i64 {
        let taken: HashSet<i64> = existing.iter().map(|log| log.id).collect();
        (0..i64::MAX)
            .find(|id| !taken.contains(id))
            .unwrap_or_default()
    }
}

// ============================================================================
// Medicine Cards
// ============================================================================

/// A loggable medicine, as shown on a card
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineCard {
    pub name: String,
}

impl MedicineCard {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// ============================================================================
// Table Filter
// ============================================================================

/// Medicine selection for the history table
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum MedicineFilter {
    #[default]
    All,
    Only(String),
}

impl MedicineFilter {
    pub fn matches(&self, medicine: &str) -> bool {
        match self {
            MedicineFilter::All => true,
            MedicineFilter::Only(name) => name == medicine,
        }
    }
}

impl FromStr for MedicineFilter {
    type Err = std::convert::Infallible;

    /// Exactly "all", or an empty string, selects every medicine
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "all" {
            Ok(MedicineFilter::All)
        } else {
            Ok(MedicineFilter::Only(trimmed.to_string()))
        }
    }
}

impl fmt::Display for MedicineFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicineFilter::All => f.write_str("all"),
            MedicineFilter::Only(name) => f.write_str(name),
        }
    }
}

// ============================================================================
// Confirmation Banner
// ============================================================================

/// Transient confirmation message shown after a successful mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub shown_at: DateTime<Utc>,
    pub hide_after: Duration,
}

impl Banner {
    pub fn new(message: impl Into<String>, shown_at: DateTime<Utc>, hide_after: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at,
            hide_after,
        }
    }

    /// Whether the banner is still on screen at `now`
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now >= self.shown_at && now < self.shown_at + self.hide_after
    }
}
