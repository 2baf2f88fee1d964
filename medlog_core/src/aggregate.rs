//! Derived views over the dose log list.
//!
//! Everything here is a pure function of the list (plus the card set), and is
//! recomputed after every mutation or filter change.

use crate::cards::CardSet;
use crate::{DoseLog, MedicineFilter};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Most recent record for each medicine
///
/// A later record with an equal `date_time` replaces the earlier one, so ties
/// go to the last record in scan order. Output follows the order in which
/// each medicine was first seen.
pub fn latest_per_medicine<'a, I>(logs: I) -> Vec<DoseLog>
where
    I: IntoIterator<Item = &'a DoseLog>,
{
    let mut order: Vec<&'a DoseLog> = Vec::new();
    let mut slots: HashMap<&'a str, usize> = HashMap::new();

    for log in logs {
        match slots.get(log.medicine.as_str()) {
            Some(&slot) => {
                if log.date_time >= order[slot].date_time {
                    order[slot] = log;
                }
            }
            None => {
                slots.insert(log.medicine.as_str(), order.len());
                order.push(log);
            }
        }
    }

    order.into_iter().cloned().collect()
}

/// Rows for the history table
///
/// Restricts to `filter`, collapses to one row per medicine unless
/// `show_all`, then sorts newest first. The sort is stable, so records with
/// equal times keep their relative order.
pub fn table_view(logs: &[DoseLog], filter: &MedicineFilter, show_all: bool) -> Vec<DoseLog> {
    let filtered = logs.iter().filter(|log| filter.matches(&log.medicine));

    let mut view: Vec<DoseLog> = if show_all {
        filtered.cloned().collect()
    } else {
        latest_per_medicine(filtered)
    };

    sort_newest_first(&mut view);
    view
}

/// Sort by `date_time` descending, preserving order among equal times
pub fn sort_newest_first(logs: &mut [DoseLog]) {
    logs.sort_by(|a, b| b.date_time.cmp(&a.date_time));
}

/// When `medicine` was last taken, if ever
pub fn last_taken(logs: &[DoseLog], medicine: &str) -> Option<DateTime<Utc>> {
    logs.iter()
        .filter(|log| log.medicine == medicine)
        .map(|log| log.date_time)
        .max()
}

/// Choices for the medicine filter
///
/// Logged medicines in first-seen order, then any card not yet logged.
/// Empty names are skipped.
pub fn filter_options(logs: &[DoseLog], cards: &CardSet) -> Vec<String> {
    let mut seen = HashSet::new();
    logs.iter()
        .map(|log| log.medicine.as_str())
        .chain(cards.names())
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .map(str::to_string)
        .collect()
}
