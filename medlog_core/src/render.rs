//! Stateless projections of the derived views into displayable text.
//!
//! Rendering is generic over the time zone so the binary can show local
//! times while tests pin everything to UTC.

use crate::cards::CardSet;
use crate::{aggregate, DoseLog};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Display};

/// Shown instead of an empty table
pub const EMPTY_TABLE_MESSAGE: &str = "No medication logs yet.";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// One row of the history table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub medicine: String,
    pub date: String,
    pub time: String,
    pub edited: bool,
}

/// The history table, or the placeholder when there is nothing to show
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableView {
    Rows(Vec<Row>),
    Empty,
}

/// "Last taken" caption for one medicine card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardLabel {
    pub medicine: String,
    pub text: String,
}

fn local_parts<Tz>(at: DateTime<Utc>, tz: &Tz) -> (String, String)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = at.with_timezone(tz);
    (
        local.format(DATE_FORMAT).to_string(),
        local.format(TIME_FORMAT).to_string(),
    )
}

/// Project an already filtered and sorted view into table rows
pub fn render_table<Tz>(view: &[DoseLog], tz: &Tz) -> TableView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if view.is_empty() {
        return TableView::Empty;
    }

    TableView::Rows(
        view.iter()
            .map(|log| {
                let (date, time) = local_parts(log.date_time, tz);
                Row {
                    id: log.id,
                    medicine: log.medicine.clone(),
                    date,
                    time,
                    edited: log.is_edited,
                }
            })
            .collect(),
    )
}

/// One label per card, in card order
pub fn render_last_taken<Tz>(cards: &CardSet, logs: &[DoseLog], tz: &Tz) -> Vec<CardLabel>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    cards
        .names()
        .map(|medicine| {
            let text = match aggregate::last_taken(logs, medicine) {
                Some(at) => {
                    let (date, time) = local_parts(at, tz);
                    format!("Last taken: {} at {}", date, time)
                }
                None => "Not taken yet".to_string(),
            };
            CardLabel {
                medicine: medicine.to_string(),
                text,
            }
        })
        .collect()
}

/// Caption of the control that flips the table mode
pub fn toggle_caption(show_all: bool) -> &'static str {
    if show_all {
        "Show Latest Only"
    } else {
        "View All Logs"
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<15} {:<20} {:<10} {:<6}",
            self.id, self.medicine, self.date, self.time
        )?;
        if self.edited {
            f.write_str(" (edited)")?;
        }
        Ok(())
    }
}

impl Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableView::Empty => f.write_str(EMPTY_TABLE_MESSAGE),
            TableView::Rows(rows) => {
                write!(
                    f,
                    "{:<15} {:<20} {:<10} {:<6}",
                    "ID", "MEDICINE", "DATE", "TIME"
                )?;
                for row in rows {
                    write!(f, "\n{}", row)?;
                }
                Ok(())
            }
        }
    }
}

impl Display for CardLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20} {}", self.medicine, self.text)
    }
}
