//! Tracker: the controller tying state, storage and views together.
//!
//! Each call to `dispatch` is one turn of the event loop: apply the action,
//! persist if the log list changed, and leave the views ready to render.

use crate::aggregate;
use crate::app::{Action, AppState, Outcome, Policy};
use crate::cards::CardSet;
use crate::render::{self, CardLabel, TableView};
use crate::store::LogStore;
use crate::{Config, DoseLog, Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

pub struct Tracker<S: LogStore> {
    store: S,
    state: AppState,
    policy: Policy,
    cards: CardSet,
}

impl<S: LogStore> Tracker<S> {
    /// Build a tracker over `store`, loading whatever it currently holds
    pub fn new(store: S, policy: Policy, cards: CardSet) -> Self {
        let state = AppState::new(store.load());
        tracing::debug!("Tracker started with {} logs", state.logs.len());
        Self {
            store,
            state,
            policy,
            cards,
        }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(
            store,
            Policy::from_config(config),
            CardSet::from_config(&config.cards),
        )
    }

    /// Apply one action and persist the list if it changed
    ///
    /// Wrong PINs and missing selections come back as outcomes; only storage
    /// failures and missing input are errors.
    pub fn dispatch(&mut self, action: Action, now: DateTime<Utc>) -> Result<Outcome> {
        if let Action::Record { medicine, .. } = &action {
            if !self.cards.contains(medicine.trim()) {
                tracing::debug!("Recording {:?}, which has no card", medicine);
            }
        }

        let (next, outcome) = std::mem::take(&mut self.state).apply(action, &self.policy, now);
        self.state = next;

        if outcome.mutated() {
            self.store.save(&self.state.logs)?;
        }

        match outcome {
            Outcome::Invalid(reason) => Err(Error::Validation(reason)),
            outcome => Ok(outcome),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn logs(&self) -> &[DoseLog] {
        &self.state.logs
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records for the table under the current filter and toggle
    pub fn table(&self) -> Vec<DoseLog> {
        aggregate::table_view(&self.state.logs, &self.state.filter, self.state.show_all)
    }

    pub fn render_table<Tz>(&self, tz: &Tz) -> TableView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        render::render_table(&self.table(), tz)
    }

    pub fn render_last_taken<Tz>(&self, tz: &Tz) -> Vec<CardLabel>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        render::render_last_taken(&self.cards, &self.state.logs, tz)
    }

    pub fn filter_options(&self) -> Vec<String> {
        aggregate::filter_options(&self.state.logs, &self.cards)
    }

    pub fn banner(&self, now: DateTime<Utc>) -> Option<&str> {
        self.state.visible_banner(now)
    }
}
