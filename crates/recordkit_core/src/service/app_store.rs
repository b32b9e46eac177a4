//! View-facing application store over a record repository.
//!
//! # Responsibility
//! - Hold the in-memory working copy of the collection plus UI state
//!   (`selected`, `loading`, `error`, active filter/search).
//! - Run repository calls and patch local state minimally on success.
//!
//! # Invariants
//! - Every action clears `error` on entry and never propagates a failure;
//!   failures only surface as the `error` string.
//! - `loading` is true while at least one action is outstanding. Each action
//!   holds a busy guard released on drop, so overlapping actions and dropped
//!   futures cannot leave the flag stale.
//! - Mutation failures leave the collection unchanged; load failures empty it.
//! - The state lock is never held across an `.await`.

use crate::model::patch::RecordPatch;
use crate::model::record::{Record, RecordId};
use crate::repo::{RecordFilter, RecordRepository, RepoError};
use crate::service::view::{self, ViewConfig};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<Record>,
    selected: Option<Record>,
    pending: usize,
    error: Option<String>,
    active_filter: Option<RecordFilter>,
    search_query: String,
    show_archived: bool,
}

/// Application store; actions take `&self` so they may overlap.
pub struct AppStore<R: RecordRepository> {
    repo: R,
    view: ViewConfig,
    state: Mutex<StoreState>,
}

struct BusyGuard<'a> {
    state: &'a Mutex<StoreState>,
}

impl<'a> BusyGuard<'a> {
    fn begin(state: &'a Mutex<StoreState>) -> Self {
        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.pending += 1;
        guard.error = None;
        Self { state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.pending = guard.pending.saturating_sub(1);
    }
}

impl<R: RecordRepository> AppStore<R> {
    pub fn new(repo: R) -> Self {
        Self::with_view(repo, ViewConfig::default())
    }

    pub fn with_view(repo: R, view: ViewConfig) -> Self {
        Self {
            repo,
            view,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> BusyGuard<'_> {
        BusyGuard::begin(&self.state)
    }

    fn fail(&self, action: &'static str, err: &RepoError) {
        warn!("event=store_action module=store action={action} status=error error={err}");
        self.state().error = Some(err.to_string());
    }

    /// Replaces the collection with the repository's full list.
    pub async fn load_all(&self) {
        let _busy = self.begin();
        match self.repo.list().await {
            Ok(records) => {
                debug!(
                    "event=store_action module=store action=load_all status=ok count={}",
                    records.len()
                );
                self.state().records = records;
            }
            Err(err) => {
                self.fail("load_all", &err);
                self.state().records.clear();
            }
        }
    }

    /// Loads one record into `selected`; absent ids clear the selection.
    pub async fn load_by_id(&self, id: &RecordId) -> Option<Record> {
        let _busy = self.begin();
        match self.repo.get_by_id(id).await {
            Ok(found) => {
                self.state().selected = found.clone();
                found
            }
            Err(err) => {
                self.fail("load_by_id", &err);
                self.state().selected = None;
                None
            }
        }
    }

    /// Narrows the collection to records whose `field` equals `value`.
    ///
    /// `None` clears the active filter and reloads everything.
    pub async fn filter_by_field(&self, field: &str, value: Option<&str>) {
        let _busy = self.begin();
        let Some(value) = value else {
            self.state().active_filter = None;
            self.load_all().await;
            return;
        };

        let filter = RecordFilter::field_equals(field, value);
        self.state().active_filter = Some(filter.clone());
        self.apply_filter("filter_by_field", &filter).await;
    }

    /// Free-text search; an empty query reloads everything.
    pub async fn search(&self, query: &str) {
        let _busy = self.begin();
        self.state().search_query = query.to_string();
        if query.trim().is_empty() {
            self.load_all().await;
            return;
        }
        self.apply_filter("search", &RecordFilter::search(query))
            .await;
    }

    async fn apply_filter(&self, action: &'static str, filter: &RecordFilter) {
        match self.repo.filter(filter).await {
            Ok(records) => self.state().records = records,
            Err(err) => {
                self.fail(action, &err);
                self.state().records.clear();
            }
        }
    }

    /// Re-applies the active search, else the active filter, else loads all.
    pub async fn refresh(&self) {
        let (query, filter) = {
            let state = self.state();
            (state.search_query.clone(), state.active_filter.clone())
        };

        if !query.trim().is_empty() {
            self.search(&query).await;
        } else if let Some(RecordFilter::FieldEquals { field, value }) = filter {
            self.filter_by_field(&field, Some(&value)).await;
        } else {
            self.load_all().await;
        }
    }

    /// Creates a record and prepends it locally.
    pub async fn add(&self, payload: &Value) -> Option<Record> {
        let _busy = self.begin();
        match self.repo.create(payload).await {
            Ok(created) => {
                self.state().records.insert(0, created.clone());
                Some(created)
            }
            Err(err) => {
                self.fail("add", &err);
                None
            }
        }
    }

    /// Updates a record and replaces it in place (and in `selected`).
    pub async fn update(&self, id: &RecordId, patch: &RecordPatch) -> Option<Record> {
        let _busy = self.begin();
        match self.repo.update(id, patch).await {
            Ok(Some(updated)) => {
                let mut state = self.state();
                if let Some(slot) = state.records.iter_mut().find(|record| &record.id == id) {
                    *slot = updated.clone();
                }
                if state.selected.as_ref().is_some_and(|selected| &selected.id == id) {
                    state.selected = Some(updated.clone());
                }
                Some(updated)
            }
            Ok(None) => None,
            Err(err) => {
                self.fail("update", &err);
                None
            }
        }
    }

    /// Deletes a record and drops it locally (and from `selected`).
    pub async fn remove(&self, id: &RecordId) -> bool {
        let _busy = self.begin();
        match self.repo.delete(id).await {
            Ok(true) => {
                let mut state = self.state();
                state.records.retain(|record| &record.id != id);
                if state.selected.as_ref().is_some_and(|selected| &selected.id == id) {
                    state.selected = None;
                }
                true
            }
            Ok(false) => false,
            Err(err) => {
                self.fail("remove", &err);
                false
            }
        }
    }

    /// Inverts a boolean field of an in-memory record via `update`.
    ///
    /// Returns `None` without touching state when `id` is not loaded.
    pub async fn toggle(&self, id: &RecordId, field: &str) -> Option<Record> {
        let current = self
            .state()
            .records
            .iter()
            .find(|record| &record.id == id)
            .map(|record| record.flag(field))?;
        self.update(id, &RecordPatch::new().set(field, !current))
            .await
    }

    pub async fn toggle_favorite(&self, id: &RecordId) -> Option<Record> {
        let field = self.view.favorite_field.clone();
        self.toggle(id, &field).await
    }

    pub async fn toggle_completed(&self, id: &RecordId) -> Option<Record> {
        let field = self.view.completed_field.clone();
        self.toggle(id, &field).await
    }

    pub async fn toggle_archived(&self, id: &RecordId) -> Option<Record> {
        let field = self.view.archived_field.clone();
        self.toggle(id, &field).await
    }

    /// Selects an already-loaded record; unknown ids clear the selection.
    pub fn select(&self, id: &RecordId) -> Option<Record> {
        let mut state = self.state();
        let found = state.records.iter().find(|record| &record.id == id).cloned();
        state.selected = found.clone();
        found
    }

    pub fn set_show_archived(&self, show: bool) {
        self.state().show_archived = show;
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    pub fn records(&self) -> Vec<Record> {
        self.state().records.clone()
    }

    pub fn selected(&self) -> Option<Record> {
        self.state().selected.clone()
    }

    pub fn loading(&self) -> bool {
        self.state().pending > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn active_filter(&self) -> Option<RecordFilter> {
        self.state().active_filter.clone()
    }

    pub fn search_query(&self) -> String {
        self.state().search_query.clone()
    }

    pub fn show_archived(&self) -> bool {
        self.state().show_archived
    }

    pub fn has_records(&self) -> bool {
        !self.state().records.is_empty()
    }

    /// Presentation order; see `view::sort_records`.
    pub fn sorted_view(&self) -> Vec<Record> {
        let state = self.state();
        view::sort_records(&state.records, &self.view, state.show_archived)
    }

    pub fn count_where(&self, field: &str) -> usize {
        view::count_where(&self.state().records, field)
    }

    pub fn favorite_count(&self) -> usize {
        self.count_where(&self.view.favorite_field)
    }

    pub fn completed_count(&self) -> usize {
        self.count_where(&self.view.completed_field)
    }

    pub fn archived_count(&self) -> usize {
        self.count_where(&self.view.archived_field)
    }

    pub fn group_by(&self, field: &str) -> BTreeMap<String, Vec<Record>> {
        view::group_by(&self.state().records, field)
    }

    pub fn by_field(&self, field: &str, value: &str) -> Vec<Record> {
        view::by_field(&self.state().records, field, value)
    }
}
