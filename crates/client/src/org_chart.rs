//! Fetch, lay out and mutate the organization chart as one state machine.
//!
//! Mutations never patch the local copy; each one is followed by a full
//! [`OrgChartStore::refresh`], and the caller re-renders from the snapshot
//! it returns.

use std::sync::Arc;

use cakung_core::hierarchy::{parent_options, subtree_levels, ParentOption};
use cakung_core::layout::{compute_layout, LayoutConfig, OrgChartLayout};
use cakung_core::organization::{DirectoryEntry, EntryDraft};
use cakung_core::types::DbId;

use crate::error::ClientResult;
use crate::organization::OrganizationApi;

/// Entries as fetched plus their computed layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub entries: Vec<DirectoryEntry>,
    pub layout: OrgChartLayout,
}

/// Where the store is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChartState {
    #[default]
    Idle,
    Loading,
    Ready(Arc<ChartSnapshot>),
    /// Message of the last failed fetch.
    Error(String),
}

/// Owns the current chart and the API used to change it.
pub struct OrgChartStore {
    api: OrganizationApi,
    config: LayoutConfig,
    state: ChartState,
}

impl OrgChartStore {
    pub fn new(api: OrganizationApi) -> Self {
        Self::with_config(api, LayoutConfig::default())
    }

    pub fn with_config(api: OrganizationApi, config: LayoutConfig) -> Self {
        Self {
            api,
            config,
            state: ChartState::Idle,
        }
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    /// Current snapshot when the store is ready.
    pub fn snapshot(&self) -> Option<Arc<ChartSnapshot>> {
        match &self.state {
            ChartState::Ready(snapshot) => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }

    /// Refetch all entries and recompute the layout.
    pub async fn refresh(&mut self) -> ClientResult<Arc<ChartSnapshot>> {
        self.state = ChartState::Loading;
        match self.api.list().await {
            Ok(entries) => {
                let layout = compute_layout(&entries, &self.config);
                tracing::debug!(
                    entries = entries.len(),
                    connectors = layout.connectors.len(),
                    "Organization chart refreshed"
                );
                let snapshot = Arc::new(ChartSnapshot { entries, layout });
                self.state = ChartState::Ready(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load organization chart");
                self.state = ChartState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Ready snapshot, fetching one first if needed.
    async fn current(&mut self) -> ClientResult<Arc<ChartSnapshot>> {
        match self.snapshot() {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh().await,
        }
    }

    /// Create an entry with its level resolved from the chosen parent.
    pub async fn create(&mut self, draft: EntryDraft) -> ClientResult<Arc<ChartSnapshot>> {
        let current = self.current().await?;
        let draft = draft.resolve_level(&current.entries);
        self.api.create(&draft).await?;
        self.refresh().await
    }

    /// Update an entry; the level follows the (possibly new) parent.
    ///
    /// Descendants whose stored level no longer matches their depth under
    /// the moved entry are rewritten too, parents before children.
    pub async fn update(&mut self, id: DbId, draft: EntryDraft) -> ClientResult<Arc<ChartSnapshot>> {
        let current = self.current().await?;
        let draft = draft.resolve_level(&current.entries);
        self.api.update(id, &draft).await?;

        let stale: Vec<(DbId, EntryDraft)> = subtree_levels(&current.entries, id, draft.level)
            .into_iter()
            .filter_map(|(child_id, level)| {
                let child = current.entries.iter().find(|e| e.id == child_id)?;
                (child.level != level).then(|| {
                    let mut relevel = EntryDraft::from_entry(child);
                    relevel.level = level;
                    (child_id, relevel)
                })
            })
            .collect();
        if !stale.is_empty() {
            tracing::info!(entry_id = id, descendants = stale.len(), "Releveling moved subtree");
        }
        for (child_id, relevel) in &stale {
            self.api.update(*child_id, relevel).await?;
        }
        self.refresh().await
    }

    pub async fn delete(&mut self, id: DbId) -> ClientResult<Arc<ChartSnapshot>> {
        self.api.delete(id).await?;
        self.refresh().await
    }

    /// Parents selectable for `editing` (or for a new entry when `None`).
    pub fn parent_options(&self, editing: Option<DbId>) -> Vec<ParentOption> {
        self.snapshot()
            .map(|snapshot| parent_options(&snapshot.entries, editing))
            .unwrap_or_default()
    }
}
