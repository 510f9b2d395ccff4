//! Board state store: the in-memory working set and its filtered view.
//!
//! The store never talks to the network. Loading is driven by the sync
//! reconciler, which fetches first and then calls `replace_all` under a short
//! write lock.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::application::{Application, ApplicationStatus, UnknownStatus};
use crate::tracker::optimistic::Snapshot;

/// Exact-status filter, or every column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    fn admits(self, status: ApplicationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(only) => only == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    /// Stored lowercased.
    search: String,
    pub status: StatusFilter,
}

impl BoardFilter {
    pub fn search(&self) -> &str {
        &self.search
    }

    fn admits(&self, app: &Application) -> bool {
        (self.search.is_empty() || app.matches_query(&self.search)) && self.status.admits(app.status)
    }
}

/// One board column of the filtered view.
#[derive(Debug)]
pub struct Column<'a> {
    pub status: ApplicationStatus,
    pub title: &'static str,
    pub applications: Vec<&'a Application>,
}

impl Column<'_> {
    pub fn count(&self) -> usize {
        self.applications.len()
    }
}

/// Opaque copy of the record set, for rollback.
#[derive(Debug, Clone)]
pub struct BoardSnapshot(Vec<Application>);

#[derive(Debug, Default)]
pub struct BoardStore {
    applications: Vec<Application>,
    filter: BoardFilter,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn get(&self, id: Uuid) -> Option<&Application> {
        self.applications.iter().find(|app| app.id == id)
    }

    /// Wholesale replacement; newest first, as the board renders them.
    pub fn replace_all(&mut self, mut applications: Vec<Application>) {
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.applications = applications;
    }

    /// Re-derives the filtered view. The record set is not touched.
    pub fn set_filter(&mut self, search: &str, status: StatusFilter) {
        self.filter = BoardFilter {
            search: search.trim().to_lowercase(),
            status,
        };
    }

    pub fn filter(&self) -> &BoardFilter {
        &self.filter
    }

    pub fn filtered(&self) -> Vec<&Application> {
        self.applications
            .iter()
            .filter(|app| self.filter.admits(app))
            .collect()
    }

    /// The filtered view grouped into the five ordered columns.
    pub fn columns(&self) -> Vec<Column<'_>> {
        let visible = self.filtered();
        ApplicationStatus::ALL
            .into_iter()
            .map(|status| Column {
                status,
                title: status.title(),
                applications: visible
                    .iter()
                    .copied()
                    .filter(|app| app.status == status)
                    .collect(),
            })
            .collect()
    }

    /// Optimistic local status change. Returns `false` if the id is unknown.
    pub fn apply_local_status_change(
        &mut self,
        id: Uuid,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> bool {
        match self.applications.iter_mut().find(|app| app.id == id) {
            Some(app) => {
                app.transition_to(status, now);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot(self.applications.clone())
    }

    /// Restores the records exactly as captured. The filter is left alone.
    pub fn revert(&mut self, snapshot: BoardSnapshot) {
        self.applications = snapshot.0;
    }
}

impl Snapshot for BoardStore {
    type Snapshot = BoardSnapshot;

    fn snapshot(&self) -> BoardSnapshot {
        BoardStore::snapshot(self)
    }

    fn restore(&mut self, snapshot: BoardSnapshot) {
        self.revert(snapshot);
    }
}
