//! Application tracker board.
//!
//! DESIGN
//! ======
//! Three collaborators share one `BoardStore` behind a `tokio::sync::RwLock`:
//! - `board`: the working set and the filtered, column-grouped view.
//! - `drag`: pointer events in, at most one "move X to column Y" out.
//! - `reconcile`: optimistic move with full rollback, plus confirmed
//!   create/update/delete followed by a reload.
//!
//! Locks are held only for in-memory mutation, never across a network call,
//! so the board can render the optimistic state while persistence is pending.

pub mod board;
pub mod drag;
pub mod notify;
pub mod optimistic;
pub mod reconcile;

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::applications::{ApiError, ApplicationApi, HttpApplications, MemoryApplications};
use crate::config::{TrackerBackend, TrackerConfig};
use crate::models::application::Application;
use crate::session::Session;

use board::{BoardStore, StatusFilter};
use drag::{DragController, DragOutcome, PointerEvent};
use notify::Notifier;
use reconcile::{MoveOutcome, SyncReconciler};

/// What a pointer interaction amounted to once it ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerAction {
    /// A drop on a column was reconciled.
    Move(MoveOutcome),
    /// The drag ended without a valid target.
    Cancelled,
    /// A click on a card: open its edit panel.
    OpenEditor(Application),
}

pub struct Tracker {
    drag: DragController,
    reconciler: SyncReconciler,
}

impl Tracker {
    pub fn new(api: Arc<dyn ApplicationApi>, notifier: Arc<dyn Notifier>) -> Self {
        let store = Arc::new(RwLock::new(BoardStore::new()));
        Self {
            drag: DragController::new(),
            reconciler: SyncReconciler::new(store, api, notifier),
        }
    }

    /// Builds a tracker on the backend named by `config`. The remote backend
    /// authenticates every call with the session's current token; the
    /// in-memory one belongs to the signed-in user, or to nobody in particular.
    pub fn connect(config: &TrackerConfig, session: Session, notifier: Arc<dyn Notifier>) -> Self {
        let api: Arc<dyn ApplicationApi> = match &config.backend {
            TrackerBackend::Remote { base_url } => Arc::new(HttpApplications::new(
                reqwest::Client::new(),
                base_url.clone(),
                session,
            )),
            TrackerBackend::InMemory => {
                let owner = session.user().map_or_else(Uuid::nil, |u| u.id);
                Arc::new(MemoryApplications::new(owner))
            }
        };
        Self::new(api, notifier)
    }

    pub fn store(&self) -> &Arc<RwLock<BoardStore>> {
        self.reconciler.store()
    }

    pub fn reconciler(&self) -> &SyncReconciler {
        &self.reconciler
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub async fn load(&self) -> Result<usize, ApiError> {
        self.reconciler.load().await
    }

    pub async fn set_filter(&self, search: &str, status: StatusFilter) {
        self.store().write().await.set_filter(search, status);
    }

    /// Feeds a pointer event through the drag controller and acts on the outcome.
    /// The drag session is already over when persistence starts.
    pub async fn handle_pointer(&mut self, event: PointerEvent) -> Option<PointerAction> {
        match self.drag.handle(event)? {
            outcome @ DragOutcome::Dropped { .. } => self
                .reconciler
                .handle_drop(outcome)
                .await
                .map(PointerAction::Move),
            DragOutcome::Cancelled { .. } => Some(PointerAction::Cancelled),
            DragOutcome::Clicked { application_id } => self
                .store()
                .read()
                .await
                .get(application_id)
                .cloned()
                .map(PointerAction::OpenEditor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::{ApplicationStatus, NewApplication};
    use crate::session::MemorySessionStorage;
    use crate::tracker::drag::Point;
    use crate::tracker::notify::testing::RecordingNotifier;
    use crate::tracker::notify::NotificationLevel;
    use chrono::Utc;

    fn drag_to(card: Uuid, column: &str) -> Vec<PointerEvent> {
        vec![
            PointerEvent::Down {
                card,
                at: Point::new(0.0, 0.0),
            },
            PointerEvent::Move {
                at: Point::new(120.0, 0.0),
            },
            PointerEvent::Up {
                at: Point::new(120.0, 0.0),
                over: Some(column.to_string()),
            },
        ]
    }

    async fn drive(tracker: &mut Tracker, events: Vec<PointerEvent>) -> Option<PointerAction> {
        let mut last = None;
        for event in events {
            if let Some(action) = tracker.handle_pointer(event).await {
                last = Some(action);
            }
        }
        last
    }

    async fn current(tracker: &Tracker, id: Uuid) -> Application {
        tracker.store().read().await.get(id).cloned().unwrap()
    }

    #[tokio::test]
    async fn test_applied_at_lifecycle_through_board() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut tracker = Tracker::new(
            Arc::new(MemoryApplications::new(Uuid::new_v4())),
            notifier.clone(),
        );

        let app = tracker
            .reconciler()
            .create(NewApplication::new("Acme", "Engineer"))
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Saved);
        assert!(app.applied_at.is_none());

        let before = Utc::now();
        let action = drive(&mut tracker, drag_to(app.id, "applied")).await;
        assert_eq!(action, Some(PointerAction::Move(MoveOutcome::Moved)));
        let applied_at = current(&tracker, app.id)
            .await
            .applied_at
            .expect("applied_at set on first move to applied");
        assert!(applied_at >= before && applied_at <= Utc::now());

        drive(&mut tracker, drag_to(app.id, "interview")).await;
        assert_eq!(current(&tracker, app.id).await.applied_at, Some(applied_at));

        drive(&mut tracker, drag_to(app.id, "applied")).await;
        let back = current(&tracker, app.id).await;
        assert_eq!(back.status, ApplicationStatus::Applied);
        assert_eq!(back.applied_at, Some(applied_at));

        assert_eq!(notifier.count(NotificationLevel::Error), 0);
    }

    #[tokio::test]
    async fn test_click_opens_editor_and_cancel_does_nothing() {
        let api = Arc::new(MemoryApplications::new(Uuid::new_v4()));
        let app = api
            .create(NewApplication::new("Acme", "Engineer"))
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let mut tracker = Tracker::new(api, notifier.clone());
        tracker.load().await.unwrap();

        let click = vec![
            PointerEvent::Down {
                card: app.id,
                at: Point::new(5.0, 5.0),
            },
            PointerEvent::Up {
                at: Point::new(6.0, 5.0),
                over: Some("offer".into()),
            },
        ];
        match drive(&mut tracker, click).await {
            Some(PointerAction::OpenEditor(opened)) => assert_eq!(opened.id, app.id),
            other => panic!("expected editor, got {other:?}"),
        }

        let action = drive(&mut tracker, drag_to(app.id, "not-a-column")).await;
        assert_eq!(action, Some(PointerAction::Cancelled));
        assert_eq!(
            current(&tracker, app.id).await.status,
            ApplicationStatus::Saved
        );

        let action = drive(&mut tracker, drag_to(app.id, "saved")).await;
        assert_eq!(action, Some(PointerAction::Move(MoveOutcome::Unchanged)));
        assert!(notifier.taken().is_empty());
        assert!(tracker.drag().is_idle());
    }

    #[tokio::test]
    async fn test_filter_through_tracker() {
        let api = Arc::new(MemoryApplications::new(Uuid::new_v4()));
        api.create(NewApplication::new("TechCorp", "Engineer"))
            .await
            .unwrap();
        api.create(NewApplication::new("Acme", "Engineer"))
            .await
            .unwrap();
        let tracker = Tracker::new(api, Arc::new(RecordingNotifier::default()));
        tracker.load().await.unwrap();

        tracker.set_filter("CORP", StatusFilter::All).await;
        let store = tracker.store().read().await;
        let visible: Vec<_> = store.filtered().iter().map(|a| a.company.clone()).collect();
        assert_eq!(visible, vec!["TechCorp"]);
    }

    #[tokio::test]
    async fn test_connect_in_memory_uses_session_user() {
        let session = Session::new(Arc::new(MemorySessionStorage::new()));
        let config = TrackerConfig {
            backend: TrackerBackend::InMemory,
            session_path: "unused.json".into(),
        };
        let tracker = Tracker::connect(&config, session, Arc::new(RecordingNotifier::default()));
        assert_eq!(tracker.load().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_remote_requires_sign_in() {
        let session = Session::new(Arc::new(MemorySessionStorage::new()));
        let config = TrackerConfig {
            backend: TrackerBackend::Remote {
                base_url: "http://localhost:9".into(),
            },
            session_path: "unused.json".into(),
        };
        let notifier = Arc::new(RecordingNotifier::default());
        let tracker = Tracker::connect(&config, session, notifier.clone());

        assert!(matches!(tracker.load().await, Err(ApiError::Unauthenticated)));
        assert_eq!(notifier.count(NotificationLevel::Error), 1);
    }
}
