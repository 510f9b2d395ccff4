//! Sync reconciler: keeps the board store and the persistence API in agreement.
//!
//! Status moves are optimistic and rolled back in full on failure. Create,
//! update and delete are not optimistic: they change nothing locally until the
//! API confirms, then the board is reloaded. Nothing is retried automatically.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::applications::{ApiError, ApplicationApi};
use crate::models::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};
use crate::tracker::board::BoardStore;
use crate::tracker::drag::DragOutcome;
use crate::tracker::notify::{Notification, Notifier};
use crate::tracker::optimistic::optimistic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped on its own column or unknown card: no call, no notification.
    Unchanged,
    /// Persisted; the optimistic state stands.
    Moved,
    /// Persistence failed; the card is back where it was.
    RolledBack,
}

pub struct SyncReconciler {
    store: Arc<RwLock<BoardStore>>,
    api: Arc<dyn ApplicationApi>,
    notifier: Arc<dyn Notifier>,
}

impl SyncReconciler {
    pub fn new(
        store: Arc<RwLock<BoardStore>>,
        api: Arc<dyn ApplicationApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            api,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<RwLock<BoardStore>> {
        &self.store
    }

    /// Fetches the full collection and replaces the board. On failure the user is
    /// told and the board keeps whatever it showed before.
    pub async fn load(&self) -> Result<usize, ApiError> {
        match self.api.list().await {
            Ok(apps) => {
                let count = apps.len();
                self.store.write().await.replace_all(apps);
                debug!("Loaded {count} applications");
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load applications: {e}");
                self.notifier
                    .notify(Notification::error("Failed to load applications"));
                Err(e)
            }
        }
    }

    pub async fn handle_drop(&self, outcome: DragOutcome) -> Option<MoveOutcome> {
        match outcome {
            DragOutcome::Dropped {
                application_id,
                status,
            } => Some(self.move_application(application_id, status).await),
            DragOutcome::Cancelled { .. } | DragOutcome::Clicked { .. } => None,
        }
    }

    /// Optimistically moves a card to `target` and reconciles with the API.
    pub async fn move_application(&self, id: Uuid, target: ApplicationStatus) -> MoveOutcome {
        match self.store.read().await.get(id) {
            None => {
                debug!("Drop for unknown application {id} ignored");
                return MoveOutcome::Unchanged;
            }
            Some(app) if app.status == target => return MoveOutcome::Unchanged,
            Some(_) => {}
        }

        let api = Arc::clone(&self.api);
        let result = optimistic(
            &self.store,
            |store: &mut BoardStore| {
                store.apply_local_status_change(id, target, Utc::now());
            },
            || async move { api.move_application(id, target).await },
        )
        .await;

        match result {
            Ok(_) => {
                info!("Application {id} moved to {target}");
                self.notifier.notify(Notification::success(
                    "Application moved",
                    format!("Moved to {}", target.title()),
                ));
                MoveOutcome::Moved
            }
            Err(e) => {
                warn!("Move of {id} to {target} failed, rolled back: {e}");
                self.notifier
                    .notify(Notification::error("Failed to move application"));
                MoveOutcome::RolledBack
            }
        }
    }

    pub async fn create(&self, fields: NewApplication) -> Result<Application, ApiError> {
        let result = match fields.validate() {
            Ok(()) => self.api.create(fields).await,
            Err(msg) => Err(ApiError::Validation(msg)),
        };
        self.settle(result, "Application created", "Failed to save application")
            .await
    }

    pub async fn update(&self, id: Uuid, patch: ApplicationPatch) -> Result<Application, ApiError> {
        let result = match patch.validate() {
            Ok(()) => self.api.update(id, patch).await,
            Err(msg) => Err(ApiError::Validation(msg)),
        };
        self.settle(result, "Application updated", "Failed to save application")
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = self.api.delete(id).await;
        self.settle(result, "Application deleted", "Failed to delete application")
            .await
    }

    /// Confirmed writes reload the board; failed ones leave it untouched.
    async fn settle<T>(
        &self,
        result: Result<T, ApiError>,
        success_title: &str,
        failure: &str,
    ) -> Result<T, ApiError> {
        match result {
            Ok(value) => {
                self.notifier.notify(Notification::success(
                    success_title,
                    "Changes saved successfully",
                ));
                // A failed reload is reported on its own; the write itself succeeded.
                let _ = self.load().await;
                Ok(value)
            }
            Err(e) => {
                warn!("{failure}: {e}");
                self.notifier.notify(Notification::error(failure));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::applications::MemoryApplications;
    use crate::tracker::notify::testing::RecordingNotifier;
    use crate::tracker::notify::NotificationLevel;

    /// Memory fake that counts calls and can be told to fail writes.
    struct FlakyApi {
        inner: MemoryApplications,
        fail_writes: AtomicBool,
        fail_list: AtomicBool,
        moves: AtomicUsize,
    }

    impl FlakyApi {
        fn new() -> Self {
            Self {
                inner: MemoryApplications::new(Uuid::new_v4()),
                fail_writes: AtomicBool::new(false),
                fail_list: AtomicBool::new(false),
                moves: AtomicUsize::new(0),
            }
        }

        fn check(&self, flag: &AtomicBool) -> Result<(), ApiError> {
            if flag.load(Ordering::SeqCst) {
                return Err(ApiError::Remote {
                    status: 503,
                    message: "backend unavailable".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ApplicationApi for FlakyApi {
        async fn list(&self) -> Result<Vec<Application>, ApiError> {
            self.check(&self.fail_list)?;
            self.inner.list().await
        }

        async fn get(&self, id: Uuid) -> Result<Option<Application>, ApiError> {
            self.inner.get(id).await
        }

        async fn create(&self, fields: NewApplication) -> Result<Application, ApiError> {
            self.check(&self.fail_writes)?;
            self.inner.create(fields).await
        }

        async fn update(&self, id: Uuid, fields: ApplicationPatch) -> Result<Application, ApiError> {
            self.check(&self.fail_writes)?;
            self.inner.update(id, fields).await
        }

        async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
            self.check(&self.fail_writes)?;
            self.inner.delete(id).await
        }

        async fn move_application(
            &self,
            id: Uuid,
            status: ApplicationStatus,
        ) -> Result<Application, ApiError> {
            self.moves.fetch_add(1, Ordering::SeqCst);
            self.check(&self.fail_writes)?;
            self.inner.move_application(id, status).await
        }
    }

    struct Fixture {
        api: Arc<FlakyApi>,
        notifier: Arc<RecordingNotifier>,
        reconciler: SyncReconciler,
    }

    async fn fixture() -> (Fixture, Application) {
        let api = Arc::new(FlakyApi::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let reconciler = SyncReconciler::new(
            Arc::new(RwLock::new(BoardStore::new())),
            api.clone(),
            notifier.clone(),
        );
        let app = api
            .inner
            .create(NewApplication::new("Acme", "Engineer"))
            .await
            .unwrap();
        reconciler.load().await.unwrap();
        (
            Fixture {
                api,
                notifier,
                reconciler,
            },
            app,
        )
    }

    async fn board_status(f: &Fixture, id: Uuid) -> ApplicationStatus {
        f.reconciler.store().read().await.get(id).unwrap().status
    }

    #[tokio::test]
    async fn test_drop_on_same_column_is_noop() {
        let (f, app) = fixture().await;

        let outcome = f
            .reconciler
            .move_application(app.id, ApplicationStatus::Saved)
            .await;

        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(f.api.moves.load(Ordering::SeqCst), 0);
        assert!(f.notifier.taken().is_empty());
    }

    #[tokio::test]
    async fn test_failed_move_rolls_back_and_notifies_once() {
        let (f, app) = fixture().await;
        let before = f.reconciler.store().read().await.get(app.id).cloned();
        f.api.fail_writes.store(true, Ordering::SeqCst);

        let outcome = f
            .reconciler
            .move_application(app.id, ApplicationStatus::Interview)
            .await;

        assert_eq!(outcome, MoveOutcome::RolledBack);
        assert_eq!(board_status(&f, app.id).await, ApplicationStatus::Saved);
        assert_eq!(f.reconciler.store().read().await.get(app.id).cloned(), before);
        assert_eq!(f.notifier.count(NotificationLevel::Error), 1);
        assert_eq!(f.notifier.count(NotificationLevel::Success), 0);
        assert_eq!(
            f.notifier.taken()[0].description,
            "Failed to move application"
        );
        // No automatic retry.
        assert_eq!(f.api.moves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_move_keeps_state_and_notifies_once() {
        let (f, app) = fixture().await;

        let outcome = f
            .reconciler
            .move_application(app.id, ApplicationStatus::Interview)
            .await;

        assert_eq!(outcome, MoveOutcome::Moved);
        let store = f.reconciler.store().read().await;
        let moved = store.get(app.id).unwrap();
        assert_eq!(moved.status, ApplicationStatus::Interview);
        assert!(moved.updated_at > app.updated_at);
        assert_eq!(f.notifier.count(NotificationLevel::Success), 1);
        assert_eq!(f.notifier.count(NotificationLevel::Error), 0);
        assert_eq!(f.notifier.taken()[0].description, "Moved to Interview");
    }

    #[tokio::test]
    async fn test_unknown_card_is_ignored() {
        let (f, _) = fixture().await;
        let outcome = f
            .reconciler
            .move_application(Uuid::new_v4(), ApplicationStatus::Offer)
            .await;
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(f.api.moves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handle_drop_ignores_cancel_and_click() {
        let (f, app) = fixture().await;
        assert_eq!(
            f.reconciler
                .handle_drop(DragOutcome::Cancelled {
                    application_id: app.id
                })
                .await,
            None
        );
        assert_eq!(
            f.reconciler
                .handle_drop(DragOutcome::Clicked {
                    application_id: app.id
                })
                .await,
            None
        );
        assert_eq!(
            f.reconciler
                .handle_drop(DragOutcome::Dropped {
                    application_id: app.id,
                    status: ApplicationStatus::Offer
                })
                .await,
            Some(MoveOutcome::Moved)
        );
    }

    #[tokio::test]
    async fn test_load_replaces_working_set() {
        let (f, app) = fixture().await;
        let stale = Application::new(
            Uuid::new_v4(),
            NewApplication::new("Stale", "Engineer"),
            Utc::now(),
        );
        f.reconciler
            .store()
            .write()
            .await
            .replace_all(vec![stale.clone()]);

        assert_eq!(f.reconciler.load().await.unwrap(), 1);
        let store = f.reconciler.store().read().await;
        assert!(store.get(stale.id).is_none());
        assert!(store.get(app.id).is_some());
        assert!(f.notifier.taken().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_board_and_notifies() {
        let (f, app) = fixture().await;
        f.api.fail_list.store(true, Ordering::SeqCst);

        assert!(f.reconciler.load().await.is_err());
        assert!(f.reconciler.store().read().await.get(app.id).is_some());
        assert_eq!(
            f.notifier.taken(),
            vec![Notification::error("Failed to load applications")]
        );
    }

    #[tokio::test]
    async fn test_create_failure_leaves_board_untouched() {
        let (f, _) = fixture().await;
        f.api.fail_writes.store(true, Ordering::SeqCst);

        assert!(f
            .reconciler
            .create(NewApplication::new("Globex", "Analyst"))
            .await
            .is_err());
        assert_eq!(f.reconciler.store().read().await.applications().len(), 1);
        assert_eq!(
            f.notifier.taken(),
            vec![Notification::error("Failed to save application")]
        );
    }

    #[tokio::test]
    async fn test_create_validates_before_calling_api() {
        let (f, _) = fixture().await;
        let err = f
            .reconciler
            .create(NewApplication::new("", "Analyst"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(f.api.inner.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_update_delete_reload_board() {
        let (f, app) = fixture().await;

        let created = f
            .reconciler
            .create(NewApplication::new("Globex", "Analyst"))
            .await
            .unwrap();
        assert_eq!(f.reconciler.store().read().await.applications().len(), 2);

        f.reconciler
            .update(
                created.id,
                ApplicationPatch {
                    notes: Some("Recruiter call Friday".into()),
                    ..ApplicationPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            f.reconciler
                .store()
                .read()
                .await
                .get(created.id)
                .unwrap()
                .notes
                .as_deref(),
            Some("Recruiter call Friday")
        );

        f.reconciler.delete(app.id).await.unwrap();
        assert!(f.reconciler.store().read().await.get(app.id).is_none());

        let titles: Vec<_> = f
            .notifier
            .taken()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "Application created",
                "Application updated",
                "Application deleted"
            ]
        );
    }
}
