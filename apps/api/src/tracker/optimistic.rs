//! Optimistic mutation: apply locally, persist remotely, roll back on failure.

use std::future::Future;

use tokio::sync::RwLock;

/// State that can be captured and restored wholesale.
pub trait Snapshot {
    type Snapshot: Send;

    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// Runs one optimistic mutation against shared state.
///
/// `apply` runs under the write lock and is visible to readers immediately.
/// The lock is released while `persist` is awaited. If `persist` fails the
/// state captured just before `apply` is restored in full and the error is
/// returned. There is no retry.
pub async fn optimistic<S, T, E, A, P, Fut>(state: &RwLock<S>, apply: A, persist: P) -> Result<T, E>
where
    S: Snapshot,
    A: FnOnce(&mut S),
    P: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let before = {
        let mut guard = state.write().await;
        let before = guard.snapshot();
        apply(&mut *guard);
        before
    };

    match persist().await {
        Ok(value) => Ok(value),
        Err(e) => {
            state.write().await.restore(before);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        value: i32,
        label: &'static str,
    }

    impl Snapshot for Counter {
        type Snapshot = i32;

        fn snapshot(&self) -> i32 {
            self.value
        }

        fn restore(&mut self, snapshot: i32) {
            self.value = snapshot;
        }
    }

    #[tokio::test]
    async fn test_success_keeps_applied_state() {
        let state = RwLock::new(Counter::default());
        let result: Result<&str, String> =
            optimistic(&state, |c| c.value += 5, || async { Ok("saved") }).await;

        assert_eq!(result, Ok("saved"));
        assert_eq!(state.read().await.value, 5);
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot() {
        let state = RwLock::new(Counter {
            value: 2,
            label: "start",
        });
        let result: Result<(), String> = optimistic(
            &state,
            |c| {
                c.value = 40;
                c.label = "changed";
            },
            || async { Err("offline".to_string()) },
        )
        .await;

        assert_eq!(result, Err("offline".to_string()));
        let state = state.read().await;
        assert_eq!(state.value, 2);
        // Only what the snapshot captures is rolled back.
        assert_eq!(state.label, "changed");
    }

    #[tokio::test]
    async fn test_applied_state_visible_while_persisting() {
        let state = RwLock::new(Counter::default());
        let result: Result<i32, String> = optimistic(
            &state,
            |c| c.value = 7,
            || async { Ok(state.read().await.value) },
        )
        .await;
        assert_eq!(result, Ok(7));
    }
}
