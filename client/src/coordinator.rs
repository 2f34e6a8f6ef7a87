//! Refresh coordination: at most one token refresh in flight per client.
//!
//! # States
//!
//! - **Idle**: no refresh outstanding. The first request to fail with 401
//!   becomes the *leader* and performs the refresh.
//! - **Refreshing**: a leader is refreshing. Every other request that fails
//!   with 401 becomes a *follower*: its result slot is queued and it waits.
//!
//! When the leader settles, the flag is cleared and the queue swapped out in
//! one critical section, then every slot receives the same outcome. Stale
//! slots can never leak into the next cycle.
//!
//! The lock is never held across an `.await`; the flag is set in the same
//! critical section that observes `Idle`, so two concurrent 401s cannot both
//! become leader.
//!
//! The leader's [`CycleGuard`] owns a handle on the coordinator, so the
//! refresh can run on its own task and outlive the request that started it.
//!
//! # Example
//!
//! ```rust
//! use lexis_admin_client::coordinator::{RefreshCoordinator, RefreshOutcome, Ticket};
//! use lexis_admin_core::RequestError;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let coordinator = Arc::new(RefreshCoordinator::new());
//! let trigger = RequestError::http(401, "Unauthorized");
//!
//! let Ticket::Leader(leader) = coordinator.begin(&trigger) else { unreachable!() };
//! let Ticket::Follower(follower) = coordinator.begin(&trigger) else { unreachable!() };
//!
//! leader.succeed("new-token".to_string());
//!
//! match follower.outcome().await {
//!     RefreshOutcome::Refreshed { access_token } => assert_eq!(access_token, "new-token"),
//!     RefreshOutcome::Failed(err) => panic!("unexpected failure: {err}"),
//! }
//! # }
//! ```

use lexis_admin_core::RequestError;
use parking_lot::Mutex;
use std::mem;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No refresh outstanding
    Idle,
    /// A leader is refreshing the session
    Refreshing,
}

/// Result of one refresh cycle, shared by the leader and all followers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New session stored; replay with this access token
    Refreshed {
        /// Freshly minted access token
        access_token: String,
    },
    /// Refresh failed and the session was cleared; reject with this error
    Failed(RequestError),
}

#[derive(Debug, Default)]
struct Cycle {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Per-client refresh coordinator.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    cycle: Mutex<Cycle>,
}

/// Role assigned to a request that failed with 401.
#[derive(Debug)]
pub enum Ticket {
    /// Perform the refresh, then settle the cycle
    Leader(CycleGuard),
    /// Wait for the leader's outcome
    Follower(Waiter),
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> State {
        if self.cycle.lock().refreshing {
            State::Refreshing
        } else {
            State::Idle
        }
    }

    /// Number of followers waiting on the current cycle.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.cycle.lock().waiters.len()
    }

    /// Enter the coordinator after a 401.
    ///
    /// Returns [`Ticket::Leader`] if no refresh is in flight (and marks one as
    /// in flight before returning), otherwise queues a slot and returns
    /// [`Ticket::Follower`]. `trigger` is what the leader's guard reports if
    /// it is dropped without settling, and what a follower reports if its slot
    /// is abandoned.
    pub fn begin(self: &Arc<Self>, trigger: &RequestError) -> Ticket {
        let mut cycle = self.cycle.lock();

        if cycle.refreshing {
            let (tx, rx) = oneshot::channel();
            cycle.waiters.push(tx);
            drop(cycle);
            crate::metrics::record_queued();
            tracing::debug!("refresh in flight, queueing request");
            return Ticket::Follower(Waiter {
                rx,
                trigger: trigger.clone(),
            });
        }

        cycle.refreshing = true;
        drop(cycle);
        tracing::info!("session refresh started");
        Ticket::Leader(CycleGuard {
            coordinator: Arc::clone(self),
            trigger: Some(trigger.clone()),
        })
    }

    /// Clear the flag, take the queue and deliver `outcome` to every slot.
    fn settle(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = {
            let mut cycle = self.cycle.lock();
            cycle.refreshing = false;
            mem::take(&mut cycle.waiters)
        };

        let drained = waiters.len();
        for waiter in waiters {
            // A closed slot belongs to a caller that stopped waiting.
            let _ = waiter.send(outcome.clone());
        }
        drained
    }
}

/// Leader's handle on the current cycle.
///
/// Settles the cycle exactly once: explicitly through [`CycleGuard::succeed`]
/// or [`CycleGuard::fail`], or as a failure when dropped.
#[derive(Debug)]
#[must_use = "dropping the guard fails the refresh cycle"]
pub struct CycleGuard {
    coordinator: Arc<RefreshCoordinator>,
    trigger: Option<RequestError>,
}

impl CycleGuard {
    /// Release every follower with the new access token.
    ///
    /// Call only after the new session has been written to the store.
    /// Returns the number of followers released.
    pub fn succeed(mut self, access_token: String) -> usize {
        self.trigger = None;
        let drained = self
            .coordinator
            .settle(&RefreshOutcome::Refreshed { access_token });
        tracing::info!(replays = drained, "session refresh succeeded");
        drained
    }

    /// Reject every follower with the triggering error.
    ///
    /// Call only after the session has been cleared. Returns the triggering
    /// error for the leader's own caller.
    pub fn fail(mut self) -> RequestError {
        let trigger = self
            .trigger
            .take()
            .unwrap_or_else(|| RequestError::http(RequestError::UNAUTHORIZED, "Unauthorized"));
        let drained = self
            .coordinator
            .settle(&RefreshOutcome::Failed(trigger.clone()));
        tracing::info!(rejected = drained, "session refresh failed, session cleared");
        trigger
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            let drained = self.coordinator.settle(&RefreshOutcome::Failed(trigger));
            tracing::info!(rejected = drained, "session refresh abandoned");
        }
    }
}

/// Follower's pending result slot.
#[derive(Debug)]
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
    trigger: RequestError,
}

impl Waiter {
    /// Wait for the leader to settle the cycle.
    pub async fn outcome(self) -> RefreshOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => RefreshOutcome::Failed(self.trigger),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used)]

    use super::*;

    fn shared() -> Arc<RefreshCoordinator> {
        Arc::new(RefreshCoordinator::new())
    }

    fn unauthorized() -> RequestError {
        RequestError::http(401, "Unauthorized")
    }

    fn expect_leader(ticket: Ticket) -> CycleGuard {
        match ticket {
            Ticket::Leader(guard) => guard,
            Ticket::Follower(_) => panic!("expected leader"),
        }
    }

    fn expect_follower(ticket: Ticket) -> Waiter {
        match ticket {
            Ticket::Follower(waiter) => waiter,
            Ticket::Leader(_) => panic!("expected follower"),
        }
    }

    #[test]
    fn first_401_leads_and_sets_flag() {
        let coordinator = shared();
        assert_eq!(coordinator.state(), State::Idle);

        let leader = expect_leader(coordinator.begin(&unauthorized()));
        assert_eq!(coordinator.state(), State::Refreshing);

        let _ = leader.succeed("t".to_string());
        assert_eq!(coordinator.state(), State::Idle);
    }

    #[tokio::test]
    async fn followers_share_success() {
        let coordinator = shared();
        let leader = expect_leader(coordinator.begin(&unauthorized()));
        let followers: Vec<_> = (0..3)
            .map(|_| expect_follower(coordinator.begin(&unauthorized())))
            .collect();
        assert_eq!(coordinator.pending(), 3);

        assert_eq!(leader.succeed("new".to_string()), 3);
        assert_eq!(coordinator.pending(), 0);

        for follower in followers {
            assert_eq!(
                follower.outcome().await,
                RefreshOutcome::Refreshed {
                    access_token: "new".to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn followers_share_failure_with_trigger_error() {
        let coordinator = shared();
        let trigger = RequestError::http(401, "token expired");
        let leader = expect_leader(coordinator.begin(&trigger));
        let follower = expect_follower(coordinator.begin(&unauthorized()));

        let returned = leader.fail();

        assert_eq!(returned, trigger);
        assert_eq!(follower.outcome().await, RefreshOutcome::Failed(trigger));
        assert_eq!(coordinator.state(), State::Idle);
    }

    #[tokio::test]
    async fn dropped_leader_fails_the_cycle() {
        let coordinator = shared();
        let leader = expect_leader(coordinator.begin(&unauthorized()));
        let follower = expect_follower(coordinator.begin(&unauthorized()));

        drop(leader);

        assert_eq!(coordinator.state(), State::Idle);
        assert_eq!(
            follower.outcome().await,
            RefreshOutcome::Failed(unauthorized())
        );
    }

    #[tokio::test]
    async fn guard_settles_from_a_spawned_task() {
        let coordinator = shared();
        let leader = expect_leader(coordinator.begin(&unauthorized()));
        let follower = expect_follower(coordinator.begin(&unauthorized()));

        let released = tokio::spawn(async move { leader.succeed("new".to_string()) })
            .await
            .unwrap();

        assert_eq!(released, 1);
        assert_eq!(coordinator.state(), State::Idle);
        assert_eq!(
            follower.outcome().await,
            RefreshOutcome::Refreshed {
                access_token: "new".to_string()
            }
        );
    }

    #[tokio::test]
    async fn queue_does_not_leak_into_next_cycle() {
        let coordinator = shared();

        let first = expect_leader(coordinator.begin(&unauthorized()));
        let stale = expect_follower(coordinator.begin(&unauthorized()));
        let _ = first.succeed("one".to_string());

        let second = expect_leader(coordinator.begin(&unauthorized()));
        assert_eq!(coordinator.pending(), 0);
        let fresh = expect_follower(coordinator.begin(&unauthorized()));
        assert_eq!(second.succeed("two".to_string()), 1);

        assert_eq!(
            stale.outcome().await,
            RefreshOutcome::Refreshed {
                access_token: "one".to_string()
            }
        );
        assert_eq!(
            fresh.outcome().await,
            RefreshOutcome::Refreshed {
                access_token: "two".to_string()
            }
        );
    }

    #[tokio::test]
    async fn abandoned_follower_does_not_block_drain() {
        let coordinator = shared();
        let leader = expect_leader(coordinator.begin(&unauthorized()));
        let gone = expect_follower(coordinator.begin(&unauthorized()));
        let kept = expect_follower(coordinator.begin(&unauthorized()));

        drop(gone);

        assert_eq!(leader.succeed("new".to_string()), 2);
        assert!(matches!(
            kept.outcome().await,
            RefreshOutcome::Refreshed { .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_401s_elect_exactly_one_leader() {
        let coordinator = shared();
        let barrier = Arc::new(tokio::sync::Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    match coordinator.begin(&unauthorized()) {
                        Ticket::Leader(guard) => {
                            // Keep the cycle open until every task has entered.
                            while coordinator.pending() < 15 {
                                tokio::task::yield_now().await;
                            }
                            let _ = guard.succeed("new".to_string());
                            true
                        }
                        Ticket::Follower(waiter) => {
                            assert!(matches!(
                                waiter.outcome().await,
                                RefreshOutcome::Refreshed { .. }
                            ));
                            false
                        }
                    }
                })
            })
            .collect();

        let mut leaders = 0;
        for handle in handles {
            if handle.await.unwrap() {
                leaders += 1;
            }
        }

        assert_eq!(leaders, 1);
        assert_eq!(coordinator.state(), State::Idle);
    }
}
