//! Remembered session slot.
//!
//! Holds at most one unlocked document so it can be reopened without
//! re-authentication for a bounded time. Each publication gets a generation
//! number; expiry timers only clear the generation they were started for, so
//! a replaced session is never cleared by an older timer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::decrypted::DecryptedMessage;

#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<SlotInner>,
}

struct SlotInner {
    state: Mutex<SlotState>,
    changes: watch::Sender<u64>,
}

impl Default for SlotInner {
    fn default() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Mutex::default(),
            changes,
        }
    }
}

#[derive(Default)]
struct SlotState {
    generation: u64,
    session: Option<DecryptedMessage>,
    ttl: Option<Duration>,
    timer: Option<JoinHandle<()>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot's content and start its countdown.
    ///
    /// `None` never expires; a zero `ttl` clears immediately. Returns the
    /// generation of this publication. Must be called within a Tokio runtime
    /// when `ttl` is non-zero.
    pub fn publish(&self, session: DecryptedMessage, ttl: Option<Duration>) -> u64 {
        let generation = {
            let mut state = self.lock();
            cancel_timer(&mut state);
            state.generation += 1;
            state.ttl = ttl;
            if ttl == Some(Duration::ZERO) {
                state.session = None;
            } else {
                state.session = Some(session);
                state.timer = ttl.map(|ttl| self.start_timer(state.generation, ttl));
            }
            state.generation
        };
        self.notify();
        generation
    }

    pub fn current(&self) -> Option<DecryptedMessage> {
        self.lock().session.clone()
    }

    /// Swap in a newer snapshot of the same session. The countdown and
    /// generation are unchanged. Does nothing when the slot is empty.
    pub fn update(&self, session: DecryptedMessage) {
        let mut state = self.lock();
        if state.session.is_some() {
            state.session = Some(session);
        }
    }

    pub fn clear(&self) {
        {
            let mut state = self.lock();
            cancel_timer(&mut state);
            state.generation += 1;
            state.session = None;
        }
        self.notify();
    }

    /// Cancel the countdown; the session stays until cleared or restarted.
    pub fn hold(&self) {
        let mut state = self.lock();
        cancel_timer(&mut state);
    }

    /// Restart the countdown with `ttl`, or with the publication's ttl when
    /// `None` is given and one was set.
    pub fn restart(&self, ttl: Option<Duration>) {
        let expired = {
            let mut state = self.lock();
            cancel_timer(&mut state);
            if state.session.is_none() {
                return;
            }
            if ttl.is_some() {
                state.ttl = ttl;
            }
            match state.ttl {
                Some(Duration::ZERO) => {
                    state.generation += 1;
                    state.session = None;
                    true
                }
                Some(ttl) => {
                    state.timer = Some(self.start_timer(state.generation, ttl));
                    false
                }
                None => false,
            }
        };
        if expired {
            self.notify();
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        let state = self.lock();
        state.generation == generation && state.session.is_some()
    }

    /// Wait until publication `generation` has expired, been cleared, or been
    /// replaced.
    pub async fn released(&self, generation: u64) {
        let mut changes = self.inner.changes.subscribe();
        while self.is_current(generation) {
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    fn start_timer(&self, generation: u64, ttl: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let expired = {
                let mut state = lock_state(&inner);
                if state.generation == generation && state.session.is_some() {
                    state.session = None;
                    state.timer = None;
                    state.generation += 1;
                    true
                } else {
                    false
                }
            };
            if expired {
                tracing::debug!(generation, "Remembered session expired");
                inner.changes.send_modify(|version| *version += 1);
            }
        })
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|version| *version += 1);
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        lock_state(&self.inner)
    }
}

fn lock_state(inner: &SlotInner) -> MutexGuard<'_, SlotState> {
    inner
        .state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn cancel_timer(state: &mut SlotState) {
    if let Some(timer) = state.timer.take() {
        timer.abort();
    }
}

impl std::fmt::Debug for SessionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionSlot")
            .field("generation", &state.generation)
            .field("occupied", &state.session.is_some())
            .field("ttl", &state.ttl)
            .finish()
    }
}
