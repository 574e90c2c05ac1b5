use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

type Hook = Box<dyn FnOnce() + Send>;

/// Handle for removing a hook that has not run yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookId(u64);

#[derive(Default)]
struct TokenState {
    cancelled: bool,
    next_id: u64,
    hooks: Vec<(HookId, Hook)>,
}

/// Single-shot cancellation signal shared between an interrupt source and the
/// consuming loop.
///
/// Once cancelled the token stays cancelled; hooks registered with
/// [`CancellationToken::on_cancel`] run exactly once, either at the moment of
/// cancellation or immediately if the token already fired.
#[derive(Clone, Default)]
pub struct CancellationToken {
    state: Arc<Mutex<TokenState>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Fires the token. Returns `true` only for the call that caused the
    /// transition.
    pub fn cancel(&self) -> bool {
        let hooks = {
            let mut state = self.lock();
            if state.cancelled {
                return false;
            }
            state.cancelled = true;
            std::mem::take(&mut state.hooks)
        };

        info!(hooks = hooks.len(), "run cancelled");
        for (_, hook) in hooks {
            hook();
        }
        true
    }

    /// Registers `hook`. Returns `None` when the token already fired and the
    /// hook ran inline.
    pub fn on_cancel<F>(&self, hook: F) -> Option<HookId>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        if state.cancelled {
            drop(state);
            hook();
            return None;
        }
        let id = HookId(state.next_id);
        state.next_id += 1;
        state.hooks.push((id, Box::new(hook)));
        Some(id)
    }

    /// Drops a pending hook so a token outliving many runs does not
    /// accumulate them.
    pub fn remove_hook(&self, id: HookId) {
        self.lock().hooks.retain(|(hook_id, _)| *hook_id != id);
    }

    pub fn pending_hooks(&self) -> usize {
        self.lock().hooks.len()
    }

    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
