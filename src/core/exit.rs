//! # Process exit coordination.
//!
//! Both exit paths (idle timeout and the built-in `quit`) go through one
//! [`Exit`] handle: the first request wins, publishes `ExitRequested`, cancels
//! the exit token, runs the runtime teardown
//! (unified handle release) and then the exit hook. Later requests are ignored.
//!
//! The default hook terminates the process. Embedders and tests install their
//! own hook with `ServiceBuilder::on_exit` or `ActivityManager::with_exit_hook`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::events::{Event, EventBus, EventKind};

/// Why the runtime is shutting down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// No activity for the configured idle timeout.
    IdleTimeout,
    /// The built-in `quit` method was called.
    Quit,
    /// An OS termination signal arrived.
    Signal,
}

impl ExitReason {
    /// Stable label for logs/events.
    pub fn as_label(self) -> &'static str {
        match self {
            ExitReason::IdleTimeout => "idle_timeout",
            ExitReason::Quit => "quit",
            ExitReason::Signal => "signal",
        }
    }
}

/// Callback invoked once when the runtime decides to exit.
pub type ExitHook = Arc<dyn Fn(ExitReason) + Send + Sync + 'static>;

/// Hook that terminates the process with status 0.
pub fn process_exit_hook() -> ExitHook {
    Arc::new(|reason: ExitReason| {
        tracing::info!(reason = reason.as_label(), "exiting");
        std::process::exit(0);
    })
}

/// Runtime teardown that runs before the exit hook.
pub(crate) type Teardown = Arc<dyn Fn() + Send + Sync + 'static>;

/// One-shot exit latch shared by the service and its activity manager.
#[derive(Clone)]
pub struct Exit {
    hook: ExitHook,
    token: CancellationToken,
    reason: Arc<Mutex<Option<ExitReason>>>,
    teardown: Arc<Mutex<Option<Teardown>>>,
    events: EventBus,
}

impl Exit {
    pub(crate) fn new(hook: ExitHook, events: EventBus) -> Self {
        Self {
            hook,
            token: CancellationToken::new(),
            reason: Arc::new(Mutex::new(None)),
            teardown: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// Requests exit. Returns false if an exit was already requested.
    ///
    /// The registered teardown runs first, for every reason. The hook then runs
    /// for `IdleTimeout` and `Quit`; `Signal` only cancels the token, the
    /// embedding `main` is expected to return on its own.
    pub fn request(&self, reason: ExitReason) -> bool {
        {
            let mut slot = self.reason.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(reason);
        }

        self.events
            .publish(Event::new(EventKind::ExitRequested).with_reason(reason.as_label()));
        self.token.cancel();

        let teardown = self.teardown.lock().clone();
        if let Some(teardown) = teardown {
            teardown();
        }

        if reason != ExitReason::Signal {
            (self.hook)(reason);
        }
        true
    }

    /// Installs the teardown run by the first exit request, replacing any previous one.
    pub(crate) fn on_teardown(&self, teardown: Teardown) {
        *self.teardown.lock() = Some(teardown);
    }

    /// The reason of the first exit request, if any.
    pub fn reason(&self) -> Option<ExitReason> {
        *self.reason.lock()
    }

    /// Token cancelled by the first exit request.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (ExitHook, Arc<AtomicUsize>) {
        let n = Arc::new(AtomicUsize::new(0));
        let c = n.clone();
        (
            Arc::new(move |_: ExitReason| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
            n,
        )
    }

    #[test]
    fn first_request_wins() {
        let (hook, n) = counting();
        let exit = Exit::new(hook, EventBus::new(8));

        assert!(exit.request(ExitReason::Quit));
        assert!(!exit.request(ExitReason::IdleTimeout));
        assert_eq!(n.load(Ordering::SeqCst), 1);
        assert_eq!(exit.reason(), Some(ExitReason::Quit));
        assert!(exit.token().is_cancelled());
    }

    #[test]
    fn signal_skips_hook() {
        let (hook, n) = counting();
        let exit = Exit::new(hook, EventBus::new(8));

        assert!(exit.request(ExitReason::Signal));
        assert_eq!(n.load(Ordering::SeqCst), 0);
        assert!(exit.token().is_cancelled());
    }

    #[test]
    fn teardown_runs_once_before_hook() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let o = order.clone();
        let exit = Exit::new(
            Arc::new(move |_: ExitReason| o.lock().push("hook")),
            EventBus::new(8),
        );
        let o = order.clone();
        exit.on_teardown(Arc::new(move || o.lock().push("teardown")));

        assert!(exit.request(ExitReason::IdleTimeout));
        assert!(!exit.request(ExitReason::Quit));
        assert_eq!(*order.lock(), vec!["teardown", "hook"]);
    }
}
