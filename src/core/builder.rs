use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::config::ServiceConfig;
use super::exit::{ExitHook, process_exit_hook};
use super::service::Service;
use crate::activity::ActivityManager;
use crate::error::ServiceError;
use crate::events::EventBus;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::transport::Transport;

/// Builder for constructing a [`Service`].
pub struct ServiceBuilder {
    bus_id: String,
    transport: Arc<dyn Transport>,
    config: ServiceConfig,
    activity_manager: Option<Arc<ActivityManager>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    exit_hook: Option<ExitHook>,
}

impl ServiceBuilder {
    pub(super) fn new(bus_id: String, transport: Arc<dyn Transport>) -> Self {
        Self {
            bus_id,
            transport,
            config: ServiceConfig::default(),
            activity_manager: None,
            subscribers: Vec::new(),
            exit_hook: None,
        }
    }

    /// Replaces the default configuration.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses an existing activity manager instead of creating one from `config.activity`.
    ///
    /// The manager keeps its own exit hook and event bus.
    pub fn activity_manager(mut self, am: Arc<ActivityManager>) -> Self {
        self.activity_manager = Some(am);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the default exit hook (process exit).
    pub fn on_exit(mut self, hook: ExitHook) -> Self {
        self.exit_hook = Some(hook);
        self
    }

    /// Builds the service.
    ///
    /// Must run inside a tokio runtime: the idle timer is armed and subscriber
    /// workers are spawned here. Built-in methods are registered on the primary
    /// handle unless disabled. Exit requests tear down the unified handle before
    /// the exit hook runs.
    pub fn build(self) -> Result<Arc<Service>, ServiceError> {
        let am = match self.activity_manager {
            Some(am) => {
                if self.exit_hook.is_some() {
                    warn!("exit hook ignored: the supplied activity manager keeps its own");
                }
                am
            }
            None => ActivityManager::from_parts(
                self.config.activity.clone(),
                EventBus::new(self.config.bus_capacity_clamped()),
                self.exit_hook.unwrap_or_else(process_exit_hook),
            ),
        };

        if !self.subscribers.is_empty() {
            let set = Arc::new(SubscriberSet::new(self.subscribers, am.events().clone()));
            subscriber_listener(am.events(), set);
        }

        let no_builtins = self.config.no_builtin_methods;
        let service = Arc::new(Service::new_internal(
            self.bus_id,
            self.config,
            self.transport,
            Arc::clone(&am),
        ));
        am.attach(&service);

        let weak = Arc::downgrade(&service);
        am.exit().on_teardown(Arc::new(move || {
            if let Some(service) = weak.upgrade() {
                service.cleanup_unified();
            }
        }));

        if !no_builtins {
            service.register_builtins(service.handle())?;
        }

        info!(
            bus_id = service.bus_id(),
            handle = service.handle().label(),
            "service ready"
        );
        Ok(service)
    }
}

/// Forwards runtime events to the subscriber set (fire-and-forget).
fn subscriber_listener(events: &EventBus, set: Arc<SubscriberSet>) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber listener lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
