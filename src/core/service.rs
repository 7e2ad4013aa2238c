//! # Service: the bus-attached facade.
//!
//! A [`Service`] owns the bus handles, the method table, the table of inbound
//! subscribing calls, the table of outbound subscriptions, and exactly one
//! [`ActivityManager`].
//!
//! ## Architecture
//! ```text
//!                   register / register_private
//!   embedder ──────────────────────────────────► MethodTable ──► Transport::register_method
//!
//!   Transport ── dispatch(handle, RawMessage) ──► Service
//!                 ├─ Request ─► Method "request" listeners (subscribing calls tracked)
//!                 ├─ Cancel  ─► cancel_subscription ─► Method "cancel" listeners
//!                 └─ miss    ─► DispatchMissed event, nothing else
//!
//!   call / subscribe ──► Transport::send_call(sending_handle, ...)
//!
//!   ActivityManager ── idle timeout ──┐
//!   built-in quit  ───────────────────┼──► Exit (one-shot) ──► exit hook
//!   run_until_exit: OS signal ────────┘
//! ```
//!
//! ## Handle model
//! - [`SecurityModel::Acg`]: one unified handle for everything.
//! - [`SecurityModel::DualBus`]: `register` goes to the public handle,
//!   `register_private` to the private one. Outbound calls use the private
//!   handle only for privileged bus ids.
//!
//! ## Rules
//! - Table locks are never held while listeners run or across `.await`.
//! - Dispatch of an unknown route has no effect beyond a `DispatchMissed` event.
//! - The unified handle is released at most once.

use std::collections::HashMap;
use std::future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::{select, sync::broadcast};
use tracing::{debug, info, trace, warn};

use super::builder::ServiceBuilder;
use super::builtins;
use super::config::{SecurityModel, ServiceConfig};
use super::exit::{Exit, ExitReason};
use super::registry::{MethodTable, split_name};
use super::shutdown;
use crate::activity::ActivityManager;
use crate::endpoints::{Message, Method, MethodDef, MethodEvent, Subscription};
use crate::error::{BusError, ServiceError};
use crate::events::{Event, EventBus, EventKind};
use crate::transport::{BusHandle, CallToken, FrameKind, RawMessage, Transport};

/// Bus id prefixes that get the private handle for outbound calls.
const PRIVILEGED_PREFIXES: [&str; 3] = ["com.palm.", "com.webos.", "com.lge."];

#[derive(Default)]
struct ServiceState {
    methods: MethodTable,
    /// Inbound subscribing calls by unique token.
    subscriptions: HashMap<String, Message>,
    /// Outbound subscriptions by call token.
    outbound: HashMap<CallToken, Arc<Subscription>>,
    has_public_methods: bool,
    cleanup_unified_done: bool,
}

/// Bus-attached service.
pub struct Service {
    bus_id: String,
    config: ServiceConfig,
    transport: Arc<dyn Transport>,
    activity_manager: Arc<ActivityManager>,
    events: EventBus,
    state: Mutex<ServiceState>,
}

impl Service {
    /// Starts building a service for `bus_id` on top of `transport`.
    pub fn builder(bus_id: impl Into<String>, transport: Arc<dyn Transport>) -> ServiceBuilder {
        ServiceBuilder::new(bus_id.into(), transport)
    }

    pub(super) fn new_internal(
        bus_id: String,
        config: ServiceConfig,
        transport: Arc<dyn Transport>,
        activity_manager: Arc<ActivityManager>,
    ) -> Self {
        let events = activity_manager.events().clone();
        Self {
            bus_id,
            config,
            transport,
            activity_manager,
            events,
            state: Mutex::new(ServiceState::default()),
        }
    }

    // ---------------------------
    // Registration
    // ---------------------------

    /// Registers a method on the public bus (the unified handle under ACG).
    pub fn register(&self, def: impl Into<MethodDef>) -> Result<Arc<Method>, ServiceError> {
        self.register_on(false, def.into())
    }

    /// Registers a method on the private bus (the unified handle under ACG).
    pub fn register_private(&self, def: impl Into<MethodDef>) -> Result<Arc<Method>, ServiceError> {
        self.register_on(true, def.into())
    }

    fn register_on(&self, is_private: bool, def: MethodDef) -> Result<Arc<Method>, ServiceError> {
        let handle = match (self.config.security, is_private) {
            (SecurityModel::Acg, _) => BusHandle::Unified,
            (SecurityModel::DualBus, true) => BusHandle::Private,
            (SecurityModel::DualBus, false) => BusHandle::Public,
        };
        let method = self.install(handle, def)?;

        if is_private {
            return Ok(method);
        }

        let first_public = {
            let mut st = self.state.lock();
            !std::mem::replace(&mut st.has_public_methods, true)
        };
        if first_public && handle == BusHandle::Public && !self.config.no_builtin_methods {
            self.register_builtins(BusHandle::Public)?;
        }
        Ok(method)
    }

    pub(super) fn register_builtins(&self, handle: BusHandle) -> Result<(), ServiceError> {
        for def in builtins::definitions() {
            self.install(handle, def)?;
        }
        debug!(bus_id = %self.bus_id, handle = handle.label(), "built-in methods registered");
        Ok(())
    }

    /// Routes `(category, name)` on `handle` to this service and stores the method.
    fn install(&self, handle: BusHandle, def: MethodDef) -> Result<Arc<Method>, ServiceError> {
        let (full, description, on_request, on_cancel) = def.into_parts();
        let (category, name) = split_name(&full)?;

        self.transport.register_method(handle, &category, &name)?;

        let method = Arc::new(Method::new(category.clone(), name.clone(), description));
        if let Some(listener) = on_request {
            method.attach(MethodEvent::Request, listener);
        }
        if let Some(listener) = on_cancel {
            method.attach(MethodEvent::Cancel, listener);
        }

        let replaced = self.state.lock().methods.insert(Arc::clone(&method));
        if replaced.is_some() {
            debug!(%category, %name, "method re-registered; previous listeners dropped");
        }

        self.events.publish(
            Event::new(EventKind::MethodRegistered)
                .with_category(category.as_str())
                .with_method(name.as_str())
                .with_reason(handle.label()),
        );
        debug!(%category, %name, handle = handle.label(), "method registered");
        Ok(method)
    }

    // ---------------------------
    // Outbound calls
    // ---------------------------

    /// One-shot call; resolves with the first response.
    pub async fn call(self: &Arc<Self>, uri: &str, args: Value) -> Result<Message, ServiceError> {
        let handle = self.sending_handle();
        let mut call = self.transport.send_call(handle, uri, args, false).await?;
        let raw = call
            .responses
            .recv()
            .await
            .ok_or_else(|| BusError::NoResponse {
                uri: uri.to_string(),
            })?;
        trace!(uri, token = call.token, "call answered");
        Ok(Message::new(raw, handle, self))
    }

    /// Persistent call; every response is emitted on the returned subscription.
    ///
    /// The subscription stays tracked until cancelled or closed by the remote end.
    /// Responses and the remote close are only read once a listener is attached
    /// with [`Subscription::on_response`]; an unobserved subscription stays
    /// tracked until it is cancelled or `cleanup_unified` runs.
    pub async fn subscribe(
        self: &Arc<Self>,
        uri: &str,
        args: Value,
    ) -> Result<Arc<Subscription>, ServiceError> {
        let handle = self.sending_handle();
        let call = self
            .transport
            .send_call(handle, uri, args.clone(), true)
            .await?;
        let sub = Subscription::open(self, handle, uri, args, call);
        self.state
            .lock()
            .outbound
            .insert(sub.token(), Arc::clone(&sub));
        Ok(sub)
    }

    // ---------------------------
    // Inbound dispatch
    // ---------------------------

    /// Entry point for inbound events delivered by the transport.
    pub fn dispatch(self: &Arc<Self>, handle: BusHandle, raw: RawMessage) {
        match raw.kind {
            FrameKind::Request => {}
            FrameKind::Cancel => return self.cancel_subscription(handle, raw),
            FrameKind::Response => {
                trace!(uri = %raw.method, token = raw.token, "stray response frame ignored");
                return;
            }
        }

        let Some(method) = self.method(&raw.category, &raw.method) else {
            self.missed(handle, &raw);
            return;
        };

        let msg = Message::new(raw, handle, self);
        if msg.is_subscription() {
            self.state
                .lock()
                .subscriptions
                .insert(msg.unique_token().to_string(), msg.clone());
        }

        self.events.publish(
            Event::new(EventKind::RequestDispatched)
                .with_category(msg.category())
                .with_method(msg.method())
                .with_token(msg.token()),
        );
        trace!(
            category = msg.category(),
            method = msg.method(),
            handle = handle.label(),
            "request dispatched"
        );
        method.emit(MethodEvent::Request, &msg);
    }

    /// Resolves a caller's cancellation to the tracked subscribing call and emits `cancel`.
    ///
    /// Unknown unique tokens are ignored.
    pub fn cancel_subscription(self: &Arc<Self>, handle: BusHandle, raw: RawMessage) {
        let tracked = self.state.lock().subscriptions.remove(&raw.unique_token);
        let Some(msg) = tracked else {
            trace!(unique_token = %raw.unique_token, "cancel for untracked call ignored");
            return;
        };

        let Some(method) = self.method(msg.category(), msg.method()) else {
            self.missed(handle, &raw);
            return;
        };

        self.events.publish(
            Event::new(EventKind::CancelDispatched)
                .with_category(msg.category())
                .with_method(msg.method())
                .with_token(msg.token()),
        );
        debug!(
            category = msg.category(),
            method = msg.method(),
            handle = handle.label(),
            "subscription cancelled by caller"
        );
        method.emit(MethodEvent::Cancel, &msg);
    }

    fn missed(&self, handle: BusHandle, raw: &RawMessage) {
        self.events.publish(
            Event::new(EventKind::DispatchMissed)
                .with_category(raw.category.as_str())
                .with_method(raw.method.as_str())
                .with_token(raw.token),
        );
        trace!(
            category = %raw.category,
            method = %raw.method,
            handle = handle.label(),
            "no such method"
        );
    }

    pub(crate) fn forget_subscription(&self, unique_token: &str) {
        self.state.lock().subscriptions.remove(unique_token);
    }

    pub(crate) fn forget_outbound(&self, token: CallToken) {
        self.state.lock().outbound.remove(&token);
    }

    // ---------------------------
    // Identity and handles
    // ---------------------------

    /// True for bus ids under the privileged namespaces.
    pub fn id_is_privileged(id: &str) -> bool {
        PRIVILEGED_PREFIXES.iter().any(|p| id.starts_with(p))
    }

    pub fn bus_id(&self) -> &str {
        &self.bus_id
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Primary handle: unified under ACG, private otherwise.
    pub fn handle(&self) -> BusHandle {
        match self.config.security {
            SecurityModel::Acg => BusHandle::Unified,
            SecurityModel::DualBus => BusHandle::Private,
        }
    }

    /// Public handle; none under ACG.
    pub fn public_handle(&self) -> Option<BusHandle> {
        match self.config.security {
            SecurityModel::Acg => None,
            SecurityModel::DualBus => Some(BusHandle::Public),
        }
    }

    /// Handle used for outbound calls.
    pub fn sending_handle(&self) -> BusHandle {
        match self.config.security {
            SecurityModel::Acg => BusHandle::Unified,
            SecurityModel::DualBus if Self::id_is_privileged(&self.bus_id) => BusHandle::Private,
            SecurityModel::DualBus => BusHandle::Public,
        }
    }

    pub fn has_public_methods(&self) -> bool {
        self.state.lock().has_public_methods
    }

    pub fn method(&self, category: &str, name: &str) -> Option<Arc<Method>> {
        self.state.lock().methods.get(category, name)
    }

    /// Number of registered `(category, name)` routes, built-ins included.
    pub fn method_count(&self) -> usize {
        self.state.lock().methods.len()
    }

    pub(crate) fn routes(&self) -> Vec<String> {
        self.state.lock().methods.routes()
    }

    /// Number of tracked inbound subscribing calls.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Number of live outbound subscriptions.
    pub fn outbound_count(&self) -> usize {
        self.state.lock().outbound.len()
    }

    pub fn activity_manager(&self) -> &Arc<ActivityManager> {
        &self.activity_manager
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Receiver of runtime events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Exit latch shared with the activity manager.
    pub fn exit(&self) -> &Exit {
        self.activity_manager.exit()
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Tears down the unified handle: cancels outbound subscriptions and releases it once.
    ///
    /// No-op outside ACG and on repeated calls.
    pub fn cleanup_unified(&self) {
        if !self.config.uses_acg() {
            return;
        }
        let outbound: Vec<Arc<Subscription>> = {
            let mut st = self.state.lock();
            if std::mem::replace(&mut st.cleanup_unified_done, true) {
                return;
            }
            st.outbound.drain().map(|(_, sub)| sub).collect()
        };

        for sub in outbound {
            sub.cancel();
        }
        self.transport.release(BusHandle::Unified);
        info!(bus_id = %self.bus_id, "unified handle released");
    }

    /// Waits for an exit request or an OS termination signal, then tears down.
    ///
    /// Returns the reason of the first exit request.
    pub async fn run_until_exit(&self) -> ExitReason {
        let token = self.exit().token();
        let signal = async {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(name) => info!(bus_id = %self.bus_id, signal = name, "termination signal received"),
                Err(e) => {
                    warn!(error = %e, "cannot listen for termination signals");
                    future::pending::<()>().await;
                }
            }
        };

        select! {
            _ = token.cancelled() => {}
            _ = signal => {
                self.exit().request(ExitReason::Signal);
            }
        }

        self.cleanup_unified();
        self.exit().reason().unwrap_or(ExitReason::Signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExitHook;
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_hook() -> (ExitHook, Arc<AtomicUsize>) {
        let n = Arc::new(AtomicUsize::new(0));
        let c = n.clone();
        (
            Arc::new(move |_: ExitReason| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
            n,
        )
    }

    fn build(bus_id: &str, config: ServiceConfig) -> (Arc<Service>, Arc<MemoryTransport>, Arc<AtomicUsize>) {
        let transport = MemoryTransport::new();
        let (hook, exits) = counting_hook();
        let service = Service::builder(bus_id, transport.clone())
            .config(config)
            .on_exit(hook)
            .build()
            .expect("service");
        (service, transport, exits)
    }

    #[tokio::test]
    async fn builtins_start_on_private_only() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        let regs = t.registrations();
        assert!(regs.contains(&(BusHandle::Private, "/".into(), "info".into())));
        assert!(regs.contains(&(BusHandle::Private, "/".into(), "quit".into())));
        assert!(regs.iter().all(|(h, _, _)| *h == BusHandle::Private));
        assert!(!svc.has_public_methods());
    }

    #[tokio::test]
    async fn first_public_method_adds_public_builtins_once() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        svc.register("ping").expect("ping");
        svc.register("pong").expect("pong");

        let public: Vec<_> = t
            .registrations()
            .into_iter()
            .filter(|(h, _, _)| *h == BusHandle::Public)
            .map(|(_, _, name)| name)
            .collect();
        assert_eq!(public, vec!["ping", "info", "quit", "pong"]);
        assert!(svc.has_public_methods());
    }

    #[tokio::test]
    async fn no_builtins_when_disabled() {
        let cfg = ServiceConfig {
            no_builtin_methods: true,
            ..ServiceConfig::default()
        };
        let (svc, t, _) = build("com.example.svc", cfg);
        svc.register("ping").expect("ping");
        assert_eq!(t.registrations().len(), 1);
        assert_eq!(svc.method_count(), 1);
        assert!(svc.method("/", "quit").is_none());
    }

    #[tokio::test]
    async fn acg_uses_the_unified_handle() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::acg());
        svc.register("ping").expect("ping");
        svc.register_private("secret").expect("secret");

        assert!(t.registrations().iter().all(|(h, _, _)| *h == BusHandle::Unified));
        assert_eq!(svc.handle(), BusHandle::Unified);
        assert_eq!(svc.public_handle(), None);
        assert_eq!(svc.sending_handle(), BusHandle::Unified);
    }

    #[tokio::test]
    async fn category_prefix_is_split() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        let m = svc.register_private("sub/get").expect("get");
        assert_eq!(m.category(), "/sub");
        assert_eq!(m.name(), "get");
        assert!(t.registrations().contains(&(BusHandle::Private, "/sub".into(), "get".into())));

        let err = svc.register("sub/").expect_err("invalid");
        assert_eq!(err.as_label(), "service_invalid_method_name");
    }

    #[test]
    fn privileged_prefixes() {
        assert!(Service::id_is_privileged("com.palm.app"));
        assert!(Service::id_is_privileged("com.webos.service.x"));
        assert!(Service::id_is_privileged("com.lge.y"));
        assert!(!Service::id_is_privileged("com.example.z"));
        assert!(!Service::id_is_privileged("com.webosx"));
    }

    #[tokio::test]
    async fn sending_handle_follows_privilege() {
        let (a, _, _) = build("com.webos.service.test", ServiceConfig::default());
        let (b, _, _) = build("com.example.test", ServiceConfig::default());
        assert_eq!(a.sending_handle(), BusHandle::Private);
        assert_eq!(b.sending_handle(), BusHandle::Public);
    }

    #[tokio::test]
    async fn dispatch_fires_exactly_one_request_with_raw_fields() {
        let (svc, _, _) = build("com.example.svc", ServiceConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        svc.register(MethodDef::new("sub/echo").on_request(move |msg| {
            s.lock().push(msg.raw().clone());
        }))
        .expect("echo");

        let raw = RawMessage::request("/sub", "echo", json!({"x": 1}))
            .with_sender("com.example.client")
            .with_token(7)
            .with_unique_token("u7");
        svc.dispatch(BusHandle::Public, raw.clone());

        assert_eq!(*seen.lock(), vec![raw]);
    }

    #[tokio::test]
    async fn unknown_route_has_no_effect() {
        let (svc, t, exits) = build("com.example.svc", ServiceConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        svc.register(MethodDef::new("ping").on_request(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        }))
        .expect("ping");
        let mut rx = svc.events();

        svc.dispatch(BusHandle::Public, RawMessage::request("/", "nope", json!({})));
        svc.dispatch(BusHandle::Public, RawMessage::request("/other", "ping", json!({})));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(t.responses().is_empty());
        assert_eq!(svc.subscription_count(), 0);
        assert_eq!(exits.load(Ordering::SeqCst), 0);
        assert_eq!(rx.try_recv().expect("missed").kind, EventKind::DispatchMissed);
    }

    #[tokio::test]
    async fn caller_cancel_reaches_cancel_listeners() {
        let (svc, _, _) = build("com.example.svc", ServiceConfig::default());
        let cancels = Arc::new(Mutex::new(Vec::new()));
        let c = cancels.clone();
        svc.register(
            MethodDef::new("watch")
                .on_request(|_| {})
                .on_cancel(move |msg| c.lock().push(msg.token())),
        )
        .expect("watch");

        let req = RawMessage::request("/", "watch", json!({"subscribe": true}))
            .with_token(3)
            .with_unique_token("u3");
        svc.dispatch(BusHandle::Public, req);
        assert_eq!(svc.subscription_count(), 1);

        svc.dispatch(BusHandle::Public, RawMessage::cancel("/", "watch").with_unique_token("u3"));
        assert_eq!(*cancels.lock(), vec![3]);
        assert_eq!(svc.subscription_count(), 0);

        // A second cancel for the same token is ignored.
        svc.dispatch(BusHandle::Public, RawMessage::cancel("/", "watch").with_unique_token("u3"));
        assert_eq!(cancels.lock().len(), 1);
    }

    #[tokio::test]
    async fn non_subscribing_requests_are_not_tracked() {
        let (svc, _, _) = build("com.example.svc", ServiceConfig::default());
        svc.register("ping").expect("ping");
        svc.dispatch(
            BusHandle::Public,
            RawMessage::request("/", "ping", json!({"subscribe": false})).with_unique_token("u1"),
        );
        assert_eq!(svc.subscription_count(), 0);
    }

    #[tokio::test]
    async fn message_cancel_sends_frame_and_untracks() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        svc.register(MethodDef::new("watch").on_request(|msg| {
            msg.respond(json!({"first": true}));
            msg.cancel(json!({"done": true}));
        }))
        .expect("watch");

        svc.dispatch(
            BusHandle::Public,
            RawMessage::request("/", "watch", json!({"subscribe": true}))
                .with_token(4)
                .with_unique_token("u4"),
        );

        assert_eq!(t.responses()[0].payload, json!({"first": true}));
        assert_eq!(t.cancels()[0].token, 4);
        assert_eq!(svc.subscription_count(), 0);
    }

    #[tokio::test]
    async fn respond_reports_dead_session() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        let result = Arc::new(Mutex::new(None));
        let r = result.clone();
        svc.register(MethodDef::new("ping").on_request(move |msg| {
            *r.lock() = Some(msg.respond(json!({})));
        }))
        .expect("ping");

        t.drop_session(9);
        svc.dispatch(BusHandle::Public, RawMessage::request("/", "ping", json!({})).with_token(9));
        assert_eq!(*result.lock(), Some(false));
    }

    #[tokio::test]
    async fn call_resolves_with_first_response() {
        let (svc, t, _) = build("com.webos.svc", ServiceConfig::default());
        t.reply_with("luna://com.example/ping", |_| vec![json!({"pong": 1}), json!({"pong": 2})]);

        let reply = svc
            .call("luna://com.example/ping", json!({}))
            .await
            .expect("reply");
        assert_eq!(reply.payload(), &json!({"pong": 1}));
        assert_eq!(reply.handle(), BusHandle::Private);
        assert!(!t.calls()[0].subscribe);
    }

    #[tokio::test]
    async fn call_without_response_fails() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        t.reply_with("luna://com.example/silent", |_| Vec::new());

        let err = svc
            .call("luna://com.example/silent", json!({}))
            .await
            .expect_err("no response");
        assert_eq!(err.as_label(), "bus_no_response");
    }

    #[tokio::test]
    async fn subscription_streams_until_cancelled() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        let sub = svc
            .subscribe("luna://com.example/watch", json!({"subscribe": true}))
            .await
            .expect("sub");
        assert_eq!(svc.outbound_count(), 1);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        sub.on_response(move |msg| {
            let _ = tx.send(msg.payload().clone());
        });

        assert!(t.push_response(sub.token(), json!({"n": 1})));
        assert!(t.push_response(sub.token(), json!({"n": 2})));
        assert_eq!(rx.recv().await, Some(json!({"n": 1})));
        assert_eq!(rx.recv().await, Some(json!({"n": 2})));

        sub.cancel();
        assert!(sub.is_closed());
        assert_eq!(svc.outbound_count(), 0);
        assert_eq!(t.cancelled_calls(), vec![sub.token()]);
        assert!(!t.push_response(sub.token(), json!({"n": 3})));
        // Listeners were dropped on close, so the sender is gone.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn remote_close_untracks_subscription() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        let sub = svc
            .subscribe("luna://com.example/watch", json!({}))
            .await
            .expect("sub");
        sub.on_response(|_| {});

        t.close_call(sub.token());
        sub.closed().await;
        assert!(sub.is_closed());
        assert_eq!(svc.outbound_count(), 0);
        assert!(t.cancelled_calls().is_empty());
    }

    #[tokio::test]
    async fn cleanup_unified_releases_once() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::acg());
        let sub = svc
            .subscribe("luna://com.example/watch", json!({}))
            .await
            .expect("sub");

        svc.cleanup_unified();
        svc.cleanup_unified();
        assert_eq!(t.released(), vec![BusHandle::Unified]);
        assert!(sub.is_closed());
        assert_eq!(svc.outbound_count(), 0);
    }

    #[tokio::test]
    async fn cleanup_unified_is_noop_on_dual_bus() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        svc.cleanup_unified();
        assert!(t.released().is_empty());
    }

    #[tokio::test]
    async fn info_lists_routes_and_activities() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        svc.register_private("sub/get").expect("get");
        svc.activity_manager().create("job").await.expect("job");

        svc.dispatch(BusHandle::Private, RawMessage::request("/", "info", json!({})).with_token(1));
        let reply = &t.responses()[0];
        assert_eq!(reply.payload["returnValue"], json!(true));
        assert_eq!(reply.payload["busId"], json!("com.example.svc"));
        assert_eq!(reply.payload["activities"], json!(["dummy_0"]));
        assert_eq!(reply.payload["methods"], json!(["/info", "/quit", "/sub/get"]));
    }

    #[tokio::test]
    async fn refused_registration_leaves_no_route() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        t.refuse_method("admin", "not allowed");

        let err = svc.register_private("ctl/admin").expect_err("refused");
        assert_eq!(err.as_label(), "bus_registration_refused");
        assert!(svc.method("/ctl", "admin").is_none());
        assert!(!svc.routes().contains(&"/ctl/admin".to_string()));
    }

    #[tokio::test]
    async fn remote_close_is_seen_once_a_listener_attaches() {
        let (svc, t, _) = build("com.example.svc", ServiceConfig::default());
        let sub = svc
            .subscribe("luna://com.example/watch", json!({}))
            .await
            .expect("sub");

        t.close_call(sub.token());
        tokio::task::yield_now().await;
        assert!(!sub.is_closed());
        assert_eq!(svc.outbound_count(), 1);

        sub.on_response(|_| {});
        sub.closed().await;
        assert_eq!(svc.outbound_count(), 0);
    }
}
