//! # ActivityManager: activity table and idle exit.
//!
//! Tracks every activity the service keeps alive and exits the process once
//! the table has been empty for `idle_timeout`.
//!
//! ## Creation paths
//! ```text
//! create(CreateRequest)
//!   ├─► Job(id)                  ─► create_internal(id)
//!   │                                 ├─ Platform::Legacy  ─► create_dummy   ("dummy_N")
//!   │                                 └─ Platform::Unified ─► internal record ("internal_N")
//!   │                                                        + diagnostic timer (first time)
//!   ├─► Spec(spec), dummy mode   ─► create_internal(spec.activity.name)
//!   └─► Spec(spec)               ─► create_actual(spec)
//!                                     subscribe(activitymanager/create)
//!                                     first response: activityId ─► Real record
//!
//! every path ─► add() ─► stop idle timer
//! ```
//!
//! ## Idle timer
//! ```text
//! table empty ──add──► table non-empty ──remove (last)──► table empty
//!  timer armed          timer disarmed                     timer armed
//!
//! fire: exit_on_timeout ? Exit::request(IdleTimeout) : warn!, no rearm
//! ```
//!
//! ## Rules
//! - At most one idle timer is armed; arming is a no-op when one exists.
//! - Every change between empty and non-empty adjusts the timer under the same lock.
//! - A firing from a superseded timer (older generation) is ignored.
//! - Completing an unknown or already completed activity returns `Ok(false)` and sends nothing.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use super::record::{ActivityHandle, ActivityId, ActivityKind, ActivityRecord};
use super::spec::{ActivitySpec, CreateRequest};
use super::timer::OneShot;
use crate::core::{ActivityConfig, Exit, ExitHook, ExitReason, Platform, Service, process_exit_hook};
use crate::endpoints::{Message, Subscription};
use crate::error::{ActivityError, BusError, ServiceError};
use crate::events::{Event, EventBus, EventKind};

/// Activity-manager endpoint for `create`.
pub const CREATE_URI: &str = "luna://com.webos.service.activitymanager/create";
/// Activity-manager endpoint for `adopt`.
pub const ADOPT_URI: &str = "luna://com.webos.service.activitymanager/adopt";
/// Activity-manager endpoint for `complete`.
pub const COMPLETE_URI: &str = "luna://com.webos.service.activitymanager/complete";

struct State {
    activities: HashMap<ActivityId, ActivityRecord>,
    /// Source of generated job ids.
    counter: u64,
    /// Next `dummy_N` / `internal_N` suffix, depending on the platform.
    local_activity_id: u64,
    idle_timeout: Duration,
    exit_on_timeout: bool,
    idle_timer: Option<OneShot>,
    timer_generation: u64,
    diagnostic_armed: bool,
}

/// Owner of the activity table and the idle-exit timer.
pub struct ActivityManager {
    me: Weak<ActivityManager>,
    config: ActivityConfig,
    state: Mutex<State>,
    service: OnceLock<Weak<Service>>,
    events: EventBus,
    exit: Exit,
}

impl ActivityManager {
    /// Creates a manager whose idle timeout terminates the process.
    ///
    /// Must be called inside a tokio runtime: the idle timer is armed immediately.
    pub fn new(config: ActivityConfig) -> Arc<Self> {
        Self::with_exit_hook(config, process_exit_hook())
    }

    /// Creates a manager with a custom exit hook.
    pub fn with_exit_hook(config: ActivityConfig, hook: ExitHook) -> Arc<Self> {
        Self::from_parts(config, EventBus::new(1024), hook)
    }

    pub(crate) fn from_parts(config: ActivityConfig, events: EventBus, hook: ExitHook) -> Arc<Self> {
        let exit = Exit::new(hook, events.clone());
        let state = State {
            activities: HashMap::new(),
            counter: 0,
            local_activity_id: 0,
            idle_timeout: config.idle_timeout,
            exit_on_timeout: config.exit_on_timeout,
            idle_timer: None,
            timer_generation: 0,
            diagnostic_armed: false,
        };

        let am = Arc::new_cyclic(|me| Self {
            me: me.clone(),
            config,
            state: Mutex::new(state),
            service: OnceLock::new(),
            events,
            exit,
        });

        {
            let mut st = am.state.lock();
            am.start_timer(&mut st);
        }
        am
    }

    /// Binds the manager to the service it issues calls through. The first binding wins.
    pub(crate) fn attach(&self, service: &Arc<Service>) {
        if self.service.set(Arc::downgrade(service)).is_err() {
            warn!(
                bus_id = service.bus_id(),
                "activity manager already attached; keeping the first service"
            );
        }
    }

    fn service(&self) -> Result<Arc<Service>, ActivityError> {
        self.service
            .get()
            .and_then(Weak::upgrade)
            .ok_or(ActivityError::Detached)
    }

    // ---------------------------
    // Public operations
    // ---------------------------

    /// Creates an activity and adds it to the table.
    ///
    /// A bare job id yields a placeholder activity; a full [`ActivitySpec`] yields a
    /// real activity unless `use_dummy_activity` is set. Creation failures are not retried.
    pub async fn create(
        &self,
        request: impl Into<CreateRequest>,
    ) -> Result<ActivityHandle, ActivityError> {
        match request.into() {
            CreateRequest::Job(job) => Ok(self.create_internal(job)),
            CreateRequest::Spec(spec) if self.config.use_dummy_activity => {
                debug!(
                    activity = %spec.activity.name,
                    "activity creation disabled; using a placeholder"
                );
                Ok(self.create_internal(spec.activity.name))
            }
            CreateRequest::Spec(spec) => self.create_actual(spec).await,
        }
    }

    /// Removes an activity and, for real activities, marks it complete remotely.
    ///
    /// `options` (a JSON object) is merged into the `complete` call parameters.
    /// Returns `Ok(false)` if the activity was not in the table.
    pub async fn complete(
        &self,
        id: &ActivityId,
        options: Option<Value>,
    ) -> Result<bool, ActivityError> {
        let Some(record) = self.remove(id) else {
            debug!(activity = %id, "activity already completed");
            return Ok(false);
        };

        let ActivityRecord::Real {
            id: real_id,
            subscription,
            ..
        } = record
        else {
            return Ok(true);
        };

        let mut params = match options {
            Some(Value::Object(map)) => map,
            Some(other) => {
                warn!(activity = real_id, options = %other, "ignoring non-object complete options");
                Map::new()
            }
            None => Map::new(),
        };
        params.insert("activityId".into(), json!(real_id));

        let result = self
            .remote_call(COMPLETE_URI, "complete", Value::Object(params))
            .await;
        subscription.cancel();
        result.map(|_| true)
    }

    /// Takes over management of an activity created elsewhere.
    ///
    /// On success the activity enters the table like a created one.
    pub async fn adopt(&self, id: &ActivityId) -> Result<ActivityHandle, ActivityError> {
        let ActivityId::Real(real_id) = id else {
            return Err(ActivityError::Unknown { id: id.to_string() });
        };

        let service = self.service()?;
        let subscription = service
            .subscribe(
                ADOPT_URI,
                json!({"activityId": real_id, "wait": true, "subscribe": true}),
            )
            .await
            .map_err(from_service)?;

        let reply = match self.first_reply(&subscription, ADOPT_URI, "adopt").await {
            Ok(reply) => reply,
            Err(e) => {
                subscription.cancel();
                return Err(e);
            }
        };

        let name = reply
            .pointer("/activity/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let watched = Arc::clone(&subscription);
        self.insert(ActivityRecord::Real {
            id: *real_id,
            name: name.clone(),
            subscription,
        });
        self.watch_remote_close(*real_id, watched);

        Ok(ActivityHandle {
            id: id.clone(),
            name,
            kind: ActivityKind::Real,
            payload: reply,
        })
    }

    /// Mints a unique job identifier `label-N`.
    pub fn job_id(&self, label: &str) -> String {
        let mut st = self.state.lock();
        st.counter += 1;
        format!("{label}-{}", st.counter)
    }

    // ---------------------------
    // Inspection and knobs
    // ---------------------------

    pub fn activity_count(&self) -> usize {
        self.state.lock().activities.len()
    }

    pub fn contains(&self, id: &ActivityId) -> bool {
        self.state.lock().activities.contains_key(id)
    }

    /// Sorted ids of all tracked activities.
    pub fn activity_ids(&self) -> Vec<ActivityId> {
        let mut ids: Vec<ActivityId> = self.state.lock().activities.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Name of a tracked activity.
    pub fn activity_name(&self, id: &ActivityId) -> Option<String> {
        self.state
            .lock()
            .activities
            .get(id)
            .map(|r| r.name().to_string())
    }

    /// True while an idle countdown is pending.
    pub fn is_idle_timer_armed(&self) -> bool {
        self.state.lock().idle_timer.is_some()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.state.lock().idle_timeout
    }

    /// Changes the idle timeout; applies from the next time the timer is armed.
    pub fn set_idle_timeout(&self, idle: Duration) {
        self.state.lock().idle_timeout = idle;
    }

    pub fn exit_on_timeout(&self) -> bool {
        self.state.lock().exit_on_timeout
    }

    /// When false, an idle timeout only logs.
    pub fn set_exit_on_timeout(&self, exit: bool) {
        self.state.lock().exit_on_timeout = exit;
    }

    pub fn use_dummy_activity(&self) -> bool {
        self.config.use_dummy_activity
    }

    pub fn platform(&self) -> Platform {
        self.config.platform
    }

    /// Runtime event bus shared with the owning service.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Exit latch shared with the owning service.
    pub fn exit(&self) -> &Exit {
        &self.exit
    }

    // ---------------------------
    // Creation paths
    // ---------------------------

    fn create_internal(&self, job: String) -> ActivityHandle {
        if !self.config.platform.has_internal_activities() {
            return self.create_dummy(job);
        }

        let record = {
            let mut st = self.state.lock();
            let id = self.mint_local_id(&mut st);
            if !st.diagnostic_armed {
                st.diagnostic_armed = true;
                self.arm_diagnostic_timer();
            }
            ActivityRecord::Internal {
                id,
                name: job,
                is_internal: true,
            }
        };
        self.insert_placeholder(record)
    }

    fn create_dummy(&self, job: String) -> ActivityHandle {
        let record = {
            let mut st = self.state.lock();
            let id = self.mint_local_id(&mut st);
            ActivityRecord::Dummy { id, name: job }
        };
        self.insert_placeholder(record)
    }

    fn mint_local_id(&self, st: &mut State) -> String {
        let id = format!("{}{}", self.config.platform.local_id_prefix(), st.local_activity_id);
        st.local_activity_id += 1;
        id
    }

    fn insert_placeholder(&self, record: ActivityRecord) -> ActivityHandle {
        let handle = ActivityHandle {
            id: record.id(),
            name: record.name().to_string(),
            kind: record.kind(),
            payload: record.placeholder_payload(),
        };
        self.insert(record);
        handle
    }

    async fn create_actual(&self, spec: ActivitySpec) -> Result<ActivityHandle, ActivityError> {
        let service = self.service()?;
        let mut payload = spec.to_payload().map_err(|e| ActivityError::Encode {
            reason: e.to_string(),
        })?;

        let subscription = service
            .subscribe(CREATE_URI, payload.clone())
            .await
            .map_err(from_service)?;

        let reply = match self.first_reply(&subscription, CREATE_URI, "create").await {
            Ok(reply) => reply,
            Err(e) => {
                subscription.cancel();
                return Err(e);
            }
        };
        let Some(ActivityId::Real(id)) = ActivityId::from_payload(&reply) else {
            subscription.cancel();
            return Err(ActivityError::MissingActivityId);
        };

        let name = spec.activity.name;
        let watched = Arc::clone(&subscription);
        self.insert(ActivityRecord::Real {
            id,
            name: name.clone(),
            subscription,
        });
        self.watch_remote_close(id, watched);

        if let Value::Object(map) = &mut payload {
            map.insert("activityId".into(), json!(id));
        }
        Ok(ActivityHandle {
            id: ActivityId::Real(id),
            name,
            kind: ActivityKind::Real,
            payload,
        })
    }

    /// Waits for the first response of an activity subscription and checks it.
    ///
    /// Later responses on the same subscription are treated as lifecycle events.
    async fn first_reply(
        &self,
        subscription: &Arc<Subscription>,
        uri: &str,
        operation: &'static str,
    ) -> Result<Value, ActivityError> {
        let (tx, rx) = oneshot::channel::<Value>();
        let first = Mutex::new(Some(tx));
        let me = self.me.clone();

        subscription.on_response(move |msg: &Message| {
            if let Some(tx) = first.lock().take() {
                let _ = tx.send(msg.payload().clone());
                return;
            }
            if let Some(am) = me.upgrade() {
                am.on_activity_event(msg.payload());
            }
        });

        let reply = rx.await.map_err(|_| BusError::NoResponse {
            uri: uri.to_string(),
        })?;
        check_reply(operation, &reply)?;
        Ok(reply)
    }

    async fn remote_call(
        &self,
        uri: &str,
        operation: &'static str,
        params: Value,
    ) -> Result<Value, ActivityError> {
        let service = self.service()?;
        let reply = service.call(uri, params).await.map_err(from_service)?;
        let payload = reply.payload().clone();
        check_reply(operation, &payload)?;
        Ok(payload)
    }

    /// Handles a later response on a real activity's subscription.
    fn on_activity_event(&self, payload: &Value) {
        let Some(event) = payload.get("event").and_then(Value::as_str) else {
            return;
        };
        if !matches!(event, "complete" | "cancel" | "stop") {
            trace!(event, "activity event");
            return;
        }
        let Some(id) = ActivityId::from_payload(payload) else {
            return;
        };
        if let Some(record) = self.remove(&id) {
            debug!(activity = %id, event, "activity ended remotely");
            if let ActivityRecord::Real { subscription, .. } = record {
                subscription.cancel();
            }
        }
    }

    /// Drops the real activity `id` once its subscription closes while it is still tracked.
    ///
    /// Local completion and remote lifecycle events remove the record first, so the
    /// watcher only acts when the remote end closed the stream.
    fn watch_remote_close(&self, id: u64, subscription: Arc<Subscription>) {
        let me = self.me.clone();
        tokio::spawn(async move {
            subscription.closed().await;
            let Some(am) = me.upgrade() else { return };
            let token = subscription.token();
            let removed = am.remove_if(&ActivityId::Real(id), |record| {
                matches!(record, ActivityRecord::Real { subscription: sub, .. } if sub.token() == token)
            });
            if removed.is_some() {
                debug!(activity = id, token, "activity stream closed remotely");
            }
        });
    }

    // ---------------------------
    // Table and timers
    // ---------------------------

    /// Adds a record and disarms the idle timer.
    fn insert(&self, record: ActivityRecord) {
        let displaced = {
            let mut st = self.state.lock();
            let id = record.id();
            self.events.publish(
                Event::new(EventKind::ActivityAdded)
                    .with_activity(id.to_string())
                    .with_reason(record.kind().as_label()),
            );
            debug!(activity = %id, kind = record.kind().as_label(), "activity added");
            let displaced = st.activities.insert(id, record);
            self.stop_timer(&mut st);
            displaced
        };

        if let Some(ActivityRecord::Real { subscription, .. }) = displaced {
            subscription.cancel();
        }
    }

    /// Removes a record; arms the idle timer when the table becomes empty.
    fn remove(&self, id: &ActivityId) -> Option<ActivityRecord> {
        self.remove_if(id, |_| true)
    }

    fn remove_if<P>(&self, id: &ActivityId, pred: P) -> Option<ActivityRecord>
    where
        P: FnOnce(&ActivityRecord) -> bool,
    {
        let mut st = self.state.lock();
        if !st.activities.get(id).is_some_and(pred) {
            return None;
        }
        let record = st.activities.remove(id)?;
        self.events
            .publish(Event::new(EventKind::ActivityRemoved).with_activity(id.to_string()));
        debug!(activity = %id, remaining = st.activities.len(), "activity removed");
        if st.activities.is_empty() {
            self.start_timer(&mut st);
        }
        Some(record)
    }

    fn start_timer(&self, st: &mut State) {
        if st.idle_timer.is_some() {
            return;
        }
        st.timer_generation += 1;
        let delay = st.idle_timeout;
        let me = self.me.clone();

        st.idle_timer = Some(OneShot::arm(st.timer_generation, delay, move |generation| {
            if let Some(am) = me.upgrade() {
                am.on_idle_timeout(generation);
            }
        }));
        self.events
            .publish(Event::new(EventKind::IdleTimerStarted).with_timeout(delay));
        trace!(timeout = ?delay, "idle timer armed");
    }

    fn stop_timer(&self, st: &mut State) {
        if let Some(timer) = st.idle_timer.take() {
            timer.disarm();
            self.events.publish(Event::new(EventKind::IdleTimerStopped));
            trace!("idle timer disarmed");
        }
    }

    fn on_idle_timeout(&self, generation: u64) {
        let (delay, exit) = {
            let mut st = self.state.lock();
            match &st.idle_timer {
                Some(timer) if timer.generation() == generation => {}
                _ => return,
            }
            if !st.activities.is_empty() {
                return;
            }
            st.idle_timer = None;
            (st.idle_timeout, st.exit_on_timeout)
        };

        self.events.publish(
            Event::new(EventKind::IdleTimeout)
                .with_timeout(delay)
                .with_reason(if exit { "exit" } else { "log_only" }),
        );

        if exit {
            info!(timeout = ?delay, "no activity; exiting");
            self.exit.request(ExitReason::IdleTimeout);
        } else {
            warn!(timeout = ?delay, "idle timeout reached but exit on timeout is disabled");
        }
    }

    fn arm_diagnostic_timer(&self) {
        let me = self.me.clone();
        let delay = self.config.diagnostic_delay;
        // Dropping the handle leaves the timer running.
        let _ = OneShot::arm(0, delay, move |_| {
            if let Some(am) = me.upgrade() {
                info!(
                    activities = am.activity_count(),
                    idle_timer_armed = am.is_idle_timer_armed(),
                    "internal activity diagnostic timer elapsed"
                );
            }
        });
    }
}

/// Fails with [`ActivityError::Rejected`] when the reply carries `returnValue: false`.
fn check_reply(operation: &'static str, reply: &Value) -> Result<(), ActivityError> {
    if reply.get("returnValue").and_then(Value::as_bool) == Some(false) {
        return Err(ActivityError::Rejected {
            operation,
            error_code: reply.get("errorCode").and_then(Value::as_i64),
            error_text: reply
                .get("errorText")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }
    Ok(())
}

/// Outbound calls only fail at the transport; anything else means the service is unusable.
fn from_service(err: ServiceError) -> ActivityError {
    match err {
        ServiceError::Bus(e) => ActivityError::Bus(e),
        _ => ActivityError::Detached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time;

    fn manager(config: ActivityConfig) -> (Arc<ActivityManager>, Arc<AtomicUsize>) {
        let exits = Arc::new(AtomicUsize::new(0));
        let n = exits.clone();
        let am = ActivityManager::with_exit_hook(
            config,
            Arc::new(move |_: ExitReason| {
                n.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (am, exits)
    }

    #[tokio::test(start_paused = true)]
    async fn timer_is_armed_at_construction() {
        let (am, exits) = manager(ActivityConfig::default());
        assert!(am.is_idle_timer_armed());

        time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(exits.load(Ordering::SeqCst), 1);
        assert!(!am.is_idle_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn legacy_jobs_become_dummy_activities() {
        let (am, _) = manager(ActivityConfig::default());

        let a = am.create("job").await.expect("create");
        let b = am.create("job").await.expect("create");
        assert_eq!(a.id, ActivityId::Local("dummy_0".into()));
        assert_eq!(b.id, ActivityId::Local("dummy_1".into()));
        assert_eq!(a.kind, ActivityKind::Dummy);
        assert_eq!(a.payload["isDummyActivity"], json!(true));
        assert_eq!(am.activity_count(), 2);
        assert!(!am.is_idle_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn unified_jobs_become_internal_activities() {
        let cfg = ActivityConfig {
            platform: Platform::Unified,
            ..ActivityConfig::default()
        };
        let (am, _) = manager(cfg);

        let a = am.create("job").await.expect("create");
        assert_eq!(a.id, ActivityId::Local("internal_0".into()));
        assert_eq!(a.kind, ActivityKind::Internal);
        assert_eq!(a.payload["isInternalActivity"], json!(true));
        assert_eq!(am.activity_name(&a.id).as_deref(), Some("job"));
    }

    #[tokio::test(start_paused = true)]
    async fn diagnostic_timer_never_exits() {
        let cfg = ActivityConfig {
            platform: Platform::Unified,
            diagnostic_delay: Duration::from_secs(1),
            ..ActivityConfig::default()
        };
        let (am, exits) = manager(cfg);
        let a = am.create("job").await.expect("create");

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(exits.load(Ordering::SeqCst), 0);
        assert!(am.contains(&a.id));
    }

    #[tokio::test(start_paused = true)]
    async fn dummy_mode_downgrades_full_specs() {
        use crate::activity::spec::Activity;

        let cfg = ActivityConfig {
            use_dummy_activity: true,
            ..ActivityConfig::default()
        };
        let (am, _) = manager(cfg);

        // No service attached: a real creation would fail with Detached.
        let h = am
            .create(ActivitySpec::new(Activity::new("sync", "")))
            .await
            .expect("create");
        assert_eq!(h.kind, ActivityKind::Dummy);
        assert_eq!(h.name, "sync");
    }

    #[tokio::test(start_paused = true)]
    async fn real_creation_without_service_is_detached() {
        use crate::activity::spec::Activity;

        let (am, _) = manager(ActivityConfig::default());
        let err = am
            .create(ActivitySpec::new(Activity::new("sync", "")))
            .await
            .expect_err("detached");
        assert_eq!(err, ActivityError::Detached);
        assert!(am.is_idle_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn complete_rearms_timer_and_is_idempotent() {
        let (am, exits) = manager(ActivityConfig::default());
        let h = am.create("job").await.expect("create");
        assert!(!am.is_idle_timer_armed());

        assert_eq!(am.complete(&h.id, None).await, Ok(true));
        assert!(am.is_idle_timer_armed());
        assert_eq!(am.complete(&h.id, None).await, Ok(false));
        assert!(am.is_idle_timer_armed());

        time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(exits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_stays_disarmed_while_any_activity_remains() {
        let (am, exits) = manager(ActivityConfig::default());
        let a = am.create("a").await.expect("a");
        let b = am.create("b").await.expect("b");

        am.complete(&a.id, None).await.expect("complete a");
        assert!(!am.is_idle_timer_armed());

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(exits.load(Ordering::SeqCst), 0);

        am.complete(&b.id, None).await.expect("complete b");
        assert!(am.is_idle_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn log_only_timeout_does_not_rearm() {
        let cfg = ActivityConfig {
            exit_on_timeout: false,
            ..ActivityConfig::default()
        };
        let (am, exits) = manager(cfg);
        let mut rx = am.events().subscribe();

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(exits.load(Ordering::SeqCst), 0);
        assert!(!am.is_idle_timer_armed());

        let mut timeouts = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::IdleTimeout {
                timeouts += 1;
                assert_eq!(ev.reason.as_deref(), Some("log_only"));
            }
        }
        assert_eq!(timeouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_change_applies_on_next_arm() {
        let (am, exits) = manager(ActivityConfig::default());
        am.set_idle_timeout(Duration::from_secs(2));
        assert_eq!(am.idle_timeout(), Duration::from_secs(2));

        let h = am.create("job").await.expect("create");
        am.complete(&h.id, None).await.expect("complete");

        time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(exits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn job_ids_are_unique() {
        let (am, _) = manager(ActivityConfig::default());
        assert_eq!(am.job_id("scan"), "scan-1");
        assert_eq!(am.job_id("scan"), "scan-2");
        assert_eq!(am.job_id("other"), "other-3");
    }

    #[tokio::test(start_paused = true)]
    async fn adopting_a_local_id_is_unknown() {
        let (am, _) = manager(ActivityConfig::default());
        let err = am
            .adopt(&ActivityId::Local("dummy_0".into()))
            .await
            .expect_err("unknown");
        assert_eq!(err.as_label(), "activity_unknown");
    }

    #[test]
    fn check_reply_reads_error_fields() {
        let err = check_reply(
            "create",
            &json!({"returnValue": false, "errorCode": 17, "errorText": "exists"}),
        )
        .expect_err("rejected");
        assert_eq!(
            err,
            ActivityError::Rejected {
                operation: "create",
                error_code: Some(17),
                error_text: "exists".into(),
            }
        );
        assert!(check_reply("create", &json!({"activityId": 1})).is_ok());
    }
}
