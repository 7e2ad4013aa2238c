//! # Example: Real activities against a scripted activity manager
//!
//! The in-process transport plays the activity-manager endpoint: it accepts
//! creates, then the demo pushes lifecycle events into the open subscription.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::json;

use lunavisor::{
    Activity, ActivitySpec, ActivityType, COMPLETE_URI, CREATE_URI, ExitReason, MemoryTransport,
    Service, ServiceConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let transport = MemoryTransport::new();

    let next_id = Arc::new(AtomicU64::new(100));
    transport.reply_with(CREATE_URI, move |_| {
        let id = next_id.fetch_add(1, Ordering::SeqCst);
        vec![json!({"returnValue": true, "activityId": id})]
    });
    transport.reply_with(COMPLETE_URI, |_| vec![json!({"returnValue": true})]);

    let service = Service::builder("com.webos.service.demo", transport.clone())
        .config(ServiceConfig::default().with_idle_timeout(Duration::from_secs(1)))
        .on_exit(Arc::new(|reason: ExitReason| println!("[exit-hook] reason={}", reason.as_label())))
        .build()?;
    let am = service.activity_manager();

    let sync = ActivitySpec::new(
        Activity::new("demo.sync", "periodic sync")
            .with_type(ActivityType {
                background: Some(true),
                persist: Some(true),
                ..Default::default()
            })
            .with_field("schedule", json!({"interval": "1h"})),
    )
    .start(true)
    .replace(true);

    let a = am.create(sync).await?;
    let b = am.create(ActivitySpec::new(Activity::new("demo.scan", "one-off scan"))).await?;
    println!("[create] {} and {} tracked={}", a.id, b.id, am.activity_count());

    // The remote side ends `b` on its own.
    let b_token = transport.calls_to(CREATE_URI)[1].token;
    transport.push_response(b_token, json!({"event": "complete", "activityId": b.id.to_json()}));
    tokio::task::yield_now().await;
    println!("[remote-end] tracked={}", am.activity_count());

    println!("[complete] first={}", am.complete(&a.id, None).await?);
    println!("[complete] again={}", am.complete(&a.id, None).await?);
    println!("[idle] timer armed={}", am.is_idle_timer_armed());

    let reason = service.run_until_exit().await;
    println!("[main] stopped: {}", reason.as_label());
    Ok(())
}
