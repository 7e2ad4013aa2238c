//! # Example: Echo service with idle exit
//!
//! Registers a public `echo` method and a subscribing `ticks` method on the
//! in-process transport, plays a few inbound calls, then waits for the idle
//! timer to end the run.
//!
//! Run with: `cargo run --example echo_service --features logging`

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use lunavisor::{
    BusHandle, ExitReason, LogWriter, MemoryTransport, MethodDef, RawMessage, Service, ServiceConfig,
    Subscribe,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let transport = MemoryTransport::new();
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let service = Service::builder("com.example.echo", transport.clone())
        .config(ServiceConfig::default().with_idle_timeout(Duration::from_secs(2)))
        .subscribers(subs)
        // Keep the process alive so main can print the outcome.
        .on_exit(Arc::new(|reason: ExitReason| println!("[exit-hook] reason={}", reason.as_label())))
        .build()?;

    service.register(MethodDef::new("echo").on_request(|msg| {
        msg.respond(json!({"returnValue": true, "echo": msg.payload().clone()}));
    }))?;

    service.register(
        MethodDef::new("ticks")
            .on_request(|msg| {
                msg.respond(json!({"returnValue": true, "subscribed": msg.is_subscription()}));
            })
            .on_cancel(|msg| println!("[ticks] caller {} cancelled", msg.sender())),
    )?;

    service.dispatch(
        BusHandle::Public,
        RawMessage::request("/", "echo", json!({"hello": "bus"}))
            .with_sender("com.example.client")
            .with_token(1),
    );
    service.dispatch(
        BusHandle::Public,
        RawMessage::request("/", "ticks", json!({"subscribe": true}))
            .with_sender("com.example.client")
            .with_token(2)
            .with_unique_token("client-2"),
    );
    service.dispatch(
        BusHandle::Public,
        RawMessage::cancel("/", "ticks").with_unique_token("client-2"),
    );

    // A short job keeps the service alive while it runs.
    let am = Arc::clone(service.activity_manager());
    let job = am.create(am.job_id("warmup")).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    am.complete(&job.id, None).await?;

    let reason = service.run_until_exit().await;
    println!("[main] stopped: {}", reason.as_label());

    for frame in transport.responses() {
        println!("[sent] token={} payload={}", frame.token, frame.payload);
    }
    Ok(())
}
