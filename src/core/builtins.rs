//! Built-in `info` and `quit` methods.
//!
//! Both are installed on the private (or unified) handle when the service is
//! built, and on the public handle once the first public method is registered.
//! The method table is shared by all handles, so `quit` checks the handle of
//! each call: a public `quit` is refused while the service exposes nothing
//! publicly.

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::core::ExitReason;
use crate::endpoints::{Message, MethodDef};
use crate::events::{Event, EventKind};
use crate::transport::BusHandle;

pub(crate) const INFO: &str = "info";
pub(crate) const QUIT: &str = "quit";

pub(crate) fn definitions() -> [MethodDef; 2] {
    [
        MethodDef::new(INFO)
            .description(json!({"summary": "service metadata"}))
            .on_request(on_info),
        MethodDef::new(QUIT)
            .description(json!({"summary": "terminate the service"}))
            .on_request(on_quit),
    ]
}

fn on_info(msg: &Message) {
    let Some(service) = msg.service() else {
        return;
    };
    let activities: Vec<Value> = service
        .activity_manager()
        .activity_ids()
        .iter()
        .map(|id| id.to_json())
        .collect();

    msg.respond(json!({
        "returnValue": true,
        "busId": service.bus_id(),
        "version": env!("CARGO_PKG_VERSION"),
        "activities": activities,
        "methods": service.routes(),
    }));
}

fn on_quit(msg: &Message) {
    let Some(service) = msg.service() else {
        return;
    };

    if msg.handle() == BusHandle::Public && !service.has_public_methods() {
        warn!(sender = %msg.sender(), "public quit refused: no public methods");
        service.event_bus().publish(
            Event::new(EventKind::QuitRejected)
                .with_method(QUIT)
                .with_reason("no public methods"),
        );
        msg.respond(json!({
            "returnValue": false,
            "errorText": "quit is not available on the public bus",
        }));
        return;
    }

    msg.respond(json!({"returnValue": true}));
    info!(sender = %msg.sender(), handle = msg.handle().label(), "quit requested");
    service.exit().request(ExitReason::Quit);
}
