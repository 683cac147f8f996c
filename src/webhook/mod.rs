//! Inbound webhook deliveries
//!
//! Verifies signatures, decodes push payloads and hands each accepted
//! delivery to the workflow runner on its own task.

mod payload;
mod server;
mod signature;

pub use payload::parse_push_event;
pub use server::{
    DELIVERY_HEADER, EVENT_HEADER, ServerSettings, WebhookState, create_router, serve,
};
pub use signature::{SIGNATURE_HEADER, WebhookVerifier};
