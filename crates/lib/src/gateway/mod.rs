//! Relay HTTP gateway: chat endpoint, lead capture, and health.

pub mod protocol;
mod server;

pub use server::{build_router, build_state, run_gateway, GatewayState};
