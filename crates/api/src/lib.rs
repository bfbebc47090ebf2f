//! HTTP surface of a relay process.
//!
//! Endpoints:
//! - GET  /        : liveness text (non team-chat processes)
//! - GET  /health  : JSON health (non team-chat processes)
//! - POST /slack/interactions : signed Slack interaction webhook (team-chat processes)

pub mod middleware;
pub mod routes;
pub mod state;
