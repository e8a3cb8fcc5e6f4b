//! QA Agent - command-line and HTTP entry points
//!
//! ```text
//! qa-agent analyze --repo R --target src --top 10
//! qa-agent run --repo R --target src --goal edge_cases --budget 3
//! qa-agent serve --host 127.0.0.1 --port 8080
//! ```
//!
//! `run` exits 0 when the run is ok and 2 otherwise; bad input exits 1.

#![warn(unreachable_pub)]

pub mod cli;
pub mod logging;
pub mod server;
pub mod settings;

pub use cli::{command, dispatch, EXIT_NOT_OK};
pub use server::{routes, ServerState};
pub use settings::{resolve_request, RunSettings};
