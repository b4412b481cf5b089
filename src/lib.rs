//! # hellopi
//!
//! Classroom check-in for a fleet of Raspberry Pi devices:
//! - each Pi runs the reporter on boot and posts its hostname
//! - the coordinator records hostname/address pairs in SQLite
//! - students open the coordinator's page to find the address of their Pi
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  POST / (text=<hostname>)  ┌──────────────────────┐
//! │ Pi: reporter ├───────────────────────────►│     Coordinator      │
//! └──────────────┘                            │  axum + SQLite store │
//! ┌──────────────┐  GET /  (listing page)     │                      │
//! │   Browser    ├───────────────────────────►│                      │
//! └──────────────┘                            └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start the coordinator
//! ```bash
//! hellopi-coord serve --port 5001 --db ./messages.db
//! hellopi-coord serve --reset          # start with an empty table
//! ```
//!
//! ### Report from a Pi
//! Put the coordinator's `host[:port]` on the first line of `hello_ip.txt`
//! on the boot partition, then run on boot:
//! ```bash
//! hellopi-report --log-file /home/pi/hello.log
//! ```

pub mod common;
pub mod coordinator;
pub mod reporter;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use coordinator::{Coordinator, MessageStore};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
