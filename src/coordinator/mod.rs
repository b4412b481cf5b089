//! Coordinator implementation
//!
//! The coordinator is responsible for:
//! - Recording hostname/address submissions in SQLite
//! - Rendering the hostname → address listing
//! - Startup maintenance (reset, test-entry cleanup)

pub mod handlers;
pub mod http;
pub mod page;
pub mod server;
pub mod store;

pub use server::{Coordinator, StartupMode};
pub use store::{DeleteFilter, Message, MessageStore};
