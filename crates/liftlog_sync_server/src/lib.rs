//! # liftlog_sync_server
//!
//! The server half of the sync system:
//!
//! - [`SessionTokens`]: HMAC-signed session tokens with expiry
//! - [`ServerStore`]: user-partitioned record storage with reference rules
//! - [`RequestHandler`]: push (forced ownership, LWW, reference checks)
//!   and pull (user-scoped, cursor-based)
//! - [`SyncServer`]: the authenticated facade a transport layer exposes
//!
//! The crate has no network layer; it is embedded behind whatever RPC
//! surface an application uses.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod handler;
mod server;
mod store;

pub use auth::SessionTokens;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::SyncServer;
pub use store::{ForeignKeyRule, ServerStore};
