//! mirror-relay: the session broker behind live code mirroring.
//!
//! An author's editor connects to `/create` and gets back a shareable
//! viewer URL; any number of viewers connect to `/join/:id` and receive
//! the author's document text and selection in real time, starting from
//! the latest known state. Sessions live in memory and end when the
//! author disconnects.

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod session;
pub mod ws;

use config::Config;
use session::SessionRegistry;

/// Shared application state handed to every handler.
pub struct AppState {
    pub registry: SessionRegistry,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: SessionRegistry::new(),
            config,
        }
    }
}
