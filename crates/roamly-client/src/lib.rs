//! # roamly-client
//!
//! Client-side interaction core of the Roamly app: live user search, session
//! identity derived from the bearer credential, and the editable image
//! collection of an adventure. Views drive these through [`ClientState`].

pub mod adventure;
pub mod api;
pub mod auth;
pub mod config;
pub mod events;
pub mod media;
pub mod search;
pub mod session;
pub mod state;

mod error;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use error::{ApiError, ClientError, Result};
pub use state::ClientState;

/// Install the global `tracing` subscriber, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("roamly_client=debug,roamly_shared=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting {} client", roamly_shared::constants::APP_NAME);
    }
}
