use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const USER_AGENT: &str = concat!("pokeguess/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Builds the shared client on first use. Later calls return the existing
/// client and ignore `timeout`.
pub fn init_http_client(timeout: Option<Duration>) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        // The blocking builder defaults to a 30s timeout; `None` clears it.
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build http client")
    })
}
