//! Model provider clients.
//!
//! Two backends answer prompts:
//!
//! - [`remote`] - a hosted chat-completion API reached over authenticated
//!   HTTP, with an optional server-sent-events streaming variant
//! - [`local`] - the on-device model, behind a trait so the host
//!   environment's actual binding (and test fakes) can plug in
//!
//! The crate root owns the shared HTTP client. It is built once, hardened
//! (HTTPS-only, no redirects, connect timeout, TCP keepalive), and reused
//! for every remote call.

pub mod local;
pub mod remote;

use std::sync::OnceLock;
use std::time::Duration;

pub use local::{LocalModel, LocalSession, SessionParams, probe_availability};
pub use remote::{CompletionOptions, RemoteClient, RemoteError, StreamEvent};

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 8;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

pub(crate) fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("Failed to build hardened HTTP client: {e}. Using minimal fallback.");
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("minimal HTTP client must build")
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

/// Read an error response body, capped so a hostile upstream can't balloon
/// memory on the failure path.
pub(crate) async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
