//! Plaintext, gzip-compressed channels to the hub.

use std::time::Duration;

use tonic::codec::CompressionEncoding;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::error::ClientError;
use crate::proto::{hub_client::HubClient, hub_management_client::HubManagementClient};

/// Build a lazily connecting channel to `addr`.
///
/// Nothing is dialed here; the first call establishes the connection and
/// surfaces any network failure. Must be called inside a Tokio runtime.
/// TLS is not supported, so `https://` addresses are rejected.
pub fn dial(addr: &str, connect_timeout: Option<Duration>) -> Result<Channel, ClientError> {
    let uri = normalize(addr)?;
    let mut endpoint = Endpoint::from_shared(uri)?;
    if let Some(timeout) = connect_timeout {
        endpoint = endpoint.connect_timeout(timeout);
    }

    debug!(addr, "hub channel created");
    Ok(endpoint.connect_lazy())
}

/// `Hub` stub with symmetric gzip compression.
pub fn hub_client(channel: Channel) -> HubClient<Channel> {
    HubClient::new(channel)
        .send_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Gzip)
}

/// `HubManagement` stub with symmetric gzip compression.
pub fn management_client(channel: Channel) -> HubManagementClient<Channel> {
    HubManagementClient::new(channel)
        .send_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Gzip)
}

fn normalize(addr: &str) -> Result<String, ClientError> {
    let addr = addr.trim();
    let invalid = |reason| ClientError::InvalidAddress {
        addr: addr.to_string(),
        reason,
    };

    if addr.is_empty() {
        return Err(invalid("address is empty"));
    }
    let Some((scheme, rest)) = addr.split_once("://") else {
        return Ok(format!("http://{addr}"));
    };
    match scheme.to_ascii_lowercase().as_str() {
        "http" => Ok(format!("http://{rest}")),
        "https" => Err(invalid("tls is not supported, use a plaintext address")),
        _ => Err(invalid("unsupported scheme")),
    }
}
