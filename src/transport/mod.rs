//! HTTP transport used for both result pages and artifacts.
//!
//! The harvesting and download stages only depend on the [`Transport`]
//! capability ("given a URL, return bytes or fail"). [`HttpClient`] is the
//! production implementation; each worker owns one so connections are
//! reused across that worker's sequential requests.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::transport::{HttpClient, Transport, TransportSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&TransportSettings::default())?;
//! let body = client.get("https://arxiv.org/search/?query=quantum").await?;
//! println!("fetched {} bytes", body.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{HttpClient, TransportSettings};
pub use error::FetchError;

use async_trait::async_trait;

/// Capability to fetch the body behind a URL.
///
/// Non-success HTTP statuses are reported as [`FetchError::HttpStatus`], so a
/// returned body always comes from a 2xx response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a GET request and returns the full response body.
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
