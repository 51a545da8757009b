//! Access API interaction module
//!
//! # Module Structure
//!
//! - [`client`] - Access client holding the platform URL and token
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use access_projects::api::AccessClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = AccessClient::new("https://example.jfrog.io", "token", Duration::from_secs(30))?;
//!     let project: serde_json::Value = client.get("/access/api/v1/projects/abc").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;

pub use client::{expand_path, AccessClient};
pub use http::format_api_error;
