//! `triggerbox-github`: the GitHub REST implementation of
//! [`triggerbox_core::Platform`].
//!
//! # Architecture
//!
//! ```text
//! triggerbox_core::Platform
//!     │
//!     ▼
//! platform.rs   ← maps wire records into core types, errors into
//!     │            TriggerboxError::Platform
//!     ▼
//! GithubClient  ← reqwest, one repository, bearer token,
//!     │            Link-header pagination
//!     ▼
//! types.rs      ← serde shapes of the REST responses
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use triggerbox_github::{ClientConfig, GithubClient};
//!
//! let client = GithubClient::new(ClientConfig::new(token, "acme/web"))?;
//! let report = triggerbox_core::process_payload(&client, &settings, payload).await?;
//! ```

pub mod client;
pub mod error;
pub mod link;
mod platform;
pub mod types;

pub use client::{parse_repository, ClientConfig, GithubClient, DEFAULT_API_URL};
pub use error::GithubError;
