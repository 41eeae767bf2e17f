//! `triggerbox-core`: approve or dispatch CI workflows from checkbox toggles
//! in a pull-request comment.
//!
//! ```text
//! comment edit ─▶ toggle ─▶ environment ─┬─▶ locator ─▶ approval
//!                                        └─▶ dispatch (no protection)
//! ```
//!
//! The hosting platform is reached only through [`platform::Platform`].

pub mod approval;
pub mod comment;
pub mod config;
pub mod environment;
pub mod error;
pub mod event;
pub mod handler;
pub mod locator;
pub mod platform;
pub mod toggle;
pub mod types;

#[cfg(test)]
mod fake;
#[cfg(test)]
mod tests;

pub use error::{Result, TriggerboxError};
pub use handler::{process_payload, validate_workflows, EventHandler, EventReport};
pub use platform::Platform;
