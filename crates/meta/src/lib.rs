//! Advertising-platform data source.
//!
//! [`MetricsSource`] is the seam the watchdog reads through; [`MetaClient`]
//! implements it against the Meta Graph API.

pub mod aggregate;
pub mod client;
pub mod error;
pub mod models;
pub mod source;

pub use client::{ExchangedToken, MetaClient};
pub use error::SourceError;
pub use source::{DateRange, MetricsSource};
