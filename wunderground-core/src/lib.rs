//! Client library for the Weather Underground web API.
//!
//! This crate defines:
//! - Request URI construction (features, sorted settings, query tail)
//! - A pluggable response cache with an in-memory TTL implementation
//! - The [`Client`] facade that ties both to HTTP and response parsing
//! - On-disk configuration used by front-ends
//!
//! It is used by `wunderground-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod uri;

pub use cache::{MemoryCache, ResponseCache};
pub use client::{Client, ClientBuilder, FeatureRequest, SIMPLE_FEATURES};
pub use config::Config;
pub use error::{Error, Result};
pub use format::ResponseFormat;
pub use model::ResponseBody;
pub use uri::{Settings, Tail, build_uri, history_feature};
