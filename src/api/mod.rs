//! Backend API access for page units
//!
//! Page units never build backend URLs themselves: they go through
//! [`ApiClient`], whose base path is configured once at mount time.

mod client;

pub use client::{ApiClient, ApiClientConfig, ApiClientError};
