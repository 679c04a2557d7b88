//! A client for the Feature Flipper service.
//!
//! # Overview
//!
//! The service stores, per tenant, a list of flippers: named boolean toggles and string lists.
//! [`FlipperClient`] fetches them over HTTP and answers lookups for a given tenant:
//!
//! - [`FlipperClient::load_flipper_data`] fetches every flipper of a tenant and returns them as
//!   [`FlipperData`].
//! - [`FlipperClient::is_enabled`] returns the value of a boolean flipper.
//! - [`FlipperClient::get_string_list`] returns the values of a string-list flipper.
//!
//! A client is created from a [`ClientConfig`]. The API key comes from the configuration or the
//! `FLIP_API_KEY` environment variable, and `FLIP_API_BASE_URL` overrides the default base URL.
//!
//! # Caching
//!
//! With [`ClientConfig::cache`] enabled, the client remembers the flippers of the last loaded
//! tenant and answers lookups for that tenant without a request. The cache holds a single tenant
//! at a time; caching is disabled by default.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum.
//!
//! Building a client fails if no API key is available. [`FlipperClient::load_flipper_data`]
//! returns [`Error::Api`] when the server cannot be reached, answers with a non-success status,
//! or returns a malformed body. The lookup methods never fail: they return `false` or an empty
//! list instead, the same as for a flipper that does not exist.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate with the `flipper`
//! target. Consider integrating a `log`-compatible logger implementation for better visibility
//! into client operations.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod fetcher;
mod flipper;
mod flipper_store;

pub use client::FlipperClient;
pub use config::{ClientConfig, API_KEY_ENV_VAR, BASE_URL_ENV_VAR};
pub use error::{Error, FetchError, Result};
pub use flipper::{BooleanFlipper, Flipper, FlipperData, StringListFlipper, TryParse};
