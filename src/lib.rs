//! Typed async client for the Apple Business Manager and Apple School Manager device
//! APIs—ES256 client assertions, cached client-credentials tokens, and classified
//! resource calls in one crate.
//!
//! The [`client::Client`] signs a long-lived JWT client assertion with the enrollment's
//! elliptic-curve key, exchanges it for a short-lived access token at Apple's OAuth 2.0
//! token endpoint, and persists that token through a pluggable [`store::TokenStore`] so
//! repeated invocations reuse it until expiry. Resource operations (org devices, MDM
//! servers, device activities) are thin wrappers over the authenticated request
//! pipeline.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod obs;
pub mod store;

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tokio as _};
