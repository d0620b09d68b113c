//! Client-credentials token lifecycle manager: acquire, cache, reuse, and invalidate
//! service-to-service bearer tokens, retrying a rejected downstream call exactly once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod acquire;
#[cfg(feature = "server")] pub mod api;
pub mod auth;
#[cfg(feature = "server")] pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod obs;
pub mod registration;
pub mod secret_words;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(any(test, feature = "server"))] use color_eyre as _;
#[cfg(test)] use {httpmock as _, tower as _};
