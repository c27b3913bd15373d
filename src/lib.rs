//! Fitbit OAuth 2.0 client with a single-flight token gate: one refresh at a time, FIFO
//! queueing of requests issued while the token is being established, and rate-limit aware
//! authenticated calls.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod expiry;
pub mod flows;
pub mod gate;
pub mod http;
pub mod obs;
pub mod rate_limit;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use flows::FitbitClient;
pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
