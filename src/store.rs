//! Token store contract and built-in store implementations.
//!
//! A store persists the single token record a client owns. The client reads it once when the
//! first request arrives and writes every token it obtains from the provider before handing
//! that token to callers.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Token};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable persistence for a client's token record.
///
/// Both operations must be safe to call repeatedly.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Loads the stored token.
	///
	/// Fails with [`StoreError::NotFound`] when nothing was stored yet and with
	/// [`StoreError::Serialization`] when the record cannot be parsed.
	fn read(&self) -> StoreFuture<'_, Token>;

	/// Persists `token`, replacing any previous record, and returns it.
	fn write(&self, token: Token) -> StoreFuture<'_, Token>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// No token has been stored.
	#[error("No stored token found: {message}.")]
	NotFound {
		/// Human-readable error payload.
		message: String,
	},
	/// The stored record could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
