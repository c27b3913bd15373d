//! Thread-safe in-memory [`TokenStore`] for tests, demos, and callers that persist elsewhere.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Token,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Keeps the token in-process and counts accesses so tests can assert on store traffic.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	slot: Arc<RwLock<Option<Token>>>,
	reads: Arc<AtomicUsize>,
	writes: Arc<AtomicUsize>,
}
impl MemoryStore {
	/// Creates a store that already holds `token`.
	pub fn with_token(token: Token) -> Self {
		let store = Self::default();

		*store.slot.write() = Some(token);

		store
	}

	/// Returns the stored token without counting a read.
	pub fn snapshot(&self) -> Option<Token> {
		self.slot.read().clone()
	}

	/// Number of [`TokenStore::read`] calls served so far.
	pub fn reads(&self) -> usize {
		self.reads.load(Ordering::Relaxed)
	}

	/// Number of [`TokenStore::write`] calls served so far.
	pub fn writes(&self) -> usize {
		self.writes.load(Ordering::Relaxed)
	}
}
impl TokenStore for MemoryStore {
	fn read(&self) -> StoreFuture<'_, Token> {
		Box::pin(async move {
			self.reads.fetch_add(1, Ordering::Relaxed);

			self.slot
				.read()
				.clone()
				.ok_or_else(|| StoreError::NotFound { message: "memory store is empty".into() })
		})
	}

	fn write(&self, token: Token) -> StoreFuture<'_, Token> {
		Box::pin(async move {
			self.writes.fetch_add(1, Ordering::Relaxed);

			*self.slot.write() = Some(token.clone());

			Ok(token)
		})
	}
}
