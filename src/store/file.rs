//! JSON file-backed [`TokenStore`] for bots and single-user deployments.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	auth::Token,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Persists the token as a JSON document, replacing the file atomically on each write.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	write_guard: Arc<AsyncMutex<()>>,
}
impl FileStore {
	/// Creates a store for `path`; nothing is touched until the first read or write.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), write_guard: Default::default() }
	}

	/// Location of the token file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_now(path: &Path) -> Result<Token, StoreError> {
		let bytes = fs::read(path).map_err(|e| match e.kind() {
			ErrorKind::NotFound => StoreError::NotFound { message: path.display().to_string() },
			_ => StoreError::Backend {
				message: format!("Failed to read {}: {e}", path.display()),
			},
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create token directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_now(path: &Path, token: &Token) -> Result<(), StoreError> {
		Self::ensure_parent_exists(path)?;

		let serialized = serde_json::to_vec(token).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize token: {e}"),
		})?;
		let mut tmp_path = path.to_path_buf();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn read(&self) -> StoreFuture<'_, Token> {
		Box::pin(async move { Self::read_now(&self.path) })
	}

	fn write(&self, token: Token) -> StoreFuture<'_, Token> {
		Box::pin(async move {
			// Writers share one temp path.
			let _guard = self.write_guard.lock().await;

			Self::persist_now(&self.path, &token)?;

			Ok(token)
		})
	}
}
