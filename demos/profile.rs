//! Fetches the user profile several times concurrently.
//!
//! Run `authorize` first (or point the config's `tokenFilePath` at an existing token). When the
//! stored token has expired, only one refresh is issued and every request waits for it.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use futures::future;
// self
use fitbit_oauth::{FitbitClient, config::ClientConfig, http::ApiRequest, url::Url};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let path = env::args().nth(1).ok_or_else(|| eyre!("usage: profile <config.json>"))?;
	let client = FitbitClient::new(ClientConfig::from_path(path)?)?;
	let url = Url::parse("https://api.fitbit.com/1/user/-/profile.json")?;
	let responses =
		future::join_all((0..3).map(|_| client.request(ApiRequest::get(url.clone())))).await;

	for response in responses {
		let profile = response?.json::<serde_json::Value>()?;

		println!(
			"{} ({})",
			profile["user"]["displayName"].as_str().unwrap_or("<unnamed>"),
			profile["user"]["encodedId"].as_str().unwrap_or("?"),
		);
	}

	if let Some(limits) = client.rate_limits() {
		println!("Rate limit: {:?} of {:?} remaining.", limits.remaining, limits.limit);
	}

	println!("Refreshes performed: {}.", client.refresh_metrics().successes());

	Ok(())
}
