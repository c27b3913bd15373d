//! Interactive authorization-code walkthrough.
//!
//! The example prints the consent-screen URL, waits for the user to paste the `code` returned on
//! the redirect, exchanges it, and persists the token to the configured `tokenFilePath` so the
//! `profile` example can reuse it.

// std
use std::{
	env,
	io::{self, Write},
};
// crates.io
use color_eyre::Result;
// self
use fitbit_oauth::{FitbitClient, config::ClientConfig, obs::LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = match env::args().nth(1) {
		Some(path) => ClientConfig::from_path(path)?,
		None => {
			let client_id = prompt("Enter your client ID")?;
			let client_secret = prompt("Enter your client secret")?;
			let redirect_uri = prompt("Enter the registered redirect URI")?;

			ClientConfig::new(client_id, client_secret, redirect_uri)
				.with_scope("activity profile weight")
				.with_token_file_path("token.json")
		},
	};
	let client = FitbitClient::new(config)?.with_logger(
		|level: LogLevel, message: &str, data: Option<&serde_json::Value>| {
			eprintln!("[{level}] {message} {}", data.map(ToString::to_string).unwrap_or_default());
		},
	);

	println!("Open this URL and approve access:\n{}", client.authorize_url()?);

	let code = prompt("Paste the `code` query parameter from the redirect")?;
	let token = client.exchange_code(&code).await?;

	println!("Token stored for user {}.", token.user_id.as_deref().unwrap_or("<unknown>"));

	Ok(())
}

fn prompt(label: &str) -> Result<String> {
	print!("{label}: ");
	io::stdout().flush()?;

	let mut line = String::new();

	io::stdin().read_line(&mut line)?;

	Ok(line.trim().to_owned())
}
