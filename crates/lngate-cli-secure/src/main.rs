// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `lngate-secure`: provision lngate's password, backend secret and macaroons.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lngate_cli_secure::{migrate_store, ProvisionOptions, SecureError, TerminalPrompter, Workflow};
use lngate_server_config::{
	load_config, BackendConfigLayer, ConfigLayer, LngateConfig, LoadOptions, PathsConfigLayer,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(
	name = "lngate-secure",
	about = "Secure lngate: set its password, store the node credential and bake macaroons",
	version
)]
struct Args {
	/// Data directory (defaults to ~/.lngate)
	#[arg(long, value_name = "DIR")]
	data_dir: Option<PathBuf>,

	/// Configuration file (defaults to <data-dir>/config.toml)
	#[arg(long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Create a new database
	#[arg(long, env = "NO_DB")]
	new: bool,

	/// Remove the existing database and macaroons, then create a new one
	#[arg(long, env = "RM_DB")]
	rm_db: bool,

	/// Backend implementation (clightning, eclair, electrum, lnd)
	#[arg(long, value_name = "NAME")]
	implementation: Option<String>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Apply pending migrations to an existing database
	Migrate,
}

impl Args {
	fn load_options(&self) -> LoadOptions {
		LoadOptions {
			config_file: self.config.clone(),
			overrides: ConfigLayer {
				paths: self.data_dir.clone().map(|data_dir| PathsConfigLayer {
					data_dir: Some(data_dir),
					..Default::default()
				}),
				backend: self.implementation.clone().map(|implementation| BackendConfigLayer {
					implementation: Some(implementation),
					..Default::default()
				}),
				..Default::default()
			},
		}
	}
}

#[tokio::main]
async fn main() {
	let args = Args::parse();

	let code = match load_config(args.load_options()) {
		Ok(config) => {
			init_tracing(&config);
			report(run(&args, &config).await)
		}
		Err(err) => report(Err(SecureError::from(err))),
	};

	// Blocking stdin readers may still be parked; do not wait for them.
	std::process::exit(code);
}

fn init_tracing(config: &LngateConfig) {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with_writer(std::io::stderr)
		.init();
}

async fn run(args: &Args, config: &LngateConfig) -> Result<(), SecureError> {
	if let Some(Command::Migrate) = args.command {
		return migrate_store(config).await;
	}

	let cancel = CancellationToken::new();
	spawn_signal_listener(cancel.clone());

	let prompter = TerminalPrompter::new(cancel.clone())?;
	let options = ProvisionOptions {
		new_store: args.new,
		remove_existing: args.rm_db,
	};
	let report = Workflow::new(config, &prompter, cancel).run(options).await?;
	tracing::info!(
		new_store = report.new_store,
		secret_stored = report.secret_stored,
		macaroons = report.macaroons.len(),
		"provisioning complete"
	);
	println!("All done!");
	Ok(())
}

fn report(result: Result<(), SecureError>) -> i32 {
	match result {
		Ok(()) => 0,
		Err(err) => {
			eprintln!("{err}");
			err.exit_code()
		}
	}
}

fn spawn_signal_listener(cancel: CancellationToken) {
	tokio::spawn(async move {
		wait_for_signal().await;
		tracing::debug!("interrupt received");
		cancel.cancel();
	});
}

#[cfg(unix)]
async fn wait_for_signal() {
	use tokio::signal::unix::{signal, SignalKind};

	match signal(SignalKind::terminate()) {
		Ok(mut term) => {
			tokio::select! {
				_ = tokio::signal::ctrl_c() => {}
				_ = term.recv() => {}
			}
		}
		Err(err) => {
			tracing::warn!(error = %err, "cannot listen for SIGTERM");
			let _ = tokio::signal::ctrl_c().await;
		}
	}
}

#[cfg(not(unix))]
async fn wait_for_signal() {
	let _ = tokio::signal::ctrl_c().await;
}
