// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning workflow.
//!
//! ```text
//! Start -> NewStore | ExistingStore -> PasswordEstablished
//!       -> SecretsCollected -> [MacaroonsIssued] -> Done
//! ```
//!
//! `Aborted` is reachable from every state before `Done`. All store writes
//! of one run share a single transaction that commits only when the whole
//! run succeeds. A failed first-time setup removes the store file and any
//! artifacts it wrote.

use std::path::PathBuf;

use chrono::Utc;
use lngate_common_core::BackendCapability;
use lngate_common_secret::SecretString;
use lngate_server_config::{LngateConfig, PathsConfig};
use lngate_server_db::{migrate, open_store, SecretStore, Session, StoreHealth};
use lngate_server_macaroons::{default_lifetime, Baker};
use lngate_server_secrets::{
	check_password, create_mac_root_key, recover_secret, save_access_token, save_secret,
	PasswordAlphabet, RecoveredSecret, ScryptParams, PASSWORD_LEN, SALT_LEN,
};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::backend::collect_secret;
use crate::cleanup;
use crate::entropy::{EntropyCollector, EntropySettings};
use crate::error::{Result, SecureError};
use crate::prompt::Prompter;
use crate::seed::SeedPool;

/// Operator attempts before a password prompt gives up.
const MAX_ATTEMPTS: usize = 3;

const NEW_PASSWORD_NOTICE: &str = "lngate is about to ask for a new password! As humans are really bad at
generating entropy, we suggest using a password manager to generate and store
the password on your behalf.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Start,
	NewStore,
	ExistingStore,
	PasswordEstablished,
	SecretsCollected,
	MacaroonsIssued,
	Done,
	Aborted,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
	/// Create a fresh store instead of unlocking an existing one.
	pub new_store: bool,
	/// Remove any existing store and artifacts first; implies `new_store`.
	pub remove_existing: bool,
}

#[derive(Debug, Default)]
pub struct ProvisionReport {
	pub new_store: bool,
	pub secret_stored: bool,
	pub macaroons: Vec<PathBuf>,
}

/// State of one provisioning run.
pub struct Workflow<'a> {
	config: &'a LngateConfig,
	prompter: &'a dyn Prompter,
	cancel: CancellationToken,
	entropy: EntropySettings,
	phase: Phase,
	new_store: bool,
	artifacts_touched: bool,
	kdf_log_n: Option<u8>,
}

impl<'a> Workflow<'a> {
	pub fn new(config: &'a LngateConfig, prompter: &'a dyn Prompter, cancel: CancellationToken) -> Self {
		Self {
			config,
			prompter,
			cancel,
			entropy: EntropySettings::from_config(&config.security),
			phase: Phase::Start,
			new_store: false,
			artifacts_touched: false,
			kdf_log_n: None,
		}
	}

	pub fn with_entropy(mut self, entropy: EntropySettings) -> Self {
		self.entropy = entropy;
		self
	}

	/// Override the scrypt cost of newly created parameters. Test suites
	/// only; stored parameters always carry their own cost.
	pub fn with_kdf_log_n(mut self, log_n: u8) -> Self {
		self.kdf_log_n = Some(log_n);
		self
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	fn advance(&mut self, phase: Phase) {
		tracing::debug!(from = ?self.phase, to = ?phase, "provisioning phase");
		self.phase = phase;
	}

	fn scrypt_params(&self, salt: &[u8]) -> Result<ScryptParams> {
		let params = match self.kdf_log_n {
			Some(log_n) => ScryptParams::with_log_n(salt, log_n)?,
			None => ScryptParams::with_salt(salt)?,
		};
		Ok(params)
	}

	fn collector(&self) -> EntropyCollector<'_> {
		EntropyCollector::new(self.entropy.clone(), self.prompter, self.cancel.clone())
	}

	#[tracing::instrument(skip(self), fields(implementation = %self.config.backend.implementation))]
	pub async fn run(&mut self, options: ProvisionOptions) -> Result<ProvisionReport> {
		let result = self.run_store(options).await;
		match &result {
			Ok(_) => self.advance(Phase::Done),
			Err(err) => {
				tracing::warn!(phase = ?self.phase, error = %err, "provisioning aborted");
				self.advance(Phase::Aborted);
				self.discard_partial_results();
			}
		}
		result
	}

	fn discard_partial_results(&self) {
		let paths = &self.config.paths;
		if self.new_store {
			cleanup::remove_store_files(&self.config.db_path(), &paths.macaroons_dir);
		} else if self.artifacts_touched {
			// Their root-key parameters were rolled back.
			cleanup::remove_artifacts(&paths.macaroons_dir);
		}
	}

	async fn run_store(&mut self, options: ProvisionOptions) -> Result<ProvisionReport> {
		let db_path = self.config.db_path();
		if options.remove_existing {
			cleanup::remove_store_files(&db_path, &self.config.paths.macaroons_dir);
		}
		if (options.new_store || options.remove_existing) && db_path.exists() {
			return Err(SecureError::StoreExists(db_path));
		}
		ensure_tree(&self.config.paths)?;

		self.new_store = options.new_store || options.remove_existing;
		let pool = open_store(&db_path, self.new_store).await?;
		let result = self.run_session(&pool).await;
		pool.close().await;
		result
	}

	async fn run_session(&mut self, pool: &SqlitePool) -> Result<ProvisionReport> {
		if self.new_store {
			migrate(pool).await?;
		}
		let mut session = Session::begin(pool).await?;
		let cancel = self.cancel.clone();
		let outcome = tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(SecureError::Interrupted),
			result = self.configure(&mut session) => result,
		};
		session.finish(outcome).await
	}

	async fn configure(&mut self, store: &mut dyn SecretStore) -> Result<ProvisionReport> {
		let implementation = self.config.backend.implementation;
		let mut report = ProvisionReport {
			new_store: self.new_store,
			..Default::default()
		};

		let (password, mut seed, stored) = if self.new_store {
			self.advance(Phase::NewStore);
			let (password, mut seed) = self.establish_password().await?;
			let params = self.scrypt_params(seed.take(SALT_LEN)?)?;
			save_access_token(store, &password, &params).await?;
			(password, seed, None)
		} else {
			self.advance(Phase::ExistingStore);
			let (password, stored) = self.unlock(store).await?;
			let seed = SeedPool::new(self.collector().acquire(2 * SALT_LEN).await?);
			(password, seed, stored)
		};
		self.advance(Phase::PasswordEstablished);

		let collected = collect_secret(self.prompter, &self.config.backend, stored).await?;
		if let (Some(collected), Some(secret_type)) = (collected, implementation.secret_type()) {
			let params = self.scrypt_params(seed.take(SALT_LEN)?)?;
			save_secret(
				store,
				&password,
				&params,
				implementation,
				secret_type,
				&collected.secret,
				collected.active,
			)
			.await?;
			report.secret_stored = true;
		}
		self.advance(Phase::SecretsCollected);

		if !self.config.macaroons_enabled() {
			tracing::warn!("macaroons are disabled, not creating any");
			return Ok(report);
		}
		let create = self
			.prompter
			.confirm(
				"Do you want to create macaroons (warning: generated files should not be kept in\nthis host)? [y/N] ",
				false,
			)
			.await?;
		if create {
			let params = self.scrypt_params(seed.take(SALT_LEN)?)?;
			report.macaroons = self.issue_macaroons(store, &password, &params).await?;
			self.advance(Phase::MacaroonsIssued);
		}
		Ok(report)
	}

	/// New password, plus one entropy draw covering it and every salt.
	async fn establish_password(&mut self) -> Result<(SecretString, SeedPool)> {
		self.prompter.say(NEW_PASSWORD_NOTICE);
		let generate = self
			.prompter
			.confirm(
				"Do you want lngate to generate a safe random password for you? (new password\nwill be printed to stdout) [Y/n] ",
				true,
			)
			.await?;
		// Access token, backend secret, macaroon root key.
		let salts = 3 * SALT_LEN;

		let (password, seed) = if generate {
			let mut seed = SeedPool::new(self.collector().acquire(PASSWORD_LEN + salts).await?);
			let password = PasswordAlphabet::default().password(seed.take(PASSWORD_LEN)?);
			self.prompter.say("Here is your new password:");
			self.prompter.say(password.expose());
			(password, seed)
		} else {
			let seed = SeedPool::new(self.collector().acquire(salts).await?);
			(self.ask_new_password().await?, seed)
		};

		for attempt in 1..=MAX_ATTEMPTS {
			let check = self
				.prompter
				.ask_hidden("Save the password and then enter it for verification: ")
				.await?;
			if check.expose() == password.expose() {
				return Ok((password, seed));
			}
			if attempt == MAX_ATTEMPTS
				|| !self
					.prompter
					.confirm("Passwords do not match, try again? [Y/n] ", true)
					.await?
			{
				break;
			}
		}
		Err(SecureError::PasswordMismatch)
	}

	async fn ask_new_password(&self) -> Result<SecretString> {
		for _ in 0..MAX_ATTEMPTS {
			let password = self
				.prompter
				.ask_hidden("Insert a safe password for lngate: ")
				.await?;
			if !password.is_empty() {
				return Ok(password);
			}
			self.prompter.say("The password cannot be empty");
		}
		Err(SecureError::EmptyPassword)
	}

	/// Verify the store and the password, then recover the stored secret.
	async fn unlock(
		&mut self,
		store: &mut dyn SecretStore,
	) -> Result<(SecretString, Option<RecoveredSecret>)> {
		match store.health_check(self.config.macaroons_enabled()).await? {
			StoreHealth::Ok => {}
			StoreHealth::Stale(issue) | StoreHealth::Missing(issue) => {
				return Err(SecureError::StaleStore(issue));
			}
		}

		let password = self.prompter.ask_hidden("Insert lngate's password: ").await?;
		check_password(store, &password).await?;

		let implementation = self.config.backend.implementation;
		let stored = match implementation.secret_type() {
			Some(secret_type) => recover_secret(store, &password, implementation, secret_type).await?,
			None => None,
		};
		Ok((password, stored))
	}

	async fn issue_macaroons(
		&mut self,
		store: &mut dyn SecretStore,
		password: &SecretString,
		params: &ScryptParams,
	) -> Result<Vec<PathBuf>> {
		self.prompter.say("Creating macaroons...");
		self.artifacts_touched = true;
		let root_key = create_mac_root_key(store, password, params).await?;
		let expires_at = Utc::now() + default_lifetime();
		let written = Baker::new(root_key)
			.write_artifacts(&self.config.paths.macaroons_dir, expires_at)?;
		for path in &written {
			self.prompter.say(&format!("{} written", path.display()));
		}
		Ok(written)
	}
}

fn ensure_tree(paths: &PathsConfig) -> Result<()> {
	for dir in paths.tree() {
		std::fs::create_dir_all(dir).map_err(|source| SecureError::Io {
			path: dir.to_path_buf(),
			source,
		})?;
	}
	Ok(())
}

/// Apply pending migrations to an existing store.
#[tracing::instrument(skip_all)]
pub async fn migrate_store(config: &LngateConfig) -> Result<()> {
	let pool = open_store(&config.db_path(), false).await?;
	let result = migrate(&pool).await;
	pool.close().await;
	Ok(result?)
}
