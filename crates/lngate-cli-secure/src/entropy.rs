// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entropy for generated passwords and salts.
//!
//! In strict mode bytes come from the blocking system source. A background
//! task first waits until the kernel's entropy estimate covers the request
//! with headroom, then performs the raw read. The common case finishes
//! within a short deadline; otherwise the operator is told how to help and
//! may type `unsafe` to switch to the non-blocking generator. Every exit
//! path stops the background task and closes the source.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use lngate_common_secret::SecretBytes;
use lngate_server_config::SecurityConfig;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SecureError};
use crate::idle::IdleNotifier;
use crate::prompt::{LineEvent, Prompter};

/// Typed by the operator to stop waiting for the blocking source.
pub const UNSAFE_TOKEN: &str = "unsafe";

const GUIDANCE: &str = "This call might take long depending on the available entropy.
If this happens you can:
 - type randomly on the keyboard or move the mouse
 - install entropy collecting tools like haveged
 - install a hardware TRNG
 - type 'unsafe' and press enter to use a non-blocking entropy source; this choice will NOT be remembered for later
";

#[derive(Debug, Clone)]
pub struct EntropySettings {
	/// Insist on the blocking source.
	pub strict: bool,
	pub source: PathBuf,
	/// Kernel estimate of available entropy bits.
	pub avail_path: PathBuf,
	/// How long the fast path may take before the operator is involved.
	pub read_deadline: Duration,
	pub pool_poll: Duration,
	pub input_poll: Duration,
}

impl EntropySettings {
	pub fn from_config(security: &SecurityConfig) -> Self {
		Self {
			strict: security.entropy_blocking,
			source: security.entropy_source.clone(),
			avail_path: security.entropy_avail_path.clone(),
			read_deadline: Duration::from_secs(1),
			pool_poll: Duration::from_secs(1),
			input_poll: Duration::from_millis(200),
		}
	}
}

/// Bits the pool must report before `len` bytes are read (20% headroom).
fn required_bits(len: usize) -> u64 {
	(len as u64 * 8 * 6).div_ceil(5)
}

fn os_random(len: usize) -> SecretBytes {
	let mut bytes = vec![0u8; len];
	OsRng.fill_bytes(&mut bytes);
	SecretBytes::new(bytes)
}

async fn read_pool(path: &Path) -> io::Result<u64> {
	let text = tokio::fs::read_to_string(path).await?;
	text.trim()
		.parse()
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

enum ReadOutcome {
	Bytes(Vec<u8>),
	Stopped,
	PoolUnreadable(io::Error),
	Failed(io::Error),
}

/// Background pool wait plus raw read. Stopped and aborted on drop.
struct BackgroundRead {
	handle: JoinHandle<ReadOutcome>,
	stop: CancellationToken,
}

impl BackgroundRead {
	fn spawn(
		mut file: File,
		avail_path: PathBuf,
		len: usize,
		pool_poll: Duration,
		stop: CancellationToken,
	) -> Self {
		let task_stop = stop.clone();
		let handle = tokio::spawn(async move {
			let wanted = required_bits(len);
			loop {
				match read_pool(&avail_path).await {
					Ok(avail) if avail >= wanted => break,
					Ok(avail) => tracing::debug!(avail, wanted, "waiting for entropy pool"),
					Err(err) => return ReadOutcome::PoolUnreadable(err),
				}
				tokio::select! {
					_ = task_stop.cancelled() => return ReadOutcome::Stopped,
					_ = tokio::time::sleep(pool_poll) => {}
				}
			}
			let read = tokio::task::spawn_blocking(move || {
				let mut bytes = vec![0u8; len];
				file.read_exact(&mut bytes).map(|_| bytes)
			})
			.await;
			match read {
				Ok(Ok(bytes)) => ReadOutcome::Bytes(bytes),
				Ok(Err(err)) => ReadOutcome::Failed(err),
				Err(join) => ReadOutcome::Failed(io::Error::other(join)),
			}
		});
		Self { handle, stop }
	}

	async fn wait(&mut self) -> ReadOutcome {
		match (&mut self.handle).await {
			Ok(outcome) => outcome,
			Err(join) => ReadOutcome::Failed(io::Error::other(join)),
		}
	}
}

impl Drop for BackgroundRead {
	fn drop(&mut self) {
		self.stop.cancel();
		self.handle.abort();
	}
}

pub struct EntropyCollector<'a> {
	settings: EntropySettings,
	prompter: &'a dyn Prompter,
	cancel: CancellationToken,
}

impl<'a> EntropyCollector<'a> {
	pub fn new(settings: EntropySettings, prompter: &'a dyn Prompter, cancel: CancellationToken) -> Self {
		Self {
			settings,
			prompter,
			cancel,
		}
	}

	/// Exactly `len` random bytes, or an error. Never returns short data.
	#[tracing::instrument(skip(self))]
	pub async fn acquire(&self, len: usize) -> Result<SecretBytes> {
		if !self.settings.strict {
			tracing::info!("strict entropy disabled, using the OS generator");
			return Ok(os_random(len));
		}

		self.prompter.say("Trying to collect entropy...");
		let file = match File::open(&self.settings.source) {
			Ok(file) => file,
			Err(err) => {
				tracing::warn!(source = %self.settings.source.display(), error = %err, "blocking entropy source unavailable");
				let question = format!(
					"The blocking '{}' entropy source is not available, do you want to use\nwhatever your OS provides? [Y/n] ",
					self.settings.source.display()
				);
				return self
					.fallback_with_consent(&question, "No random number generator available", len)
					.await;
			}
		};

		let mut reader = BackgroundRead::spawn(
			file,
			self.settings.avail_path.clone(),
			len,
			self.settings.pool_poll,
			self.cancel.child_token(),
		);
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => return Err(SecureError::Interrupted),
			joined = tokio::time::timeout(self.settings.read_deadline, reader.wait()) => {
				if let Ok(outcome) = joined {
					return self.finish(outcome, len).await;
				}
			}
		}

		self.wait_with_operator(reader, len).await
	}

	/// Input typed here only stirs the pool. When the read finishes first, a
	/// terminal line still in flight is dropped with its future and the next
	/// question starts from an empty line; piped lines stay queued.
	async fn wait_with_operator(&self, mut reader: BackgroundRead, len: usize) -> Result<SecretBytes> {
		self.prompter.say(GUIDANCE);
		let mut idle = IdleNotifier::new();
		let mut since = Instant::now();
		let mut input_open = true;

		loop {
			tokio::select! {
				biased;
				_ = self.cancel.cancelled() => return Err(SecureError::Interrupted),
				outcome = reader.wait() => {
					if matches!(outcome, ReadOutcome::Bytes(_)) {
						self.prompter.say("\nEnough entropy was collected, thanks for waiting");
					}
					return self.finish(outcome, len).await;
				}
				event = self.next_input(input_open) => match event? {
					LineEvent::Line(line) if line.trim() == UNSAFE_TOKEN => {
						tracing::warn!("operator chose the non-blocking entropy source");
						return Ok(os_random(len));
					}
					LineEvent::Line(_) => since = Instant::now(),
					LineEvent::Closed => input_open = false,
					LineEvent::Idle => {
						if let Some(message) = idle.poll(since.elapsed()) {
							self.prompter.say(message);
						}
					}
				},
			}
		}
	}

	async fn next_input(&self, open: bool) -> Result<LineEvent> {
		if open {
			return self.prompter.poll_line(self.settings.input_poll).await;
		}
		tokio::time::sleep(self.settings.input_poll).await;
		Ok(LineEvent::Idle)
	}

	async fn finish(&self, outcome: ReadOutcome, len: usize) -> Result<SecretBytes> {
		match outcome {
			ReadOutcome::Bytes(bytes) => Ok(SecretBytes::new(bytes)),
			ReadOutcome::Stopped => Err(SecureError::Interrupted),
			ReadOutcome::PoolUnreadable(err) => {
				tracing::warn!(error = %err, "cannot read available entropy");
				self.fallback_with_consent(
					"Cannot retrieve available entropy, do you want to use\nwhatever your OS provides? [Y/n] ",
					"No way to retrieve the amount of available entropy",
					len,
				)
				.await
			}
			ReadOutcome::Failed(err) => {
				tracing::warn!(error = %err, "blocking entropy read failed");
				self.fallback_with_consent(
					"Reading the blocking entropy source failed, do you want to use\nwhatever your OS provides? [Y/n] ",
					"No random number generator available",
					len,
				)
				.await
			}
		}
	}

	async fn fallback_with_consent(
		&self,
		question: &str,
		refusal: &str,
		len: usize,
	) -> Result<SecretBytes> {
		if self.prompter.confirm(question, true).await? {
			return Ok(os_random(len));
		}
		Err(SecureError::EntropyUnavailable(refusal.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::prompt::ScriptedPrompter;
	use std::fs;

	fn settings(dir: &Path, strict: bool) -> EntropySettings {
		EntropySettings {
			strict,
			source: dir.join("random"),
			avail_path: dir.join("entropy_avail"),
			read_deadline: Duration::from_millis(100),
			pool_poll: Duration::from_millis(10),
			input_poll: Duration::from_millis(10),
		}
	}

	fn seed_source(dir: &Path, bytes: &[u8], avail: &str) {
		fs::write(dir.join("random"), bytes).unwrap();
		fs::write(dir.join("entropy_avail"), avail).unwrap();
	}

	#[test]
	fn pool_headroom() {
		assert_eq!(required_bits(10), 96);
		assert_eq!(required_bits(1), 10);
	}

	#[tokio::test]
	async fn relaxed_mode_uses_os_generator_without_asking() {
		let dir = tempfile::tempdir().unwrap();
		let prompter = ScriptedPrompter::default();
		let collector = EntropyCollector::new(settings(dir.path(), false), &prompter, CancellationToken::new());
		assert_eq!(collector.acquire(48).await.unwrap().len(), 48);
		assert!(prompter.questions().is_empty());
	}

	#[tokio::test]
	async fn reads_blocking_source_when_pool_is_full() {
		let dir = tempfile::tempdir().unwrap();
		let bytes: Vec<u8> = (0..64).collect();
		seed_source(dir.path(), &bytes, "4096\n");
		let prompter = ScriptedPrompter::default();
		let collector = EntropyCollector::new(settings(dir.path(), true), &prompter, CancellationToken::new());

		let got = collector.acquire(32).await.unwrap();
		assert_eq!(got.as_slice(), &bytes[..32]);
		assert!(prompter.questions().is_empty());
	}

	#[tokio::test]
	async fn missing_source_needs_consent() {
		let dir = tempfile::tempdir().unwrap();
		let prompter = ScriptedPrompter::new(["y"]);
		let collector = EntropyCollector::new(settings(dir.path(), true), &prompter, CancellationToken::new());
		assert_eq!(collector.acquire(16).await.unwrap().len(), 16);

		let prompter = ScriptedPrompter::new(["n"]);
		let collector = EntropyCollector::new(settings(dir.path(), true), &prompter, CancellationToken::new());
		assert!(matches!(
			collector.acquire(16).await,
			Err(SecureError::EntropyUnavailable(_))
		));
	}

	#[tokio::test]
	async fn unreadable_pool_estimate_needs_consent() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("random"), [0u8; 16]).unwrap();
		let prompter = ScriptedPrompter::new([""]);
		let collector = EntropyCollector::new(settings(dir.path(), true), &prompter, CancellationToken::new());
		assert_eq!(collector.acquire(16).await.unwrap().len(), 16);
		assert_eq!(prompter.questions().len(), 1);
	}

	#[tokio::test]
	async fn operator_can_force_unsafe_source() {
		let dir = tempfile::tempdir().unwrap();
		seed_source(dir.path(), &[0u8; 16], "0");
		let prompter = ScriptedPrompter::default().with_typed(["keyboard mashing", "unsafe"]);
		let collector = EntropyCollector::new(settings(dir.path(), true), &prompter, CancellationToken::new());

		let got = collector.acquire(16).await.unwrap();
		assert_eq!(got.len(), 16);
		assert!(prompter
			.output()
			.iter()
			.any(|line| line.contains("type 'unsafe'")));
	}

	#[tokio::test]
	async fn interrupt_stops_waiting() {
		let dir = tempfile::tempdir().unwrap();
		seed_source(dir.path(), &[0u8; 16], "0");
		let prompter = ScriptedPrompter::default();
		let cancel = CancellationToken::new();
		let collector = EntropyCollector::new(settings(dir.path(), true), &prompter, cancel.clone());

		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(300)).await;
			trigger.cancel();
		});
		assert!(matches!(
			collector.acquire(16).await,
			Err(SecureError::Interrupted)
		));
	}
}
