// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator interaction.
//!
//! [`TerminalPrompter`] reads key events through crossterm when stdin is a
//! terminal. Raw mode is held for one read at a time and the cancellation
//! token is checked between short polls, so an interrupt never leaves a read
//! (or a raw terminal) behind. Raw mode swallows Ctrl-C, so the line editor
//! turns it into an interrupt itself. Piped stdin is read line by line on a
//! dedicated thread. [`ScriptedPrompter`] replays canned answers for tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use lngate_common_core::str2bool;
use lngate_common_secret::SecretString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SecureError};

/// Result of waiting for one line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
	Line(String),
	/// Nothing arrived in time.
	Idle,
	/// Input reached end of file.
	Closed,
}

#[async_trait]
pub trait Prompter: Send + Sync {
	/// Progress text for the operator.
	fn say(&self, text: &str);

	/// Visible single-line answer. End of input reads as an empty answer.
	async fn ask(&self, question: &str) -> Result<String>;

	/// Answer read without echo.
	async fn ask_hidden(&self, question: &str) -> Result<SecretString>;

	/// Wait up to `wait` for a line typed without a prompt.
	async fn poll_line(&self, wait: Duration) -> Result<LineEvent>;

	/// Yes/no question; `default_yes` decides an empty answer.
	async fn confirm(&self, question: &str, default_yes: bool) -> Result<bool> {
		let answer = self.ask(question).await?;
		Ok(str2bool(&answer, default_yes))
	}
}

const POLL_SLICE: Duration = Duration::from_millis(200);

/// What one key press did to the line being typed.
#[derive(Debug, PartialEq, Eq)]
enum Edit {
	Insert(char),
	Erase,
	Submit(String),
	Interrupt,
	EndOfInput,
	Ignored,
}

/// Line buffer fed by key events.
#[derive(Default)]
struct LineEditor {
	buffer: String,
}

impl LineEditor {
	fn clear(&mut self) {
		self.buffer.clear();
	}

	fn apply(&mut self, key: KeyEvent) -> Edit {
		if key.kind != KeyEventKind::Press {
			return Edit::Ignored;
		}
		let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
		match key.code {
			KeyCode::Char('c') if ctrl => Edit::Interrupt,
			KeyCode::Char('d') if ctrl && self.buffer.is_empty() => Edit::EndOfInput,
			KeyCode::Char(_) if ctrl => Edit::Ignored,
			KeyCode::Char(c) => {
				self.buffer.push(c);
				Edit::Insert(c)
			}
			KeyCode::Backspace => match self.buffer.pop() {
				Some(_) => Edit::Erase,
				None => Edit::Ignored,
			},
			KeyCode::Enter => Edit::Submit(std::mem::take(&mut self.buffer)),
			_ => Edit::Ignored,
		}
	}
}

/// Raw mode until dropped.
struct RawMode;

impl RawMode {
	fn enable() -> io::Result<Self> {
		enable_raw_mode()?;
		Ok(RawMode)
	}
}

impl Drop for RawMode {
	fn drop(&mut self) {
		let _ = disable_raw_mode();
	}
}

/// Blocking read of one line from terminal key events.
fn read_keys(
	editor: &mut LineEditor,
	echo: bool,
	cancel: &CancellationToken,
	deadline: Option<Instant>,
) -> Result<LineEvent> {
	let _raw = RawMode::enable().map_err(SecureError::Terminal)?;
	let mut out = io::stdout();
	loop {
		if cancel.is_cancelled() {
			let _ = out.write_all(b"\r\n");
			return Err(SecureError::Interrupted);
		}
		let slice = match deadline {
			Some(deadline) => {
				let left = deadline.saturating_duration_since(Instant::now());
				if left.is_zero() {
					return Ok(LineEvent::Idle);
				}
				left.min(POLL_SLICE)
			}
			None => POLL_SLICE,
		};
		if !event::poll(slice).map_err(SecureError::Terminal)? {
			continue;
		}
		let Event::Key(key) = event::read().map_err(SecureError::Terminal)? else {
			continue;
		};
		match editor.apply(key) {
			Edit::Insert(c) if echo => {
				let mut buf = [0u8; 4];
				let _ = out.write_all(c.encode_utf8(&mut buf).as_bytes());
			}
			Edit::Erase if echo => {
				let _ = out.write_all(b"\x08 \x08");
			}
			Edit::Insert(_) | Edit::Erase | Edit::Ignored => continue,
			Edit::Submit(line) => {
				let _ = out.write_all(b"\r\n");
				let _ = out.flush();
				return Ok(LineEvent::Line(line));
			}
			Edit::Interrupt => {
				let _ = out.write_all(b"\r\n");
				cancel.cancel();
				return Err(SecureError::Interrupted);
			}
			Edit::EndOfInput => {
				let _ = out.write_all(b"\r\n");
				return Ok(LineEvent::Closed);
			}
		}
		let _ = out.flush();
	}
}

/// Forward lines of piped stdin until end of file.
fn spawn_line_reader() -> io::Result<mpsc::UnboundedReceiver<String>> {
	let (tx, rx) = mpsc::unbounded_channel();
	std::thread::Builder::new()
		.name("stdin-lines".to_string())
		.spawn(move || {
			for line in io::stdin().lock().lines() {
				match line {
					Ok(line) => {
						if tx.send(line.trim_end_matches('\r').to_string()).is_err() {
							break;
						}
					}
					Err(err) => {
						tracing::warn!(error = %err, "reading stdin failed");
						break;
					}
				}
			}
		})?;
	Ok(rx)
}

enum Input {
	Terminal(Arc<Mutex<LineEditor>>),
	Piped(tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>),
}

/// Prompts on stdout, answers from stdin.
pub struct TerminalPrompter {
	input: Input,
	cancel: CancellationToken,
}

impl TerminalPrompter {
	pub fn new(cancel: CancellationToken) -> Result<Self> {
		let input = if io::stdin().is_terminal() {
			Input::Terminal(Arc::default())
		} else {
			let lines = spawn_line_reader().map_err(SecureError::Terminal)?;
			Input::Piped(tokio::sync::Mutex::new(lines))
		};
		Ok(Self { input, cancel })
	}

	#[cfg(test)]
	fn piped(lines: mpsc::UnboundedReceiver<String>, cancel: CancellationToken) -> Self {
		Self {
			input: Input::Piped(tokio::sync::Mutex::new(lines)),
			cancel,
		}
	}

	/// `fresh` discards anything half-typed before the question appeared.
	async fn read(&self, echo: bool, fresh: bool, wait: Option<Duration>) -> Result<LineEvent> {
		match &self.input {
			Input::Terminal(editor) => {
				let editor = Arc::clone(editor);
				let cancel = self.cancel.clone();
				tokio::task::spawn_blocking(move || {
					let mut editor = editor
						.lock()
						.map_err(|_| SecureError::Terminal(io::Error::other("line editor poisoned")))?;
					if fresh {
						editor.clear();
					}
					read_keys(&mut editor, echo, &cancel, wait.map(|w| Instant::now() + w))
				})
				.await
				.map_err(|e| SecureError::Terminal(io::Error::other(e)))?
			}
			Input::Piped(lines) => {
				let mut lines = lines.lock().await;
				let next = async {
					match lines.recv().await {
						Some(line) => LineEvent::Line(line),
						None => LineEvent::Closed,
					}
				};
				let event = tokio::select! {
					biased;
					_ = self.cancel.cancelled() => return Err(SecureError::Interrupted),
					event = async {
						match wait {
							Some(wait) => tokio::time::timeout(wait, next).await.unwrap_or(LineEvent::Idle),
							None => next.await,
						}
					} => event,
				};
				if wait.is_none() {
					// Piped answers are not echoed; end the question line.
					self.show("\n");
				}
				Ok(event)
			}
		}
	}

	fn show(&self, text: &str) {
		let mut out = io::stdout().lock();
		let _ = out.write_all(text.as_bytes());
		let _ = out.flush();
	}
}

#[async_trait]
impl Prompter for TerminalPrompter {
	fn say(&self, text: &str) {
		self.show(&format!("{text}\n"));
	}

	async fn ask(&self, question: &str) -> Result<String> {
		self.show(question);
		match self.read(true, true, None).await? {
			LineEvent::Line(line) => Ok(line),
			LineEvent::Idle | LineEvent::Closed => Ok(String::new()),
		}
	}

	async fn ask_hidden(&self, question: &str) -> Result<SecretString> {
		self.show(question);
		match self.read(false, true, None).await? {
			LineEvent::Line(line) => Ok(SecretString::new(line)),
			LineEvent::Idle | LineEvent::Closed => Ok(SecretString::new(String::new())),
		}
	}

	/// On a terminal, a line finished while nobody awaits this call any more
	/// is dropped, as is a half-typed one when the next question is asked.
	/// Piped lines are never lost.
	async fn poll_line(&self, wait: Duration) -> Result<LineEvent> {
		self.read(true, false, Some(wait)).await
	}
}

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
	Text(String),
	/// Repeat the last line shown to the operator, e.g. a generated password.
	LastOutput,
	/// Behave as if the operator pressed Ctrl-C.
	Interrupt,
}

impl From<&str> for Reply {
	fn from(text: &str) -> Self {
		Reply::Text(text.to_string())
	}
}

/// Replays canned answers and records everything shown.
///
/// Running out of answers counts as an interrupt.
#[derive(Default)]
pub struct ScriptedPrompter {
	replies: Mutex<VecDeque<Reply>>,
	typed: Mutex<VecDeque<String>>,
	output: Mutex<Vec<String>>,
	questions: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
	pub fn new<I, R>(replies: I) -> Self
	where
		I: IntoIterator<Item = R>,
		R: Into<Reply>,
	{
		Self {
			replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
			..Default::default()
		}
	}

	/// Lines delivered through [`Prompter::poll_line`], one per call.
	pub fn with_typed<I: IntoIterator<Item = &'static str>>(self, lines: I) -> Self {
		if let Ok(mut typed) = self.typed.lock() {
			typed.extend(lines.into_iter().map(str::to_string));
		}
		self
	}

	pub fn output(&self) -> Vec<String> {
		self.output.lock().map(|o| o.clone()).unwrap_or_default()
	}

	pub fn questions(&self) -> Vec<String> {
		self.questions.lock().map(|q| q.clone()).unwrap_or_default()
	}

	fn next_reply(&self, question: &str) -> Result<String> {
		if let Ok(mut questions) = self.questions.lock() {
			questions.push(question.to_string());
		}
		let reply = self.replies.lock().ok().and_then(|mut r| r.pop_front());
		match reply {
			Some(Reply::Text(text)) => Ok(text),
			Some(Reply::LastOutput) => Ok(self.output().pop().unwrap_or_default()),
			Some(Reply::Interrupt) | None => Err(SecureError::Interrupted),
		}
	}
}

#[async_trait]
impl Prompter for ScriptedPrompter {
	fn say(&self, text: &str) {
		if let Ok(mut output) = self.output.lock() {
			output.extend(text.lines().map(str::to_string));
		}
	}

	async fn ask(&self, question: &str) -> Result<String> {
		self.next_reply(question)
	}

	async fn ask_hidden(&self, question: &str) -> Result<SecretString> {
		self.next_reply(question).map(SecretString::new)
	}

	async fn poll_line(&self, wait: Duration) -> Result<LineEvent> {
		let line = self.typed.lock().ok().and_then(|mut t| t.pop_front());
		match line {
			Some(line) => Ok(LineEvent::Line(line)),
			None => {
				tokio::time::sleep(wait).await;
				Ok(LineEvent::Idle)
			}
		}
	}
}
