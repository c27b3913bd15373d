//! Single-flight token gate.
//!
//! Every authenticated call passes through a [`RequestGate`] before it touches the network. The
//! gate hands out the current token while it is fresh. When it is missing or expired, exactly one
//! caller (the leader) runs the loader that establishes a new token, and everybody arriving in the
//! meantime waits in a FIFO queue. When the loader lands, the queue is drained in arrival order
//! with the same outcome: either the new token or the error that ended the attempt.
//!
//! Failures reject every queued caller and release the gate. The previously held token (if any)
//! stays in place, so the next caller starts a new attempt instead of waiting forever.

// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, auth::Token, expiry};

type Outcome = Result<Arc<Token>>;
type Waiter = oneshot::Sender<Outcome>;

/// Lifecycle phase of a [`RequestGate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatePhase {
	/// No token has been established yet.
	Uninitialized,
	/// The first token is being loaded.
	Initializing,
	/// A held token is being replaced.
	Refreshing,
	/// A token is held and nothing is in flight.
	Ready,
}
impl GatePhase {
	/// Returns `true` while a loader is running.
	pub const fn is_busy(self) -> bool {
		matches!(self, GatePhase::Initializing | GatePhase::Refreshing)
	}
}

/// How [`RequestGate::acquire`] treats a held token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireMode {
	/// Reuse the held token while it has not expired.
	Fresh,
	/// Always run the caller's loader, after any in-flight attempt has landed.
	Force,
}

#[derive(Debug)]
struct GateState {
	phase: GatePhase,
	token: Option<Arc<Token>>,
	queue: VecDeque<Waiter>,
}
impl Default for GateState {
	fn default() -> Self {
		Self { phase: GatePhase::Uninitialized, token: None, queue: VecDeque::new() }
	}
}

enum Entry {
	Ready(Arc<Token>),
	Queued(oneshot::Receiver<Outcome>),
	Leader { previous: Option<Arc<Token>>, rx: oneshot::Receiver<Outcome> },
}

/// Serializes token establishment and queues requests behind it.
#[derive(Debug, Default)]
pub struct RequestGate {
	state: Mutex<GateState>,
}
impl RequestGate {
	/// Creates an empty gate in [`GatePhase::Uninitialized`].
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds the gate with an already established token.
	pub fn with_token(token: Token) -> Self {
		let gate = Self::default();

		{
			let mut state = gate.state.lock();

			state.token = Some(Arc::new(token));
			state.phase = GatePhase::Ready;
		}

		gate
	}

	/// Current phase.
	pub fn phase(&self) -> GatePhase {
		self.state.lock().phase
	}

	/// Number of callers waiting on the in-flight loader, the leader included.
	pub fn queued(&self) -> usize {
		self.state.lock().queue.len()
	}

	/// Token currently held, expired or not.
	pub fn token(&self) -> Option<Arc<Token>> {
		self.state.lock().token.clone()
	}

	/// Records that an in-flight first load found an expired token and is now refreshing it.
	pub fn mark_refreshing(&self) {
		let mut state = self.state.lock();

		if state.phase == GatePhase::Initializing {
			state.phase = GatePhase::Refreshing;
		}
	}

	/// Returns a usable token, running `loader` if this caller has to establish one.
	///
	/// The loader receives the token held when it started (`None` on first load) and must return
	/// its replacement. It runs at most once per call and never concurrently with another loader
	/// on the same gate. Callers queued behind a [`AcquireMode::Fresh`] attempt receive that
	/// attempt's outcome; [`AcquireMode::Force`] callers wait for it and then run their own loader.
	pub async fn acquire<L, Fut>(&self, mode: AcquireMode, loader: L) -> Result<Arc<Token>>
	where
		L: FnOnce(Option<Arc<Token>>) -> Fut,
		Fut: Future<Output = Result<Token>>,
	{
		let mut loader = Some(loader);

		loop {
			match self.enter(mode) {
				Entry::Ready(token) => return Ok(token),
				Entry::Queued(rx) => {
					let outcome = rx.await.unwrap_or(Err(Error::RefreshAbandoned));

					if mode == AcquireMode::Fresh {
						return outcome;
					}
				},
				Entry::Leader { previous, rx } => {
					let Some(loader) = loader.take() else {
						return Err(Error::RefreshAbandoned);
					};
					let flight = Flight { gate: self, landed: false };
					let outcome = loader(previous).await.map(Arc::new);

					flight.land(outcome);

					return rx.await.unwrap_or(Err(Error::RefreshAbandoned));
				},
			}
		}
	}

	fn enter(&self, mode: AcquireMode) -> Entry {
		let mut state = self.state.lock();

		if !state.phase.is_busy() && mode == AcquireMode::Fresh {
			if let Some(token) = state.token.as_ref().filter(|token| !expiry::is_expired(token)) {
				return Entry::Ready(token.clone());
			}
		}

		let (tx, rx) = oneshot::channel();

		state.queue.push_back(tx);

		if state.phase.is_busy() {
			return Entry::Queued(rx);
		}

		state.phase =
			if state.token.is_some() { GatePhase::Refreshing } else { GatePhase::Initializing };

		Entry::Leader { previous: state.token.clone(), rx }
	}

	fn land(&self, outcome: Outcome) {
		let waiters = {
			let mut state = self.state.lock();

			match &outcome {
				Ok(token) => {
					state.token = Some(token.clone());
					state.phase = GatePhase::Ready;
				},
				Err(_) =>
					state.phase = if state.token.is_some() {
						GatePhase::Ready
					} else {
						GatePhase::Uninitialized
					},
			}

			std::mem::take(&mut state.queue)
		};

		// Receivers dropped by cancelled callers are skipped.
		for waiter in waiters {
			let _ = waiter.send(outcome.clone());
		}
	}
}

/// Lands [`Error::RefreshAbandoned`] if the leader is dropped mid-flight.
struct Flight<'a> {
	gate: &'a RequestGate,
	landed: bool,
}
impl Flight<'_> {
	fn land(mut self, outcome: Outcome) {
		self.landed = true;
		self.gate.land(outcome);
	}
}
impl Drop for Flight<'_> {
	fn drop(&mut self) {
		if !self.landed {
			self.gate.land(Err(Error::RefreshAbandoned));
		}
	}
}
