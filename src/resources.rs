use crate::{
	config::DEFAULT_INTERVAL_MS,
	payload::Payload,
	queue::{invoke_all, Callback, RequestQueue},
};
use hashbrown::HashMap;
use std::{cell::RefCell, rc::Rc};
use tracing::trace;

/// Mutable poll bookkeeping for one resource URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
	pub current_interval_ms: u32,
}
impl Default for PollState {
	fn default() -> Self {
		Self { current_interval_ms: DEFAULT_INTERVAL_MS }
	}
}

#[derive(Debug, Default)]
struct Inner {
	queue: RequestQueue<Callback<Payload>>,
	states: HashMap<String, PollState>,
}

/// Shared registry of per-resource poll state.
///
/// Pollers built with clones of the same [`Resources`] coalesce requests for identical resource URLs.
/// Independent instances never interact.
#[derive(Debug, Clone, Default)]
pub struct Resources(Rc<RefCell<Inner>>);
impl Resources {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// See [`RequestQueue::enqueue`].
	pub fn enqueue(&self, resource: &str, callback: Callback<Payload>) -> usize {
		self.0.borrow_mut().queue.enqueue(resource, callback)
	}

	/// See [`RequestQueue::flush`].
	///
	/// The registry isn't borrowed while callbacks run, so they may enqueue or read intervals freely.
	pub fn flush(&self, resource: &str, payload: &Payload) -> usize {
		let callbacks = self.0.borrow_mut().queue.take(resource);
		let count = invoke_all(callbacks, payload);
		trace!(resource, count, "Flushed.");
		count
	}

	/// See [`RequestQueue::clear`].
	pub fn clear(&self, resource: &str) -> usize {
		self.0.borrow_mut().queue.clear(resource)
	}

	#[must_use]
	pub fn queued(&self, resource: &str) -> usize {
		self.0.borrow().queue.len(resource)
	}

	#[must_use]
	pub fn state(&self, resource: &str) -> PollState {
		self.0.borrow().states.get(resource).copied().unwrap_or_default()
	}

	#[must_use]
	pub fn interval_ms(&self, resource: &str) -> u32 {
		self.state(resource).current_interval_ms
	}

	pub fn set_interval_ms(&self, resource: &str, interval_ms: u32) {
		trace!(resource, interval_ms, "Interval updated.");
		self.0.borrow_mut().states.entry_ref(resource).or_default().current_interval_ms = interval_ms;
	}
}
