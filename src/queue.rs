use hashbrown::HashMap;
use tracing::trace;

/// A pending delivery for one poll of a resource.
pub type Callback<R> = Box<dyn FnOnce(&R)>;

/// Per-resource queues of callbacks waiting for the same response.
///
/// The first caller to [`enqueue`](`RequestQueue::enqueue`) for a resource (position `1`) owns the network request.
/// Later callers only piggyback and are served by the same [`flush`](`RequestQueue::flush`).
pub struct RequestQueue<T> {
	pending: HashMap<String, Vec<T>>,
}
impl<T> Default for RequestQueue<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> core::fmt::Debug for RequestQueue<T> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_map().entries(self.pending.iter().map(|(resource, queue)| (resource, queue.len()))).finish()
	}
}
impl<T> RequestQueue<T> {
	#[must_use]
	pub fn new() -> Self {
		Self { pending: HashMap::new() }
	}

	/// Appends `callback` and returns its 1-indexed position.
	pub fn enqueue(&mut self, resource: &str, callback: T) -> usize {
		let queue = self.pending.entry_ref(resource).or_default();
		queue.push(callback);
		trace!(resource, position = queue.len(), "Enqueued.");
		queue.len()
	}

	/// Empties the queue for `resource`, returning its callbacks in insertion order.
	pub fn take(&mut self, resource: &str) -> Vec<T> {
		self.pending.remove(resource).unwrap_or_default()
	}

	/// Drops every callback queued for `resource` without invoking any, returning how many there were.
	pub fn clear(&mut self, resource: &str) -> usize {
		let dropped = self.take(resource).len();
		trace!(resource, dropped, "Cleared.");
		dropped
	}

	#[must_use]
	pub fn len(&self, resource: &str) -> usize {
		self.pending.get(resource).map_or(0, Vec::len)
	}

	#[must_use]
	pub fn is_empty(&self, resource: &str) -> bool {
		self.len(resource) == 0
	}

	/// Number of resources with at least one queued callback.
	#[must_use]
	pub fn resource_count(&self) -> usize {
		self.pending.values().filter(|queue| !queue.is_empty()).count()
	}
}
impl<R> RequestQueue<Callback<R>> {
	/// Invokes every callback queued for `resource` in insertion order with the same `response`, then leaves the
	/// queue empty. Returns the number of callbacks invoked.
	///
	/// The queue is emptied before the first callback runs, so callbacks enqueued meanwhile wait for the next flush.
	pub fn flush(&mut self, resource: &str, response: &R) -> usize {
		let count = invoke_all(self.take(resource), response);
		trace!(resource, count, "Flushed.");
		count
	}
}

/// Invokes `callbacks` in order with the same `response`. Returns how many ran.
pub fn invoke_all<R>(callbacks: Vec<Callback<R>>, response: &R) -> usize {
	let count = callbacks.len();
	for callback in callbacks {
		callback(response);
	}
	count
}
