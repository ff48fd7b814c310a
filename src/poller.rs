//! The poll cycle: `Idle → Scheduled → InFlight → (Scheduled | Stopped)`.

use crate::{backoff::calculate_backoff, config::DEFAULT_INTERVAL_MS, error::PollError, payload::Payload, render::Render, resources::Resources};
use core::{fmt, mem};
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{debug, error, info, instrument, trace, warn};

/// What a [`Poller`] needs from its host.
///
/// Callbacks handed to [`set_timeout`](`Environment::set_timeout`) and [`fetch`](`Environment::fetch`) must be
/// invoked later from the event loop, never from inside those calls.
pub trait Environment: 'static {
	type Timer;

	/// Milliseconds on a monotonic-enough clock.
	fn now(&self) -> f64;

	/// `false` while the page is hidden or backgrounded.
	fn is_visible(&self) -> bool;

	/// # Errors
	///
	/// Iff the timer couldn't be armed. `callback` is dropped in that case.
	fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Result<Self::Timer, PollError>;

	fn clear_timeout(&self, timer: Self::Timer);

	/// Issues `request` and reports its outcome exactly once.
	///
	/// Any HTTP status, including errors, is a successful [`Response`].
	/// Only transport failures are [`Err`].
	fn fetch(&self, request: Request, on_complete: Box<dyn FnOnce(Result<Response, PollError>)>);

	/// Full page reload.
	fn reload(&self);
}

/// Supplies the url-encoded body for POST polls.
pub trait FormSource {
	/// Serializes the form's fields as they are *now*, in field order.
	///
	/// # Errors
	///
	/// Iff the form can't be found or read.
	fn serialize(&self) -> Result<String, PollError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
}
impl Method {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
	pub method: Method,
	pub url: String,
	/// `application/x-www-form-urlencoded`, present iff [`Method::Post`].
	pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub status: u16,
	pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Scheduled,
	/// Waiting for a response, either issued by this poller or shared with another one.
	InFlight,
	Stopped,
}

struct Inner<E: Environment> {
	env: Rc<E>,
	resources: Resources,
	resource: String,
	/// Current poll interval. Hidden-page checks re-arm with it.
	interval_ms: u32,
	form: Option<Box<dyn FormSource>>,
	renderer: Box<dyn Render>,
	phase: Phase,
	timer: Option<E::Timer>,
}
impl<E: Environment> Drop for Inner<E> {
	fn drop(&mut self) {
		if let Some(timer) = self.timer.take() {
			self.env.clear_timeout(timer);
		}
	}
}

/// Polls one resource on an adaptive interval and feeds each response to its [`Render`]er.
///
/// Handles are cheap to clone. Once the last one is dropped, the pending timer is cleared and queued deliveries
/// are discarded.
pub struct Poller<E: Environment> {
	inner: Rc<RefCell<Inner<E>>>,
}
impl<E: Environment> Clone for Poller<E> {
	fn clone(&self) -> Self {
		Self { inner: Rc::clone(&self.inner) }
	}
}
impl<E: Environment> fmt::Debug for Poller<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.inner.try_borrow() {
			Ok(inner) => f
				.debug_struct("Poller")
				.field("resource", &inner.resource)
				.field("phase", &inner.phase)
				.field("post", &inner.form.is_some())
				.finish(),
			Err(_) => f.debug_struct("Poller").finish_non_exhaustive(),
		}
	}
}
impl<E: Environment> Poller<E> {
	/// Creates an [`Idle`](`Phase::Idle`) poller. Nothing happens until [`start`](`Poller::start`).
	#[must_use]
	pub fn new(env: Rc<E>, resources: Resources, resource: impl Into<String>, renderer: Box<dyn Render>) -> Self {
		Self {
			inner: Rc::new(RefCell::new(Inner {
				env,
				resources,
				resource: resource.into(),
				interval_ms: DEFAULT_INTERVAL_MS,
				form: None,
				renderer,
				phase: Phase::Idle,
				timer: None,
			})),
		}
	}

	/// POST `form` on each poll instead of sending a GET.
	#[must_use]
	pub fn with_form(self, form: Box<dyn FormSource>) -> Self {
		self.inner.borrow_mut().form = Some(form);
		self
	}

	/// Delay before the first poll, and between visibility checks until a response has been timed.
	/// Defaults to [`DEFAULT_INTERVAL_MS`].
	#[must_use]
	pub fn with_interval_ms(self, interval_ms: u32) -> Self {
		self.inner.borrow_mut().interval_ms = interval_ms;
		self
	}

	#[must_use]
	pub fn phase(&self) -> Phase {
		self.inner.borrow().phase
	}

	#[must_use]
	pub fn resource(&self) -> String {
		self.inner.borrow().resource.clone()
	}

	/// Schedules the first poll. Only has an effect on an [`Idle`](`Phase::Idle`) poller.
	#[instrument]
	pub fn start(&self) {
		let interval_ms = {
			let inner = self.inner.borrow();
			if inner.phase != Phase::Idle {
				return warn!(phase = ?inner.phase, "Poller already started.");
			}
			inner.interval_ms
		};
		self.arm(interval_ms);
	}

	/// Stops polling permanently. A response already in flight is still shared with other pollers.
	#[instrument]
	pub fn stop(&self) {
		let mut inner = self.inner.borrow_mut();
		if let Some(timer) = inner.timer.take() {
			inner.env.clear_timeout(timer);
		}
		if inner.phase != Phase::Stopped {
			debug!("Stopped.");
			inner.phase = Phase::Stopped;
		}
	}

	fn upgrade(weak: &Weak<RefCell<Inner<E>>>) -> Option<Self> {
		weak.upgrade().map(|inner| Self { inner })
	}

	fn arm(&self, delay_ms: u32) {
		let weak = Rc::downgrade(&self.inner);
		let mut inner = self.inner.borrow_mut();
		if let Some(previous) = inner.timer.take() {
			inner.env.clear_timeout(previous);
		}
		let armed = inner.env.set_timeout(
			delay_ms,
			Box::new(move || {
				if let Some(poller) = Self::upgrade(&weak) {
					poller.tick();
				}
			}),
		);
		match armed {
			Ok(timer) => {
				trace!(resource = %inner.resource, delay_ms, "Scheduled.");
				inner.timer = Some(timer);
				inner.phase = Phase::Scheduled;
			}
			Err(error) => {
				error!(resource = %inner.resource, %error, "Polling stopped.");
				inner.phase = Phase::Stopped;
			}
		}
	}

	#[instrument]
	fn tick(&self) {
		let (env, resources, resource, interval_ms) = {
			let mut inner = self.inner.borrow_mut();
			inner.timer = None;
			if inner.phase != Phase::Scheduled {
				return trace!(phase = ?inner.phase, "Not scheduled. Ignoring tick.");
			}
			(Rc::clone(&inner.env), inner.resources.clone(), inner.resource.clone(), inner.interval_ms)
		};

		if !env.is_visible() {
			trace!(interval_ms, "Page hidden. Skipping this poll.");
			return self.arm(interval_ms);
		}

		let pending = PendingDelivery(Rc::downgrade(&self.inner));
		let position = resources.enqueue(&resource, Box::new(move |payload: &Payload| pending.deliver(payload)));
		self.inner.borrow_mut().phase = Phase::InFlight;
		if position > 1 {
			return debug!(position, "Sharing the request already in flight.");
		}

		let request = match self.request() {
			Ok(request) => request,
			Err(error) => {
				error!(%error, "Polling stopped.");
				resources.clear(&resource);
				return;
			}
		};

		debug!(method = request.method.as_str(), "Requesting.");
		let started_at = env.now();
		let clock = Rc::clone(&env);
		env.fetch(request, Box::new(move |result| complete(&*clock, &resources, &resource, started_at, result)));
	}

	fn request(&self) -> Result<Request, PollError> {
		let inner = self.inner.borrow();
		Ok(match &inner.form {
			Some(form) => Request {
				method: Method::Post,
				url: inner.resource.clone(),
				body: Some(form.serialize()?),
			},
			None => Request {
				method: Method::Get,
				url: inner.resource.clone(),
				body: None,
			},
		})
	}

	fn deliver(&self, payload: &Payload) {
		let mut inner = self.inner.borrow_mut();
		if inner.phase != Phase::InFlight {
			return trace!(phase = ?inner.phase, "Not waiting for a response. Ignoring it.");
		}

		if let Err(error) = inner.renderer.render(payload) {
			error!(resource = %inner.resource, %error, "Could not render response. Polling stopped.");
			drop(inner);
			return self.stop();
		}

		let interval_ms = inner.resources.interval_ms(&inner.resource);
		inner.interval_ms = interval_ms;
		drop(inner);
		if payload.stop_requested() {
			info!("Server requested to stop polling.");
			self.stop();
		} else {
			self.arm(interval_ms);
		}
	}
}

/// A queued delivery for one poller.
///
/// Dropping it undelivered (the queue was cleared after a failed request) stops the poller.
struct PendingDelivery<E: Environment>(Weak<RefCell<Inner<E>>>);
impl<E: Environment> PendingDelivery<E> {
	fn deliver(mut self, payload: &Payload) {
		let weak = mem::take(&mut self.0);
		if let Some(poller) = Poller::upgrade(&weak) {
			poller.deliver(payload);
		}
	}
}
impl<E: Environment> Drop for PendingDelivery<E> {
	fn drop(&mut self) {
		let Some(inner) = self.0.upgrade() else { return };
		let Ok(mut inner) = inner.try_borrow_mut() else {
			return warn!("Poller busy while its delivery was discarded.");
		};
		if inner.phase == Phase::InFlight {
			debug!(resource = %inner.resource, "Request failed. Polling stopped.");
			inner.phase = Phase::Stopped;
		}
	}
}

#[instrument(skip(env, resources, result))]
fn complete<E: Environment>(env: &E, resources: &Resources, resource: &str, started_at: f64, result: Result<Response, PollError>) {
	let outcome = result.and_then(|response| match response.status {
		200..=299 => Ok(Payload::from_json(&response.body)?),
		401 => Err(PollError::Unauthorized),
		status => Err(PollError::Status { status }),
	});

	match outcome {
		Ok(payload) => {
			let elapsed_ms = env.now() - started_at;
			let interval_ms = calculate_backoff(elapsed_ms);
			debug!(elapsed_ms, interval_ms, "Response received.");
			resources.set_interval_ms(resource, interval_ms);
			resources.flush(resource, &payload);
		}
		Err(PollError::Unauthorized) => {
			warn!("Session expired. Reloading the page.");
			resources.clear(resource);
			env.reload();
		}
		Err(error) => {
			error!(%error, "Polling stopped.");
			resources.clear(resource);
		}
	}
}
