//! Declarative activation: elements name the modules to attach to them, and a [`ModuleRegistry`] builds them.

use crate::error::ModuleError;
use hashbrown::HashMap;
use tracing::{debug, error, instrument};

/// Whitespace-separated list of module names.
pub const MARKER_ATTRIBUTE: &str = "data-notify-module";

/// Set on elements whose modules were started, so they aren't started twice.
pub const STARTED_ATTRIBUTE: &str = "data-notify-module-started";

/// A running behavior attached to an element.
pub trait Module {
	/// Releases timers and other ongoing work. The module stays inert afterwards.
	fn stop(&self);
}

pub type Factory<E> = Box<dyn Fn(&E) -> Result<Box<dyn Module>, ModuleError>>;

/// Maps module names to factories.
pub struct ModuleRegistry<E> {
	factories: HashMap<&'static str, Factory<E>>,
}
impl<E> Default for ModuleRegistry<E> {
	fn default() -> Self {
		Self::new()
	}
}
impl<E> core::fmt::Debug for ModuleRegistry<E> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_set().entries(self.factories.keys()).finish()
	}
}
impl<E> ModuleRegistry<E> {
	#[must_use]
	pub fn new() -> Self {
		Self { factories: HashMap::new() }
	}

	/// Registers `factory` as `name`, replacing any previous registration.
	pub fn register(&mut self, name: &'static str, factory: Factory<E>) -> &mut Self {
		if self.factories.insert(name, factory).is_some() {
			debug!(name, "Replaced module registration.");
		}
		self
	}

	#[must_use]
	pub fn is_registered(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	/// # Errors
	///
	/// If `name` isn't registered, or its factory fails.
	pub fn start(&self, name: &str, element: &E) -> Result<Box<dyn Module>, ModuleError> {
		let factory = self.factories.get(name).ok_or_else(|| ModuleError::Unknown { name: name.to_owned() })?;
		let module = factory(element)?;
		debug!(name, "Started module.");
		Ok(module)
	}

	/// Starts each module named in `names` (a [`MARKER_ATTRIBUTE`] value) on `element`.
	///
	/// Failures are logged and skipped.
	#[instrument(skip(self, element))]
	pub fn start_all(&self, names: &str, element: &E) -> Vec<Box<dyn Module>> {
		module_names(names)
			.filter_map(|name| match self.start(name, element) {
				Ok(module) => Some(module),
				Err(error) => {
					error!(name, %error, "Could not start module.");
					None
				}
			})
			.collect()
	}
}

pub fn module_names(marker: &str) -> impl Iterator<Item = &str> {
	marker.split_whitespace()
}
