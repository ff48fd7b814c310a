//! The `update-content` module: keeps a component's first child in sync with a polled resource.
//!
//! ```html
//! <div data-notify-module="update-content" data-resource="/services/1/jobs/2.json" data-key="counts">
//!   <div class="ajax-block-container">…</div>
//! </div>
//! ```

use crate::{
	browser::{Browser, FormById, WebDom},
	config::UpdateContentConfig,
	error::ModuleError,
	modules::Module,
	morph::Morph,
	poller::{Environment, Poller},
	render::Renderer,
	resources::Resources,
};
use std::rc::Rc;
use tracing::{debug, instrument};
use web_sys::Element;

pub const MODULE_NAME: &str = "update-content";

#[derive(Debug)]
pub struct UpdateContent<E: Environment = Browser> {
	config: UpdateContentConfig,
	poller: Poller<E>,
}
impl UpdateContent<Browser> {
	/// Reads `component`'s configuration and starts polling into its first element child.
	///
	/// # Errors
	///
	/// Iff the configuration is incomplete or there is no element child.
	#[instrument(skip(browser, resources))]
	pub fn start(component: &Element, browser: &Rc<Browser>, resources: &Resources) -> Result<Self, ModuleError> {
		let config = UpdateContentConfig::from_attributes(|name| component.get_attribute(name))?;
		let target = component.first_element_child().ok_or(ModuleError::MissingTarget)?;

		let renderer = Renderer::new(WebDom::new(browser.document().clone()), Morph::new(), target, config.key.clone());
		let mut poller = Poller::new(Rc::clone(browser), resources.clone(), config.resource.clone(), Box::new(renderer)).with_interval_ms(config.interval_ms);
		if let Some(form) = &config.form {
			poller = poller.with_form(Box::new(FormById::new(browser.document().clone(), form.clone())));
		}
		poller.start();
		debug!(resource = %config.resource, key = %config.key, "Polling.");

		Ok(Self { config, poller })
	}
}
impl<E: Environment> UpdateContent<E> {
	#[must_use]
	pub fn config(&self) -> &UpdateContentConfig {
		&self.config
	}

	#[must_use]
	pub fn poller(&self) -> &Poller<E> {
		&self.poller
	}
}
impl<E: Environment> Module for UpdateContent<E> {
	fn stop(&self) {
		self.poller.stop();
	}
}
