//! Browser implementations of the [`Environment`], [`Dom`] and [`FormSource`] seams.

use crate::{
	error::{MarkupError, ModuleError, PollError},
	modules::{Module, ModuleRegistry, MARKER_ATTRIBUTE, STARTED_ATTRIBUTE},
	poller::{Environment, FormSource, Method, Request, Response},
	render::Dom,
	resources::Resources,
	update_content::{UpdateContent, MODULE_NAME},
};
use std::{cell::RefCell, rc::Rc};
use tracing::{debug, error, instrument, warn};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{CustomEvent, CustomEventInit, Document, Element, FormData, Headers, HtmlFormElement, HtmlTemplateElement, RequestInit, UrlSearchParams, VisibilityState, Window};

/// Dispatched on the document after a render changed its target. `event.detail.el` is the updated root.
pub const UPDATED_EVENT: &str = "updateContent.onafterupdate";

fn js_message(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// The current page.
#[derive(Debug, Clone)]
pub struct Browser {
	window: Window,
	document: Document,
}
impl Browser {
	/// # Errors
	///
	/// Iff there is no `window` or no `document`, e.g. in a worker.
	pub fn new() -> Result<Self, ModuleError> {
		let window = web_sys::window().ok_or_else(|| ModuleError::Environment { message: "No `window`.".to_owned() })?;
		let document = window.document().ok_or_else(|| ModuleError::Environment { message: "No `document`.".to_owned() })?;
		Ok(Self { window, document })
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

/// An armed `setTimeout`. Its callback is released once this is cleared or dropped.
#[derive(Debug)]
pub struct Timeout {
	handle: i32,
	_callback: Closure<dyn FnMut()>,
}
impl Environment for Browser {
	type Timer = Timeout;

	fn now(&self) -> f64 {
		js_sys::Date::now()
	}

	fn is_visible(&self) -> bool {
		self.document.visibility_state() != VisibilityState::Hidden
	}

	fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Result<Self::Timer, PollError> {
		let callback: Closure<dyn FnMut()> = Closure::once(move || callback());
		let timeout = i32::try_from(delay_ms).unwrap_or(i32::MAX);
		let handle = self
			.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), timeout)
			.map_err(|error| PollError::Timer { message: js_message(&error) })?;
		Ok(Timeout { handle, _callback: callback })
	}

	fn clear_timeout(&self, timer: Self::Timer) {
		self.window.clear_timeout_with_handle(timer.handle);
	}

	fn fetch(&self, request: Request, on_complete: Box<dyn FnOnce(Result<Response, PollError>)>) {
		let window = self.window.clone();
		spawn_local(async move { on_complete(fetch(&window, request).await) });
	}

	fn reload(&self) {
		if let Err(error) = self.window.location().reload() {
			error!("Failed to reload the page: {:?}", error);
		}
	}
}

fn network(error: JsValue) -> PollError {
	PollError::Network { message: js_message(&error) }
}

/// Builds the `fetch` request for one poll: JSON is accepted, and POST bodies are sent url-encoded.
///
/// # Errors
///
/// Iff the browser rejects the headers or the URL.
pub fn web_request(request: &Request) -> Result<web_sys::Request, PollError> {
	let headers = Headers::new().map_err(network)?;
	headers.set("Accept", "application/json").map_err(network)?;

	let init = RequestInit::new();
	init.set_method(request.method.as_str());
	if let (Method::Post, Some(body)) = (request.method, &request.body) {
		headers.set("Content-Type", "application/x-www-form-urlencoded").map_err(network)?;
		init.set_body(&JsValue::from_str(body));
	}
	init.set_headers(&headers);

	web_sys::Request::new_with_str_and_init(&request.url, &init).map_err(network)
}

#[instrument(skip(window))]
async fn fetch(window: &Window, request: Request) -> Result<Response, PollError> {
	let web_request = web_request(&request)?;
	let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&web_request)).await.map_err(network)?.dyn_into().map_err(network)?;
	let body = JsFuture::from(response.text().map_err(network)?).await.map_err(network)?;

	Ok(Response {
		status: response.status(),
		body: body.as_string().unwrap_or_default(),
	})
}

/// Parses markup with an inert `<template>` and announces updates with a [`CustomEvent`].
#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
}
impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}
}
impl Dom for WebDom {
	type Node = Element;

	fn parse_fragment(&self, markup: &str) -> Result<Element, MarkupError> {
		let dom = |error: JsValue| MarkupError::Dom { message: js_message(&error) };
		let template: HtmlTemplateElement = self.document.create_element("template").map_err(dom)?.dyn_into().map_err(|element| dom(element.into()))?;
		template.set_inner_html(markup);
		let content = template.content();
		match content.child_element_count() {
			0 => Err(MarkupError::Empty),
			1 => content.first_element_child().ok_or(MarkupError::Empty),
			count => Err(MarkupError::MultipleRoots { count }),
		}
	}

	fn announce_update(&self, root: &Element) {
		let detail = js_sys::Object::new();
		if let Err(error) = js_sys::Reflect::set(&detail, &JsValue::from_str("el"), root) {
			return warn!("Could not build update event detail: {:?}", error);
		}
		let init = CustomEventInit::new();
		init.set_detail(&detail);
		let event = match CustomEvent::new_with_event_init_dict(UPDATED_EVENT, &init) {
			Ok(event) => event,
			Err(error) => return warn!("Could not create {:?} event: {:?}", UPDATED_EVENT, error),
		};
		if let Err(error) = self.document.dispatch_event(&event) {
			warn!("Could not dispatch {:?} event: {:?}", UPDATED_EVENT, error);
		}
	}
}

/// A form looked up by `id` each time it's serialized, so polls always send its current values.
#[derive(Debug, Clone)]
pub struct FormById {
	document: Document,
	id: String,
}
impl FormById {
	#[must_use]
	pub fn new(document: Document, id: impl Into<String>) -> Self {
		Self { document, id: id.into() }
	}
}
impl FormSource for FormById {
	fn serialize(&self) -> Result<String, PollError> {
		let failed = |message: String| PollError::Form { form: self.id.clone(), message };
		let form: HtmlFormElement = self
			.document
			.get_element_by_id(&self.id)
			.ok_or_else(|| failed("not found".to_owned()))?
			.dyn_into()
			.map_err(|_| failed("not a <form>".to_owned()))?;
		let data = FormData::new_with_form(&form).map_err(|error| failed(js_message(&error)))?;
		let params = UrlSearchParams::new_with_str_sequence_sequence(&data).map_err(|error| failed(js_message(&error)))?;
		Ok(params.to_string().into())
	}
}

/// The registry [`start_modules`] uses by default: just `update-content`.
#[must_use]
pub fn default_registry(browser: &Rc<Browser>, resources: &Resources) -> ModuleRegistry<Element> {
	let mut registry = ModuleRegistry::new();
	let browser = Rc::clone(browser);
	let resources = resources.clone();
	registry.register(
		MODULE_NAME,
		Box::new(move |component: &Element| -> Result<Box<dyn Module>, ModuleError> { Ok(Box::new(UpdateContent::start(component, &browser, &resources)?)) }),
	);
	registry
}

/// Starts every module marked under `root` that wasn't started before.
#[instrument(skip(registry))]
pub fn start_modules(registry: &ModuleRegistry<Element>, root: &Element) -> Vec<Box<dyn Module>> {
	let selector = format!("[{}]", MARKER_ATTRIBUTE);
	let marked = match root.query_selector_all(&selector) {
		Ok(marked) => marked,
		Err(error) => {
			error!("Could not look up modules: {:?}", error);
			return Vec::new();
		}
	};

	let mut started = Vec::new();
	for i in 0..marked.length() {
		let Some(element) = marked.get(i).and_then(|node| node.dyn_into::<Element>().ok()) else { continue };
		if element.has_attribute(STARTED_ATTRIBUTE) {
			debug!("Skipping started module element.");
			continue;
		}
		let names = element.get_attribute(MARKER_ATTRIBUTE).unwrap_or_default();
		started.extend(registry.start_all(&names, &element));
		if let Err(error) = element.set_attribute(STARTED_ATTRIBUTE, "") {
			warn!("Could not mark module element as started: {:?}", error);
		}
	}
	started
}

thread_local! {
	static STARTED: RefCell<Vec<Box<dyn Module>>> = RefCell::new(Vec::new());
	static RESOURCES: Resources = Resources::new();
}

/// Starts all `data-notify-module` components in the document. Safe to call again after new markup was inserted.
///
/// # Errors
///
/// Iff there is no browser document.
#[wasm_bindgen(js_name = startModules)]
pub fn start_document_modules() -> Result<usize, JsValue> {
	let browser = Rc::new(Browser::new().map_err(|error| JsValue::from_str(&error.to_string()))?);
	let root = browser.document().document_element().ok_or_else(|| JsValue::from_str("No document element."))?;
	let registry = RESOURCES.with(|resources| default_registry(&browser, resources));
	let modules = start_modules(&registry, &root);
	let count = modules.len();
	STARTED.with(|started| started.borrow_mut().extend(modules));
	Ok(count)
}

/// Stops every module started through [`start_document_modules`].
#[wasm_bindgen(js_name = stopModules)]
pub fn stop_document_modules() {
	let modules = STARTED.with(|started| std::mem::take(&mut *started.borrow_mut()));
	for module in &modules {
		module.stop();
	}
}
