//! Error types.
//!
//! [***JavaScript***](https://developer.mozilla.org/en-US/docs/Web/JavaScript) exceptions are carried as their
//! [`Debug`] rendering, since [`wasm_bindgen::JsValue`] isn't [`Send`] or [`std::error::Error`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
	#[error("Missing or empty attribute `{name}`")]
	MissingAttribute { name: &'static str },
}

/// Markup that can't become exactly one detached root element.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
	#[error("Markup contains no element")]
	Empty,

	#[error("Markup contains {count} root elements, expected exactly one")]
	MultipleRoots { count: u32 },

	#[error("Could not parse markup: {message}")]
	Dom { message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
	#[error("Response has no field `{key}`")]
	MissingKey { key: String },

	#[error("Response field `{key}` is not a markup string")]
	NotMarkup { key: String },

	#[error("Invalid markup in response field `{key}`: {source}")]
	Markup {
		key: String,
		#[source]
		source: MarkupError,
	},
}

/// Reasons a poll ended polling for its resource.
#[derive(Debug, Error)]
pub enum PollError {
	#[error("Session expired (HTTP 401)")]
	Unauthorized,

	#[error("Unexpected HTTP status {status}")]
	Status { status: u16 },

	#[error("Network request failed: {message}")]
	Network { message: String },

	#[error("Could not decode response: {source}")]
	Decode {
		#[from]
		source: serde_json::Error,
	},

	#[error("Could not serialize form `{form}`: {message}")]
	Form { form: String, message: String },

	#[error("Could not arm timer: {message}")]
	Timer { message: String },
}

#[derive(Debug, Error)]
pub enum ModuleError {
	#[error("No module registered as `{name}`")]
	Unknown { name: String },

	#[error("Invalid module configuration: {source}")]
	Config {
		#[from]
		source: ConfigError,
	},

	#[error("Component has no element child to render into")]
	MissingTarget,

	#[error("Browser environment unavailable: {message}")]
	Environment { message: String },
}
