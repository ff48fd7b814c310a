//! Declarative configuration, read from a component element's `data-*` attributes.

use crate::error::ConfigError;

/// Delay before the first poll of a resource, and its interval until a response has been timed.
pub const DEFAULT_INTERVAL_MS: u32 = 2000;

pub const RESOURCE_ATTRIBUTE: &str = "data-resource";
pub const KEY_ATTRIBUTE: &str = "data-key";
pub const FORM_ATTRIBUTE: &str = "data-form";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateContentConfig {
	/// URL to poll.
	pub resource: String,
	/// Payload field holding this component's markup.
	pub key: String,
	/// `id` of a form to POST instead of sending a GET.
	pub form: Option<String>,
	pub interval_ms: u32,
}
impl UpdateContentConfig {
	#[must_use]
	pub fn new(resource: impl Into<String>, key: impl Into<String>) -> Self {
		Self {
			resource: resource.into(),
			key: key.into(),
			form: None,
			interval_ms: DEFAULT_INTERVAL_MS,
		}
	}

	/// Reads the configuration through `attribute`, which looks up an attribute value by name.
	///
	/// # Errors
	///
	/// Iff [`RESOURCE_ATTRIBUTE`] or [`KEY_ATTRIBUTE`] is missing or blank.
	pub fn from_attributes(attribute: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let required = |name: &'static str| non_blank(attribute(name)).ok_or(ConfigError::MissingAttribute { name });
		Ok(Self {
			resource: required(RESOURCE_ATTRIBUTE)?,
			key: required(KEY_ATTRIBUTE)?,
			form: non_blank(attribute(FORM_ATTRIBUTE)),
			interval_ms: DEFAULT_INTERVAL_MS,
		})
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}
