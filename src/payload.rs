use crate::error::RenderError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A decoded poll response: markup fields keyed by render target, plus an optional `stop` flag.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Payload {
	#[serde(default)]
	stop: Option<Value>,
	#[serde(flatten)]
	fields: Map<String, Value>,
}
impl Payload {
	/// Decodes a JSON object.
	///
	/// # Errors
	///
	/// Iff `json` isn't a JSON object.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	/// Whether the server asked to cease polling permanently.
	///
	/// Follows ***JavaScript*** truthiness: `null`, `false`, `0`, `NaN` and `""` don't stop.
	#[must_use]
	pub fn stop_requested(&self) -> bool {
		self.stop.as_ref().map_or(false, is_truthy)
	}

	/// # Errors
	///
	/// If the field is missing or isn't a string.
	pub fn markup(&self, key: &str) -> Result<&str, RenderError> {
		match self.fields.get(key) {
			None => Err(RenderError::MissingKey { key: key.to_owned() }),
			Some(Value::String(markup)) => Ok(markup),
			Some(_) => Err(RenderError::NotMarkup { key: key.to_owned() }),
		}
	}

	#[must_use]
	pub fn field(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
