use notify_update_content::{error::RenderError, payload::Payload};

#[test]
fn markup_by_key() {
	let payload = Payload::from_json(r#"{"counts": "<div>3</div>", "notifications": "<ul></ul>"}"#).unwrap();
	assert_eq!(payload.markup("counts"), Ok("<div>3</div>"));
	assert_eq!(payload.markup("notifications"), Ok("<ul></ul>"));
	assert_eq!(payload.markup("status"), Err(RenderError::MissingKey { key: "status".to_owned() }));
	assert!(!payload.stop_requested());
}

#[test]
fn non_string_markup() {
	let payload = Payload::from_json(r#"{"counts": 3}"#).unwrap();
	assert_eq!(payload.markup("counts"), Err(RenderError::NotMarkup { key: "counts".to_owned() }));
}

#[test]
fn stop_truthiness() {
	for (json, stop) in [
		(r#"{"stop": 1}"#, true),
		(r#"{"stop": true}"#, true),
		(r#"{"stop": "yes"}"#, true),
		(r#"{"stop": {}}"#, true),
		(r#"{"stop": 0}"#, false),
		(r#"{"stop": false}"#, false),
		(r#"{"stop": ""}"#, false),
		(r#"{"stop": null}"#, false),
		(r#"{}"#, false),
	] {
		assert_eq!(Payload::from_json(json).unwrap().stop_requested(), stop, "{}", json);
	}
}

#[test]
fn stop_is_not_markup() {
	let payload = Payload::from_json(r#"{"stop": 1, "counts": "<p></p>"}"#).unwrap();
	assert!(payload.field("stop").is_none());
	assert!(payload.field("counts").is_some());
}

#[test]
fn rejects_non_objects() {
	assert!(Payload::from_json("[]").is_err());
	assert!(Payload::from_json("\"<p></p>\"").is_err());
	assert!(Payload::from_json("<p></p>").is_err());
}
