#![cfg(target_arch = "wasm32")]

use notify_update_content::{
	browser::{WebDom, UPDATED_EVENT},
	error::{MarkupError, RenderError},
	morph::Morph,
	payload::Payload,
	render::{Dom, Patch, Reconcile, Render, Renderer},
};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Document, Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn document() -> Document {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
	window().unwrap().document().unwrap()
}

/// Mounts `markup` in a fresh container and returns its single element child.
fn mount(document: &Document, markup: &str) -> Element {
	let container = document.create_element("div").unwrap();
	document.body().unwrap().append_child(&container).unwrap();
	container.set_inner_html(markup);
	container.first_element_child().unwrap()
}

fn desired(document: &Document, markup: &str) -> Element {
	WebDom::new(document.clone()).parse_fragment(markup).unwrap()
}

fn children(element: &Element) -> Vec<web_sys::Node> {
	let nodes = element.child_nodes();
	(0..nodes.length()).filter_map(|i| nodes.get(i)).collect()
}

#[wasm_bindgen_test]
fn identical_keeps_focus() {
	let document = document();
	let markup = r#"<form><input id="identical-query" name="q" value="x"><p>3 sent</p></form>"#;
	let live = mount(&document, markup);
	let input: HtmlElement = document.get_element_by_id("identical-query").unwrap().dyn_into().unwrap();
	input.focus().unwrap();

	assert_eq!(Morph::new().reconcile(&live, &desired(&document, markup)), Patch::Unchanged);

	let still: HtmlElement = document.get_element_by_id("identical-query").unwrap().dyn_into().unwrap();
	assert!(AsRef::<web_sys::Node>::as_ref(&still).is_same_node(Some(input.as_ref())));
	assert!(document.active_element().unwrap().is_same_node(Some(input.as_ref())));
}

#[wasm_bindgen_test]
fn sibling_change_keeps_focus() {
	let document = document();
	let live = mount(&document, r#"<form><input id="sibling-query" name="q"><p>3 sent</p></form>"#);
	let input: HtmlElement = document.get_element_by_id("sibling-query").unwrap().dyn_into().unwrap();
	input.focus().unwrap();

	assert_eq!(
		Morph::new().reconcile(&live, &desired(&document, r#"<form><input id="sibling-query" name="q"><p>4 sent</p></form>"#)),
		Patch::Patched
	);

	assert_eq!(live.text_content().unwrap(), "4 sent");
	assert!(document.active_element().unwrap().is_same_node(Some(input.as_ref())));
}

#[wasm_bindgen_test]
fn insert_one_sibling() {
	let document = document();
	let live = mount(&document, "<ul><li>a</li><li>c</li></ul>");
	let before = children(&live);

	assert_eq!(Morph::new().reconcile(&live, &desired(&document, "<ul><li>a</li><li>b</li><li>c</li></ul>")), Patch::Patched);

	let after = children(&live);
	assert_eq!(after.len(), 3);
	assert!(after[0].is_same_node(Some(&before[0])));
	assert!(after[2].is_same_node(Some(&before[1])));
	assert_eq!(after[1].text_content().unwrap(), "b");
}

#[wasm_bindgen_test]
fn remove_one_node() {
	let document = document();
	let live = mount(&document, "<ul><li>a</li><li>b</li><li>c</li></ul>");
	let before = children(&live);

	assert_eq!(Morph::new().reconcile(&live, &desired(&document, "<ul><li>a</li><li>c</li></ul>")), Patch::Patched);

	let after = children(&live);
	assert_eq!(after.len(), 2);
	assert!(after[0].is_same_node(Some(&before[0])));
	assert!(after[1].is_same_node(Some(&before[2])));
	assert!(before[1].parent_node().is_none());
}

#[wasm_bindgen_test]
fn attributes_follow() {
	let document = document();
	let live = mount(&document, r#"<div class="old" data-stale="1">x</div>"#);

	assert_eq!(Morph::new().reconcile(&live, &desired(&document, r#"<div class="new" aria-live="polite">x</div>"#)), Patch::Patched);

	assert_eq!(live.get_attribute("class").as_deref(), Some("new"));
	assert_eq!(live.get_attribute("aria-live").as_deref(), Some("polite"));
	assert!(!live.has_attribute("data-stale"));
}

#[wasm_bindgen_test]
fn different_root_is_replaced() {
	let document = document();
	let live = mount(&document, "<div>x</div>");
	let parent = live.parent_node().unwrap();

	match Morph::new().reconcile(&live, &desired(&document, "<section>x</section>")) {
		Patch::Replaced(root) => {
			assert_eq!(root.tag_name(), "SECTION");
			assert!(parent.first_child().unwrap().is_same_node(Some(root.as_ref())));
		}
		other => panic!("expected replacement, got {:?}", other),
	}
}

#[wasm_bindgen_test]
fn depth_limit_replaces_subtree() {
	let document = document();
	let live = mount(&document, "<div><p><b>1</b></p></div>");

	assert_eq!(Morph::with_depth_limit(0).reconcile(&live, &desired(&document, "<div><p><b>2</b></p></div>")), Patch::Patched);
	assert_eq!(live.inner_html(), "<p><b>2</b></p>");
}

#[wasm_bindgen_test]
fn parse_fragment_requires_one_root() {
	let document = document();
	let dom = WebDom::new(document.clone());
	assert_eq!(dom.parse_fragment("  \n ").unwrap_err(), MarkupError::Empty);
	assert_eq!(dom.parse_fragment("text only").unwrap_err(), MarkupError::Empty);
	assert_eq!(dom.parse_fragment("<p>1</p><p>2</p>").unwrap_err(), MarkupError::MultipleRoots { count: 2 });
	assert_eq!(dom.parse_fragment("\n<p>1</p>\n").unwrap().tag_name(), "P");
}

#[wasm_bindgen_test]
fn renderer_announces_changes_only() {
	let document = document();
	let live = mount(&document, r#"<div class="ajax-block-container"><p>1 sent</p></div>"#);

	let count = Rc::new(Cell::new(0));
	let listener = {
		let count = Rc::clone(&count);
		Closure::wrap(Box::new(move |_: web_sys::Event| count.set(count.get() + 1)) as Box<dyn FnMut(web_sys::Event)>)
	};
	document.add_event_listener_with_callback(UPDATED_EVENT, listener.as_ref().unchecked_ref()).unwrap();

	let mut renderer = Renderer::new(WebDom::new(document.clone()), Morph::new(), live.clone(), "counts");
	let payload = |markup: &str| Payload::from_json(&serde_json::json!({ "counts": markup }).to_string()).unwrap();

	renderer.render(&payload(r#"<div class="ajax-block-container"><p>1 sent</p></div>"#)).unwrap();
	assert_eq!(count.get(), 0);

	renderer.render(&payload(r#"<div class="ajax-block-container"><p>1 sent</p><p>1 failed</p></div>"#)).unwrap();
	assert_eq!(count.get(), 1);
	assert_eq!(live.child_element_count(), 2);

	let error = renderer.render(&payload("")).unwrap_err();
	assert_eq!(error, RenderError::Markup { key: "counts".to_owned(), source: MarkupError::Empty });
	assert_eq!(live.child_element_count(), 2);
	assert_eq!(count.get(), 1);

	document.remove_event_listener_with_callback(UPDATED_EVENT, listener.as_ref().unchecked_ref()).unwrap();
}
