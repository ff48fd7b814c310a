use crate::render::{Patch, Reconcile};
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};
use wasm_bindgen::JsCast;
use web_sys::{CharacterData, Document, Element, Node};

/// Nesting depth below which subtrees are replaced wholesale instead of diffed.
pub const DEFAULT_DEPTH_LIMIT: usize = 64;

/// Morphs a live [`web_sys::Element`] into the shape of a detached one.
///
/// Live nodes that are already [***isEqualNode***](https://developer.mozilla.org/en-US/docs/Web/API/Node/isEqualNode)
/// to their counterpart are never touched, which keeps focus, caret position and other transient state intact.
///
/// Desired nodes are imported (copied) into the live document, so the detached tree can be discarded afterwards.
#[derive(Debug, Clone)]
pub struct Morph {
	depth_limit: usize,
}
impl Default for Morph {
	fn default() -> Self {
		Self::new()
	}
}
impl Reconcile<Element> for Morph {
	#[instrument(skip(live, desired))]
	fn reconcile(&mut self, live: &Element, desired: &Element) -> Patch<Element> {
		let live_node: &Node = live.as_ref();
		if live_node.is_equal_node(Some(desired.as_ref())) {
			return Patch::Unchanged;
		}

		let document = match live_node.owner_document() {
			Some(document) => document,
			None => {
				error!("No owner document found for live root. Leaving it as is.");
				return Patch::Unchanged;
			}
		};

		if live.tag_name() != desired.tag_name() {
			let span = trace_span!("Replacing root", from = %live.tag_name(), to = %desired.tag_name());
			let _enter = span.enter();
			return match self.replace(&document, live_node, desired.as_ref()) {
				Some(replacement) => match replacement.dyn_into::<Element>() {
					Ok(element) => Patch::Replaced(element),
					Err(node) => {
						error!("Imported root is not an element: {:?}", node);
						Patch::Patched
					}
				},
				None => Patch::Unchanged,
			};
		}

		let mut changed = false;
		self.update_element(&document, live, desired, self.depth_limit, &mut changed);
		if changed {
			Patch::Patched
		} else {
			Patch::Unchanged
		}
	}
}
impl Morph {
	#[must_use]
	pub fn new() -> Self {
		Self::with_depth_limit(DEFAULT_DEPTH_LIMIT)
	}

	#[must_use]
	pub fn with_depth_limit(depth_limit: usize) -> Self {
		Self { depth_limit }
	}

	fn update_element(&self, document: &Document, live: &Element, desired: &Element, depth_limit: usize, changed: &mut bool) {
		let span = trace_span!("Updating element", tag = %live.tag_name(), depth_limit);
		let _enter = span.enter();

		sync_attributes(live, desired, changed);

		if depth_limit == 0 {
			warn!("Depth limit reached. Replacing child nodes wholesale.");
			let live_node: &Node = live.as_ref();
			while let Some(child) = live_node.first_child() {
				if let Err(error) = live_node.remove_child(&child) {
					return error!("Failed to remove node: {:?}", error);
				}
			}
			let children = desired.child_nodes();
			for i in 0..children.length() {
				if let Some(child) = children.get(i) {
					self.insert(document, live_node, &child, None);
				}
			}
			*changed = true;
			return;
		}

		self.splice_child_nodes(document, live.as_ref(), desired.as_ref(), depth_limit - 1, changed);
	}

	/// Lines up the children of `live_parent` with those of `desired_parent`.
	///
	/// Single insertions and removals are found by looking ahead for an equal node, so unaffected siblings keep their
	/// identity. This is quadratic in the worst case.
	#[allow(clippy::similar_names)]
	fn splice_child_nodes(&self, document: &Document, live_parent: &Node, desired_parent: &Node, depth_limit: usize, changed: &mut bool) {
		let desired_list = desired_parent.child_nodes();
		let desired: Vec<Node> = (0..desired_list.length()).filter_map(|i| desired_list.get(i)).collect();
		let live_list = live_parent.child_nodes();
		let mut i = 0;

		for (j, d) in desired.iter().enumerate() {
			'live: loop {
				let l = match live_list.get(i) {
					Some(l) => l,
					None => {
						trace!("Appending beyond end of live child nodes.");
						if self.insert(document, live_parent, d, None) {
							i += 1;
						}
						*changed = true;
						break 'live;
					}
				};

				if l.is_equal_node(Some(d)) {
					i += 1;
					break 'live;
				}

				if desired[j + 1..].iter().any(|later| later.is_equal_node(Some(&l))) {
					trace!("Inserting before surviving node.");
					if self.insert(document, live_parent, d, Some(&l)) {
						i += 1;
					}
					*changed = true;
					break 'live;
				}

				if (i + 1..live_list.length()).filter_map(|k| live_list.get(k)).any(|later| later.is_equal_node(Some(d))) {
					trace!("Removing node with no counterpart.");
					if let Err(error) = live_parent.remove_child(&l) {
						error!("Failed to remove node: {:?}", error);
						i += 1;
					}
					*changed = true;
					continue 'live;
				}

				if l.node_type() == d.node_type() && l.node_name() == d.node_name() {
					self.update_node(document, &l, d, depth_limit, changed);
				} else {
					if STATIC_MAX_LEVEL >= Level::TRACE && l.node_name().eq_ignore_ascii_case(&d.node_name()) {
						trace!("Node names differ only in casing: {:?} -> {:?}", l.node_name(), d.node_name());
					}
					self.replace(document, &l, d);
					*changed = true;
				}
				i += 1;
				break 'live;
			}
		}

		while let Some(leftover) = live_list.get(i) {
			if let Err(error) = live_parent.remove_child(&leftover) {
				error!("Failed to remove leftover node: {:?}", error);
				i += 1;
			}
			*changed = true;
		}
	}

	fn update_node(&self, document: &Document, live: &Node, desired: &Node, depth_limit: usize, changed: &mut bool) {
		match live.node_type() {
			Node::ELEMENT_NODE => match (live.dyn_ref::<Element>(), desired.dyn_ref::<Element>()) {
				(Some(live), Some(desired)) => self.update_element(document, live, desired, depth_limit, changed),
				_ => {
					error!("Element node is not an `Element`: {:?}", live);
					self.replace(document, live, desired);
					*changed = true;
				}
			},
			Node::TEXT_NODE | Node::COMMENT_NODE => match (live.dyn_ref::<CharacterData>(), desired.dyn_ref::<CharacterData>()) {
				(Some(live), Some(desired)) => {
					let data = desired.data();
					if live.data() != data {
						live.set_data(&data);
						*changed = true;
					}
				}
				_ => {
					error!("Character data node is not `CharacterData`: {:?}", live);
					self.replace(document, live, desired);
					*changed = true;
				}
			},
			_ => {
				self.replace(document, live, desired);
				*changed = true;
			}
		}
	}

	/// Returns the imported node iff it was inserted.
	fn replace(&self, document: &Document, live: &Node, desired: &Node) -> Option<Node> {
		let parent = match live.parent_node() {
			Some(parent) => parent,
			None => {
				error!("Could not find parent node of node to replace. Ignoring.");
				return None;
			}
		};
		let imported = match document.import_node_with_deep(desired, true) {
			Ok(imported) => imported,
			Err(error) => {
				error!("Failed to import node: {:?}", error);
				return None;
			}
		};
		match parent.replace_child(&imported, live) {
			Ok(_) => Some(imported),
			Err(error) => {
				error!("Failed to replace node: {:?}", error);
				None
			}
		}
	}

	/// Returns whether the node was inserted.
	fn insert(&self, document: &Document, parent: &Node, desired: &Node, next_sibling: Option<&Node>) -> bool {
		let imported = match document.import_node_with_deep(desired, true) {
			Ok(imported) => imported,
			Err(error) => {
				error!("Failed to import node: {:?}", error);
				return false;
			}
		};
		match parent.insert_before(&imported, next_sibling) {
			Ok(_) => true,
			Err(error) => {
				error!("Failed to insert node: {:?}", error);
				false
			}
		}
	}
}

#[instrument(skip(live, desired, changed))]
fn sync_attributes(live: &Element, desired: &Element, changed: &mut bool) {
	let stale: Vec<String> = attribute_names(live).into_iter().filter(|name| !desired.has_attribute(name)).collect();
	for name in stale {
		match live.remove_attribute(&name) {
			Ok(()) => *changed = true,
			Err(error) => warn!("Could not remove attribute {:?}: {:?}", name, error),
		}
	}

	for name in attribute_names(desired) {
		let value = desired.get_attribute(&name).unwrap_or_default();
		if live.get_attribute(&name).as_deref() != Some(value.as_str()) {
			match live.set_attribute(&name, &value) {
				Ok(()) => *changed = true,
				Err(error) => error!("Could not set attribute {:?}={:?}: {:?}", name, value, error),
			}
		}
	}
}

fn attribute_names(element: &Element) -> Vec<String> {
	let attributes = element.attributes();
	(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| attribute.name()).collect()
}
