use crate::{
	error::{MarkupError, RenderError},
	payload::Payload,
};
use tracing::{debug, instrument, trace};

/// Outcome of reconciling a live root against desired content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<N> {
	/// Structurally identical already. Nothing was touched.
	Unchanged,
	/// The live root was mutated in place.
	Patched,
	/// The live root had to be swapped out for this node.
	Replaced(N),
}
impl<N> Patch<N> {
	#[must_use]
	pub fn changed(&self) -> bool {
		!matches!(self, Patch::Unchanged)
	}
}

/// Structural tree reconciliation.
///
/// Implementations must leave subtrees that are already equal to their desired counterpart untouched.
pub trait Reconcile<N> {
	fn reconcile(&mut self, live: &N, desired: &N) -> Patch<N>;
}

/// The document a [`Renderer`] writes into.
pub trait Dom {
	type Node;

	/// Parses `markup` into a detached node.
	///
	/// # Errors
	///
	/// Iff `markup` doesn't contain exactly one root element.
	fn parse_fragment(&self, markup: &str) -> Result<Self::Node, MarkupError>;

	/// Tells listeners outside this crate that `root` now shows new content.
	fn announce_update(&self, root: &Self::Node);
}

/// Something that consumes poll responses.
pub trait Render {
	/// # Errors
	///
	/// Iff `payload` lacks usable markup for this target. The target is left as it was in that case.
	fn render(&mut self, payload: &Payload) -> Result<(), RenderError>;
}

/// Keeps one live root in sync with the markup stored under `key` in each response.
pub struct Renderer<D: Dom, R> {
	dom: D,
	reconciler: R,
	root: D::Node,
	key: String,
}
impl<D, R> Renderer<D, R>
where
	D: Dom,
	R: Reconcile<D::Node>,
{
	#[must_use]
	pub fn new(dom: D, reconciler: R, root: D::Node, key: impl Into<String>) -> Self {
		Self {
			dom,
			reconciler,
			root,
			key: key.into(),
		}
	}

	/// The current live root. This changes if a render had to replace it.
	#[must_use]
	pub fn root(&self) -> &D::Node {
		&self.root
	}

	#[must_use]
	pub fn key(&self) -> &str {
		&self.key
	}
}
impl<D, R> Render for Renderer<D, R>
where
	D: Dom,
	R: Reconcile<D::Node>,
{
	#[instrument(skip(self, payload), fields(key = %self.key))]
	fn render(&mut self, payload: &Payload) -> Result<(), RenderError> {
		let markup = payload.markup(&self.key)?;
		let desired = self.dom.parse_fragment(markup).map_err(|source| RenderError::Markup { key: self.key.clone(), source })?;

		match self.reconciler.reconcile(&self.root, &desired) {
			Patch::Unchanged => {
				trace!("Content unchanged.");
				return Ok(());
			}
			Patch::Patched => debug!("Patched content."),
			Patch::Replaced(root) => {
				debug!("Replaced root.");
				self.root = root;
			}
		}
		self.dom.announce_update(&self.root);
		Ok(())
	}
}
