use crate::{
	attributes,
	error::{HostError, MalformedTree, ReconcileError},
	host::HostTree,
	loggable,
	vnode::{Attribute, Element, Key, VNode},
};
use hashbrown::{HashMap, HashSet};
use tracing::{error, instrument, trace, trace_span, warn};

/// Nesting limit used by [`Reconciler::new`].
pub const DEFAULT_DEPTH_LIMIT: usize = 1024;

/// Diffs virtual trees against each other and patches a [`HostTree`] to match.
///
/// This value holds configuration only. All state of a pass lives on the stack,
/// so the caller is responsible for retaining the last reconciled tree as `old` for the next pass.
///
/// # Correct Use
///
/// The children of `parent` at and after `index` must be exactly what `old` was last reconciled into.
/// Mutations made to that part of the host tree by anyone else are only detected where they're cheap to spot,
/// and are then logged and repaired by recreating the affected node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciler {
	depth_limit: usize,
}
impl Default for Reconciler {
	fn default() -> Self {
		Self::new()
	}
}
impl Reconciler {
	#[must_use]
	pub fn new() -> Self {
		Self { depth_limit: DEFAULT_DEPTH_LIMIT }
	}

	/// Passes that would descend more than `depth_limit` levels fail with [`ReconcileError::DepthLimit`].
	#[must_use]
	pub fn with_depth_limit(self, depth_limit: usize) -> Self {
		Self { depth_limit }
	}

	#[must_use]
	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	/// Makes the host node at `index` under `parent` match `new`, given that it currently matches `old`.
	///
	/// [`None`] on either side means "no node at this position".
	#[instrument(skip(self, host, new, old))]
	pub fn reconcile<H: HostTree>(&self, host: &mut H, parent: &H::Node, new: Option<&VNode>, old: Option<&VNode>, index: usize) -> Result<(), ReconcileError> {
		self.session(host).reconcile_node(parent, new, old, index, self.depth_limit)
	}

	/// Makes the children of `parent` match `new`, given that they currently match `old`.
	#[instrument(skip(self, host, new, old))]
	pub fn reconcile_children<H: HostTree>(&self, host: &mut H, parent: &H::Node, new: &[VNode], old: &[VNode]) -> Result<(), ReconcileError> {
		self.session(host).reconcile_children(parent, new, old, self.depth_limit)
	}

	/// Applies the difference between two attribute lists to `node`.
	#[instrument(skip(self, host, new, old))]
	pub fn patch_attributes<H: HostTree>(&self, host: &mut H, node: &H::Node, new: &[Attribute], old: &[Attribute]) -> Result<(), ReconcileError> {
		attributes::patch_attributes(host, node, old, new).map_err(Into::into)
	}

	fn session<'a, H: HostTree>(&self, host: &'a mut H) -> Session<'a, H> {
		Session { host, depth_limit: self.depth_limit }
	}
}

/// Whether `new` can't be patched into the host node rendered from `old` and must replace it instead.
///
/// Text never becomes an element or vice versa, tags must match, and so must keys:
/// a keyed element is never patched in place into a node rendered for a different key.
#[must_use]
pub fn is_changed(new: &VNode, old: &VNode) -> bool {
	match (new, old) {
		(VNode::Text(_), VNode::Text(_)) => false,
		(VNode::Element(e_2), VNode::Element(e_1)) => !e_2.is_compatible_with(e_1),
		_ => true,
	}
}

/// One reconciliation pass.
struct Session<'a, H: HostTree> {
	host: &'a mut H,
	depth_limit: usize,
}
impl<'a, H: HostTree> Session<'a, H> {
	fn check_depth(&self, depth_limit: usize) -> Result<(), ReconcileError> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			Err(ReconcileError::DepthLimit(self.depth_limit))
		} else {
			Ok(())
		}
	}

	fn reconcile_node(&mut self, parent: &H::Node, vdom_b: Option<&VNode>, vdom_a: Option<&VNode>, index: usize, depth_limit: usize) -> Result<(), ReconcileError> {
		self.check_depth(depth_limit)?;

		match (vdom_b, vdom_a) {
			(None, None) => {
				trace!("Nothing to reconcile at {}.", index);
				Ok(())
			}

			(None, Some(_)) => {
				let span = trace_span!("Removing node", index);
				let _enter = span.enter();
				match self.host.child_at(parent, index) {
					Some(node) => self.host.remove_child(parent, &node)?,
					None => warn!("Expected to remove host node at {} beyond end of children. Skipping.", index),
				}
				Ok(())
			}

			(Some(new), None) => {
				let span = trace_span!("Creating node", index);
				let _enter = span.enter();
				let node = self.materialize(new, depth_limit)?;
				self.insert_at(parent, &node, index)
			}

			(Some(new), Some(old)) => {
				let existing = match self.host.child_at(parent, index) {
					Some(node) => node,
					None => {
						error!("Expected host node at {} beyond end of children. Switching to insertion.", index);
						return self.reconcile_node(parent, Some(new), None, index, depth_limit);
					}
				};

				match (new, old) {
					(VNode::Text(t_2), VNode::Text(t_1)) => {
						let span = trace_span!("Diffing text node", t_1 = loggable(t_1), t_2 = loggable(t_2));
						let _enter = span.enter();
						if self.host.tag_name(&existing).is_some() {
							error!("Expected to update a text node but found {:?}; Recreating the node.", existing);
							return self.replace(parent, &existing, new, depth_limit);
						}
						self.update_text(&existing, t_2, t_1).map_err(Into::into)
					}

					(VNode::Element(e_2), VNode::Element(e_1)) if e_2.is_compatible_with(e_1) => {
						let span = trace_span!("Diffing element", tag = e_1.tag(), key = ?e_1.key());
						let _enter = span.enter();
						match self.host.tag_name(&existing) {
							Some(tag) if tag.eq_ignore_ascii_case(e_1.tag()) => self.update_element(&existing, e_2, e_1, depth_limit),
							found => {
								error!("Expected to update <{}> but found {:?}; Recreating the element.", e_1.tag(), found);
								self.replace(parent, &existing, new, depth_limit)
							}
						}
					}

					_ => {
						let span = trace_span!("Replace mismatching", index);
						let _enter = span.enter();
						self.replace(parent, &existing, new, depth_limit)
					}
				}
			}
		}
	}

	fn update_text(&mut self, node: &H::Node, t_2: &str, t_1: &str) -> Result<(), HostError> {
		let current = self.host.text_content(node);
		if current.as_deref() != Some(t_1) {
			warn!(
				"Unexpected text data: Expected {:?} but found {:?}. Overwriting.",
				loggable(t_1),
				current.as_deref().map(loggable)
			);
		}
		if current.as_deref() != Some(t_2) {
			self.host.set_text_content(node, t_2)?;
		}
		Ok(())
	}

	fn update_element(&mut self, node: &H::Node, e_2: &Element, e_1: &Element, depth_limit: usize) -> Result<(), ReconcileError> {
		debug_assert_eq!(e_1.tag(), e_2.tag());
		attributes::patch_attributes(self.host, node, e_1.attributes(), e_2.attributes())?;
		self.reconcile_children(node, e_2.child_nodes(), e_1.child_nodes(), depth_limit - 1)
	}

	fn replace(&mut self, parent: &H::Node, existing: &H::Node, new: &VNode, depth_limit: usize) -> Result<(), ReconcileError> {
		let node = self.materialize(new, depth_limit)?;
		self.host.replace_child(parent, &node, existing)?;
		Ok(())
	}

	fn insert_at(&mut self, parent: &H::Node, node: &H::Node, index: usize) -> Result<(), ReconcileError> {
		match self.host.child_at(parent, index) {
			Some(reference) => self.host.insert_before(parent, node, Some(&reference))?,
			None => self.host.append_child(parent, node)?,
		}
		Ok(())
	}

	/// Creates a detached host subtree for `vnode`.
	fn materialize(&mut self, vnode: &VNode, depth_limit: usize) -> Result<H::Node, ReconcileError> {
		self.check_depth(depth_limit)?;

		match vnode {
			VNode::Text(text) => {
				let span = trace_span!("Creating text node", text = loggable(text));
				let _enter = span.enter();
				Ok(self.host.create_text(text)?)
			}
			VNode::Element(element) => {
				let span = trace_span!("Creating element", tag = element.tag(), key = ?element.key());
				let _enter = span.enter();
				validate_tag(element.tag())?;
				ensure_unique_keys(element.child_nodes())?;

				let node = self.host.create_element(element.tag())?;
				attributes::patch_attributes(self.host, &node, &[], element.attributes())?;
				for child in element.child_nodes() {
					let child = self.materialize(child, depth_limit - 1)?;
					self.host.append_child(&node, &child)?;
				}
				Ok(node)
			}
		}
	}

	fn reconcile_children(&mut self, parent: &H::Node, vdom_b: &[VNode], vdom_a: &[VNode], depth_limit: usize) -> Result<(), ReconcileError> {
		if vdom_a.is_empty() && vdom_b.is_empty() {
			return Ok(());
		}
		self.check_depth(depth_limit)?;

		if vdom_a.iter().chain(vdom_b).any(|child| child.key().is_some()) {
			self.reconcile_keyed(parent, vdom_b, vdom_a, depth_limit)
		} else {
			self.reconcile_positional(parent, vdom_b, vdom_a, depth_limit)
		}
	}

	/// Index-by-index diffing.
	///
	/// Reordered siblings with equal tags are patched into each other rather than moved.
	fn reconcile_positional(&mut self, parent: &H::Node, vdom_b: &[VNode], vdom_a: &[VNode], depth_limit: usize) -> Result<(), ReconcileError> {
		let span = trace_span!("Diffing positional", "vdom_a.len()" = vdom_a.len(), "vdom_b.len()" = vdom_b.len());
		let _enter = span.enter();

		let common = vdom_a.len().min(vdom_b.len());
		for (i, (new, old)) in vdom_b.iter().zip(vdom_a).enumerate() {
			self.reconcile_node(parent, Some(new), Some(old), i, depth_limit)?;
		}

		for (i, new) in vdom_b.iter().enumerate().skip(common) {
			self.reconcile_node(parent, Some(new), None, i, depth_limit)?;
		}

		for i in (vdom_b.len()..vdom_a.len()).rev() {
			match self.host.child_at(parent, i) {
				Some(surplus) => self.host.remove_child(parent, &surplus)?,
				None => warn!("Expected to remove surplus host node at {} beyond end of children. Skipping.", i),
			}
		}
		Ok(())
	}

	/// Identity-preserving diffing: every keyed element is patched into the host node previously rendered for its key,
	/// and that node is moved into place instead of being recreated.
	fn reconcile_keyed(&mut self, parent: &H::Node, vdom_b: &[VNode], vdom_a: &[VNode], depth_limit: usize) -> Result<(), ReconcileError> {
		let span = trace_span!("Diffing keyed", "vdom_a.len()" = vdom_a.len(), "vdom_b.len()" = vdom_b.len());
		let _enter = span.enter();

		ensure_unique_keys(vdom_b)?;

		// Map keys to the host nodes they were rendered into:
		let mut previous = HashMap::<&Key, (H::Node, &Element)>::new();
		for (i, old) in vdom_a.iter().enumerate() {
			let Some(element) = old.as_element() else { continue };
			let Some(key) = element.key() else { continue };
			match self.host.child_at(parent, i) {
				Some(node) => {
					let found = self.host.tag_name(&node);
					if !found.as_deref().map_or(false, |tag| tag.eq_ignore_ascii_case(element.tag())) {
						error!("Expected keyed <{}> {:?} at {} but found {:?}; It will be recreated.", element.tag(), key, i, found);
					} else if previous.contains_key(key) {
						warn!("Duplicate key {:?} in previous children; Only the first is reused.", key);
					} else {
						previous.insert(key, (node, element));
					}
				}
				None => error!("Expected keyed host node {:?} at {} beyond end of children. It will be recreated.", key, i),
			}
		}

		// Patch reused nodes in place and create the rest:
		let mut used = HashSet::<&Key>::new();
		let mut targets = Vec::with_capacity(vdom_b.len());
		for new in vdom_b {
			let reused = match new {
				VNode::Element(e_2) => e_2.key().and_then(|key| match previous.get(key) {
					Some((node, e_1)) if e_1.tag() == e_2.tag() => Some((key, node.clone(), *e_1, e_2)),
					Some((_, e_1)) => {
						trace!("Key {:?} changed tag from <{}> to <{}>; Recreating.", key, e_1.tag(), e_2.tag());
						None
					}
					None => None,
				}),
				VNode::Text(_) => None,
			};

			match reused {
				Some((key, node, e_1, e_2)) => {
					let span = trace_span!("Reusing keyed element", ?key, tag = e_2.tag());
					let _enter = span.enter();
					self.update_element(&node, e_2, e_1, depth_limit)?;
					used.insert(key);
					targets.push(node);
				}
				None => targets.push(self.materialize(new, depth_limit)?),
			}
		}

		// Remove nodes whose key is gone:
		for old in vdom_a {
			let Some(key) = old.key() else { continue };
			if used.contains(key) {
				continue;
			}
			if let Some((node, _)) = previous.remove(key) {
				trace!("Removing keyed node {:?}.", key);
				self.host.remove_child(parent, &node)?;
			}
		}

		// Move and insert into order:
		for (i, target) in targets.iter().enumerate() {
			let current = self.host.child_at(parent, i);
			if current.as_ref() != Some(target) {
				self.host.insert_before(parent, target, current.as_ref())?;
			}
		}

		// Unkeyed leftovers from the previous render are now all at the end:
		while self.host.child_count(parent) > vdom_b.len() {
			let last = self.host.child_count(parent) - 1;
			match self.host.child_at(parent, last) {
				Some(surplus) => self.host.remove_child(parent, &surplus)?,
				None => break,
			}
		}
		Ok(())
	}
}

fn ensure_unique_keys(children: &[VNode]) -> Result<(), MalformedTree> {
	let mut seen = HashSet::new();
	for key in children.iter().filter_map(VNode::key) {
		if !seen.insert(key) {
			return Err(MalformedTree::DuplicateKey(key.clone()));
		}
	}
	Ok(())
}

fn validate_tag(tag: &str) -> Result<(), MalformedTree> {
	let mut chars = tag.chars();
	let valid = chars.next().map_or(false, |first| first.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
	if valid {
		Ok(())
	} else {
		Err(MalformedTree::InvalidTag(tag.to_owned()))
	}
}
