//! The capability boundary between the differ and whatever tree it patches.

use crate::{error::HostError, vnode::EventHandler};
use core::fmt::Debug;

/// A live property value on a host node.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
	Bool(bool),
	Text(String),
	Handler(EventHandler),
}

/// A live, stateful tree the [`Reconciler`](`crate::Reconciler`) can patch.
///
/// Node handles are cheap to clone and compare by identity.
/// Each node has at most one parent; inserting a node that already has one moves it.
pub trait HostTree {
	type Node: Clone + PartialEq + Debug;

	fn create_element(&mut self, tag: &str) -> Result<Self::Node, HostError>;
	fn create_text(&mut self, text: &str) -> Result<Self::Node, HostError>;

	/// Current declarative attribute value, or [`None`] if absent or `node` isn't an element.
	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), HostError>;
	fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

	fn property(&self, node: &Self::Node, name: &str) -> Option<Property>;
	/// [`None`] resets the property, which for event handlers uninstalls the callback.
	fn set_property(&mut self, node: &Self::Node, name: &str, value: Option<Property>) -> Result<(), HostError>;

	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;
	/// Appends if `reference` is [`None`].
	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) -> Result<(), HostError>;
	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;
	fn replace_child(&mut self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node) -> Result<(), HostError>;

	fn text_content(&self, node: &Self::Node) -> Option<String>;
	fn set_text_content(&mut self, node: &Self::Node, text: &str) -> Result<(), HostError>;

	fn child_count(&self, parent: &Self::Node) -> usize;
	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;

	fn children(&self, parent: &Self::Node) -> Vec<Self::Node> {
		(0..self.child_count(parent)).filter_map(|i| self.child_at(parent, i)).collect()
	}

	/// [`None`] for anything that isn't an element.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;

	/// Called once after each complete pass over `root`.
	fn settle(&mut self, root: &Self::Node) {
		let _ = root;
	}
}
