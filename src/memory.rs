//! A headless [`HostTree`] that keeps its nodes in an arena and journals every mutation.
//!
//! Useful for tests (the journal makes "how many mutations did this pass emit?" a simple assertion)
//! and for running render loops without a browser.

use crate::{
	error::HostError,
	host::{HostTree, Property},
	vnode::EventHandler,
};
use core::{
	any::Any,
	fmt::{self, Debug, Formatter, Write as _},
};
use hashbrown::HashMap;
use tracing::trace;

/// Handle to a node in a [`MemoryHost`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);
impl Debug for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// One journaled host mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
	CreateElement { node: NodeId, tag: String },
	CreateText { node: NodeId, text: String },
	SetAttribute { node: NodeId, name: String, value: String },
	RemoveAttribute { node: NodeId, name: String },
	SetProperty { node: NodeId, name: String, value: Option<Property> },
	AppendChild { parent: NodeId, child: NodeId },
	InsertBefore { parent: NodeId, child: NodeId, reference: Option<NodeId> },
	RemoveChild { parent: NodeId, child: NodeId },
	ReplaceChild { parent: NodeId, new_child: NodeId, old_child: NodeId },
	SetText { node: NodeId, text: String },
}

#[derive(Debug)]
struct NodeData {
	parent: Option<NodeId>,
	kind: NodeKind,
}

#[derive(Debug)]
enum NodeKind {
	Element {
		tag: String,
		attributes: Vec<(String, String)>,
		properties: HashMap<String, Property>,
		children: Vec<NodeId>,
	},
	Text(String),
}

/// Arena-backed host tree. Nodes are never freed, so [`NodeId`]s stay valid for the host's lifetime.
///
/// Memory use therefore grows with every node ever created, and the journal grows until it's taken.
/// Long-running render loops should turn journaling off with [`MemoryHost::set_journaling`]
/// and are still better served by a host that can free detached subtrees.
#[derive(Debug)]
pub struct MemoryHost {
	nodes: Vec<NodeData>,
	root: NodeId,
	journal: Vec<Mutation>,
	journaling: bool,
}
impl Default for MemoryHost {
	fn default() -> Self {
		Self::new()
	}
}
impl MemoryHost {
	/// Creates a host with an empty `<body>` root.
	#[must_use]
	pub fn new() -> Self {
		Self::with_root_tag("body")
	}

	#[must_use]
	pub fn with_root_tag(tag: &str) -> Self {
		Self {
			nodes: vec![NodeData {
				parent: None,
				kind: NodeKind::Element {
					tag: tag.to_owned(),
					attributes: Vec::new(),
					properties: HashMap::new(),
					children: Vec::new(),
				},
			}],
			root: NodeId(0),
			journal: Vec::new(),
			journaling: true,
		}
	}

	#[must_use]
	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Every mutation since creation or the last [`MemoryHost::take_mutations`].
	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.journal
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.journal)
	}

	/// Journaling is on by default. Turning it off also discards the current journal.
	pub fn set_journaling(&mut self, journaling: bool) {
		self.journaling = journaling;
		if !journaling {
			self.journal = Vec::new();
		}
	}

	#[must_use]
	pub fn is_journaling(&self) -> bool {
		self.journaling
	}

	/// How many nodes the arena holds, attached or not.
	#[must_use]
	pub fn allocated_nodes(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes.get(node.0).and_then(|data| data.parent)
	}

	/// The callback currently installed as `on<event>`, if any.
	#[must_use]
	pub fn handler(&self, node: NodeId, event: &str) -> Option<EventHandler> {
		match self.property(&node, &format!("on{}", event)) {
			Some(Property::Handler(handler)) => Some(handler),
			_ => None,
		}
	}

	/// Invokes the `on<event>` handler of `node` with `payload`. Returns whether one was installed.
	///
	/// The handler runs while `self` is borrowed. If it needs the host (for example through a render loop),
	/// clone it out with [`MemoryHost::handler`] and call it after the borrow ends.
	pub fn fire(&self, node: NodeId, event: &str, payload: &dyn Any) -> bool {
		match self.handler(node, event) {
			Some(handler) => {
				handler.call(payload);
				true
			}
			None => false,
		}
	}

	/// Serializes the subtree at `node`. Attributes are written in insertion order, properties are omitted.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		let Some(data) = self.nodes.get(node.0) else { return };
		match &data.kind {
			NodeKind::Text(text) => html.push_str(&escape(text)),
			NodeKind::Element { tag, attributes, children, .. } => {
				let _ = write!(html, "<{}", tag);
				for (name, value) in attributes {
					let _ = write!(html, " {}=\"{}\"", name, escape(value));
				}
				html.push('>');
				for child in children {
					self.write_html(*child, html);
				}
				let _ = write!(html, "</{}>", tag);
			}
		}
	}

	fn data(&self, node: NodeId) -> Result<&NodeData, HostError> {
		self.nodes.get(node.0).ok_or_else(|| HostError::UnknownNode(format!("{:?}", node)))
	}

	fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData, HostError> {
		self.nodes.get_mut(node.0).ok_or_else(|| HostError::UnknownNode(format!("{:?}", node)))
	}

	fn children_mut(&mut self, node: NodeId) -> Result<&mut Vec<NodeId>, HostError> {
		match &mut self.data_mut(node)?.kind {
			NodeKind::Element { children, .. } => Ok(children),
			NodeKind::Text(_) => Err(HostError::NotAnElement(format!("{:?}", node))),
		}
	}

	fn children_of(&self, node: NodeId) -> &[NodeId] {
		match self.nodes.get(node.0).map(|data| &data.kind) {
			Some(NodeKind::Element { children, .. }) => children,
			_ => &[],
		}
	}

	fn index_in(&self, parent: NodeId, child: NodeId) -> Result<usize, HostError> {
		self.children_of(parent).iter().position(|&c| c == child).ok_or_else(|| HostError::NotAChild {
			parent: format!("{:?}", parent),
			child: format!("{:?}", child),
		})
	}

	fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
		if let Some(parent) = self.data(child)?.parent {
			self.children_mut(parent)?.retain(|&c| c != child);
			self.data_mut(child)?.parent = None;
		}
		Ok(())
	}

	/// Rejects inserting `child` anywhere inside its own subtree.
	fn ensure_acyclic(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
		let mut ancestor = Some(parent);
		while let Some(node) = ancestor {
			if node == child {
				return Err(HostError::HierarchyRequest {
					parent: format!("{:?}", parent),
					child: format!("{:?}", child),
				});
			}
			ancestor = self.parent(node);
		}
		Ok(())
	}

	fn allocate(&mut self, kind: NodeKind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(NodeData { parent: None, kind });
		id
	}

	fn record(&mut self, mutation: Mutation) {
		trace!(?mutation);
		if self.journaling {
			self.journal.push(mutation);
		}
	}
}

impl HostTree for MemoryHost {
	type Node = NodeId;

	fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
		let node = self.allocate(NodeKind::Element {
			tag: tag.to_owned(),
			attributes: Vec::new(),
			properties: HashMap::new(),
			children: Vec::new(),
		});
		self.record(Mutation::CreateElement { node, tag: tag.to_owned() });
		Ok(node)
	}

	fn create_text(&mut self, text: &str) -> Result<NodeId, HostError> {
		let node = self.allocate(NodeKind::Text(text.to_owned()));
		self.record(Mutation::CreateText { node, text: text.to_owned() });
		Ok(node)
	}

	fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		match &self.nodes.get(node.0)?.kind {
			NodeKind::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone()),
			NodeKind::Text(_) => None,
		}
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), HostError> {
		match &mut self.data_mut(*node)?.kind {
			NodeKind::Element { attributes, .. } => match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value.to_owned(),
				None => attributes.push((name.to_owned(), value.to_owned())),
			},
			NodeKind::Text(_) => return Err(HostError::NotAnElement(format!("{:?}", node))),
		}
		self.record(Mutation::SetAttribute {
			node: *node,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		Ok(())
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
		match &mut self.data_mut(*node)?.kind {
			NodeKind::Element { attributes, .. } => attributes.retain(|(n, _)| n != name),
			NodeKind::Text(_) => return Err(HostError::NotAnElement(format!("{:?}", node))),
		}
		self.record(Mutation::RemoveAttribute { node: *node, name: name.to_owned() });
		Ok(())
	}

	fn property(&self, node: &NodeId, name: &str) -> Option<Property> {
		match &self.nodes.get(node.0)?.kind {
			NodeKind::Element { properties, .. } => properties.get(name).cloned(),
			NodeKind::Text(_) => None,
		}
	}

	fn set_property(&mut self, node: &NodeId, name: &str, value: Option<Property>) -> Result<(), HostError> {
		match &mut self.data_mut(*node)?.kind {
			NodeKind::Element { properties, .. } => match &value {
				Some(value) => {
					properties.insert(name.to_owned(), value.clone());
				}
				None => {
					properties.remove(name);
				}
			},
			NodeKind::Text(_) => return Err(HostError::NotAnElement(format!("{:?}", node))),
		}
		self.record(Mutation::SetProperty {
			node: *node,
			name: name.to_owned(),
			value,
		});
		Ok(())
	}

	fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
		self.children_mut(*parent)?;
		self.ensure_acyclic(*parent, *child)?;
		self.detach(*child)?;
		self.children_mut(*parent)?.push(*child);
		self.data_mut(*child)?.parent = Some(*parent);
		self.record(Mutation::AppendChild { parent: *parent, child: *child });
		Ok(())
	}

	fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) -> Result<(), HostError> {
		let Some(&reference) = reference else {
			self.children_mut(*parent)?;
			self.ensure_acyclic(*parent, *child)?;
			self.detach(*child)?;
			self.children_mut(*parent)?.push(*child);
			self.data_mut(*child)?.parent = Some(*parent);
			self.record(Mutation::InsertBefore {
				parent: *parent,
				child: *child,
				reference: None,
			});
			return Ok(());
		};

		self.index_in(*parent, reference)?;
		if reference == *child {
			return Ok(());
		}
		self.ensure_acyclic(*parent, *child)?;
		self.detach(*child)?;
		let index = self.index_in(*parent, reference)?;
		self.children_mut(*parent)?.insert(index, *child);
		self.data_mut(*child)?.parent = Some(*parent);
		self.record(Mutation::InsertBefore {
			parent: *parent,
			child: *child,
			reference: Some(reference),
		});
		Ok(())
	}

	fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
		let index = self.index_in(*parent, *child)?;
		self.children_mut(*parent)?.remove(index);
		self.data_mut(*child)?.parent = None;
		self.record(Mutation::RemoveChild { parent: *parent, child: *child });
		Ok(())
	}

	fn replace_child(&mut self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) -> Result<(), HostError> {
		self.index_in(*parent, *old_child)?;
		if new_child == old_child {
			return Ok(());
		}
		self.ensure_acyclic(*parent, *new_child)?;
		self.detach(*new_child)?;
		let index = self.index_in(*parent, *old_child)?;
		self.children_mut(*parent)?[index] = *new_child;
		self.data_mut(*new_child)?.parent = Some(*parent);
		self.data_mut(*old_child)?.parent = None;
		self.record(Mutation::ReplaceChild {
			parent: *parent,
			new_child: *new_child,
			old_child: *old_child,
		});
		Ok(())
	}

	fn text_content(&self, node: &NodeId) -> Option<String> {
		match &self.nodes.get(node.0)?.kind {
			NodeKind::Text(text) => Some(text.clone()),
			NodeKind::Element { children, .. } => Some(children.iter().filter_map(|child| self.text_content(child)).collect()),
		}
	}

	fn set_text_content(&mut self, node: &NodeId, text: &str) -> Result<(), HostError> {
		match &mut self.data_mut(*node)?.kind {
			NodeKind::Text(data) => *data = text.to_owned(),
			NodeKind::Element { children, .. } => {
				let orphans = core::mem::take(children);
				for orphan in orphans {
					self.data_mut(orphan)?.parent = None;
				}
				let text_node = self.allocate(NodeKind::Text(text.to_owned()));
				self.data_mut(text_node)?.parent = Some(*node);
				self.children_mut(*node)?.push(text_node);
			}
		}
		self.record(Mutation::SetText { node: *node, text: text.to_owned() });
		Ok(())
	}

	fn child_count(&self, parent: &NodeId) -> usize {
		self.children_of(*parent).len()
	}

	fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
		self.children_of(*parent).get(index).copied()
	}

	fn tag_name(&self, node: &NodeId) -> Option<String> {
		match &self.nodes.get(node.0)?.kind {
			NodeKind::Element { tag, .. } => Some(tag.clone()),
			NodeKind::Text(_) => None,
		}
	}
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
