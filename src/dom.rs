//! [`HostTree`] over a live browser DOM via [`web_sys`].

use crate::{
	error::HostError,
	handler_slots::HandlerSlots,
	host::{HostTree, Property},
	vnode::is_event_property,
};
use core::fmt::{self, Debug, Formatter};
use js_sys::Reflect;
use tracing::{instrument, trace_span};
use wasm_bindgen::{JsCast, JsValue};

/// Patches nodes owned by one [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).
///
/// Event handler properties are routed through a shared trampoline (see [`Property::Handler`]),
/// so handlers must be installed through this host to be readable back with [`HostTree::property`].
///
/// Installed handlers stop firing once the host is dropped.
pub struct DomHost {
	document: web_sys::Document,
	handlers: HandlerSlots,
}
impl Debug for DomHost {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DomHost").field("document", &self.document).finish_non_exhaustive()
	}
}
impl DomHost {
	#[must_use]
	#[instrument]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			handlers: HandlerSlots::new(),
		}
	}

	/// Creates a host for the [***ownerDocument***](https://developer.mozilla.org/en-US/docs/Web/API/Node/ownerDocument) of `node`.
	#[must_use]
	pub fn for_node(node: &web_sys::Node) -> Option<Self> {
		node.owner_document().map(Self::new)
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}
}

fn js_error(error: JsValue) -> HostError {
	HostError::Js(format!("{:?}", error))
}

fn as_element(node: &web_sys::Node) -> Result<&web_sys::Element, HostError> {
	node.dyn_ref::<web_sys::Element>().ok_or_else(|| HostError::NotAnElement(format!("{:?}", node)))
}

impl HostTree for DomHost {
	type Node = web_sys::Node;

	fn create_element(&mut self, tag: &str) -> Result<web_sys::Node, HostError> {
		self.document.create_element(tag).map(Into::into).map_err(js_error)
	}

	fn create_text(&mut self, text: &str) -> Result<web_sys::Node, HostError> {
		Ok(self.document.create_text_node(text).into())
	}

	fn attribute(&self, node: &web_sys::Node, name: &str) -> Option<String> {
		node.dyn_ref::<web_sys::Element>()?.get_attribute(name)
	}

	fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) -> Result<(), HostError> {
		as_element(node)?.set_attribute(name, value).map_err(js_error)
	}

	fn remove_attribute(&mut self, node: &web_sys::Node, name: &str) -> Result<(), HostError> {
		as_element(node)?.remove_attribute(name).map_err(js_error)
	}

	fn property(&self, node: &web_sys::Node, name: &str) -> Option<Property> {
		if is_event_property(name) {
			return self.handlers.lookup(node.dyn_ref()?, name).map(Property::Handler);
		}
		let value = Reflect::get(node, &JsValue::from_str(name)).ok()?;
		if let Some(value) = value.as_bool() {
			Some(Property::Bool(value))
		} else {
			value.as_string().map(Property::Text)
		}
	}

	fn set_property(&mut self, node: &web_sys::Node, name: &str, value: Option<Property>) -> Result<(), HostError> {
		let span = trace_span!("Setting property", name);
		let _enter = span.enter();
		let value = match value {
			Some(Property::Handler(handler)) => return self.handlers.install(as_element(node)?, name, handler).map_err(js_error),
			None if is_event_property(name) => return self.handlers.uninstall(as_element(node)?, name).map_err(js_error),
			Some(Property::Bool(value)) => JsValue::from_bool(value),
			Some(Property::Text(value)) => JsValue::from_str(&value),
			None => JsValue::NULL,
		};
		Reflect::set(node, &JsValue::from_str(name), &value).map(drop).map_err(js_error)
	}

	fn append_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), HostError> {
		parent.append_child(child).map(drop).map_err(js_error)
	}

	fn insert_before(&mut self, parent: &web_sys::Node, child: &web_sys::Node, reference: Option<&web_sys::Node>) -> Result<(), HostError> {
		parent.insert_before(child, reference).map(drop).map_err(js_error)
	}

	fn remove_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), HostError> {
		parent.remove_child(child).map(drop).map_err(js_error)
	}

	fn replace_child(&mut self, parent: &web_sys::Node, new_child: &web_sys::Node, old_child: &web_sys::Node) -> Result<(), HostError> {
		parent.replace_child(new_child, old_child).map(drop).map_err(js_error)
	}

	fn text_content(&self, node: &web_sys::Node) -> Option<String> {
		node.text_content()
	}

	fn set_text_content(&mut self, node: &web_sys::Node, text: &str) -> Result<(), HostError> {
		node.set_text_content(Some(text));
		Ok(())
	}

	fn child_count(&self, parent: &web_sys::Node) -> usize {
		parent.child_nodes().length() as usize
	}

	fn child_at(&self, parent: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
		parent.child_nodes().get(u32::try_from(index).ok()?)
	}

	fn tag_name(&self, node: &web_sys::Node) -> Option<String> {
		node.dyn_ref::<web_sys::Element>().map(web_sys::Element::tag_name)
	}

	fn settle(&mut self, root: &web_sys::Node) {
		self.handlers.collect_garbage(root);
	}
}
