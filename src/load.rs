//! Reads existing DOM content back into virtual nodes, so a render loop can adopt markup it didn't create.
//!
//! A `key` attribute in the markup becomes the element's key and is removed from the DOM element,
//! since the differ never touches it again. Attribute strings otherwise go through the same classification as rendered ones,
//! so `on*` attributes stay plain attributes and boolean attributes are loaded as `true`.

use crate::vnode::{Element, VNode, BOOLEAN_PROPERTIES};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{Attr, NamedNodeMap, Node, NodeList, Text};

/// Comments and other non-element, non-text nodes are skipped with a warning.
/// Their host counterparts still occupy child indices, so containers should be free of them.
#[must_use]
pub fn load_child_nodes(child_nodes: &NodeList) -> Vec<VNode> {
	(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).filter_map(|child| load_node(&child)).collect()
}

#[must_use]
pub fn load_node(node: &Node) -> Option<VNode> {
	if let Some(element) = node.dyn_ref::<web_sys::Element>() {
		Some(load_element(element).into())
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Some(VNode::text(text.data()))
	} else {
		warn!("Skipping unrecognised child node: {:?}", node);
		None
	}
}

/// Strips the `key` attribute from `element` if present.
#[must_use]
pub fn load_element(element: &web_sys::Element) -> Element {
	let node: &Node = element.as_ref();
	let loaded = load_attributes(&element.attributes(), Element::new(element.tag_name())).children(load_child_nodes(&node.child_nodes()));
	if loaded.key().is_some() {
		if let Err(error) = element.remove_attribute("key") {
			warn!("Failed to remove adopted key attribute: {:?}", error);
		}
	}
	loaded
}

#[must_use]
pub fn load_attributes(attributes: &NamedNodeMap, element: Element) -> Element {
	(0..attributes.length()).filter_map(|i| attributes.item(i)).fold(element, |element, attribute| load_attribute(&attribute, element))
}

#[must_use]
pub fn load_attribute(attribute: &Attr, element: Element) -> Element {
	let name = attribute.local_name();
	if BOOLEAN_PROPERTIES.contains(&name.as_str()) {
		element.attr(&name, true)
	} else {
		element.attr(&name, attribute.value())
	}
}
