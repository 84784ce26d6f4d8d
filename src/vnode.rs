//! Immutable virtual node trees.
//!
//! A [`VNode`] is built once per render and never mutated afterwards: every builder method on [`Element`] consumes `self`.
//! Attribute kinds are resolved while building, so the differ never has to sniff attribute names again.

use core::{
	any::Any,
	fmt::{self, Debug, Display, Formatter},
};
use std::rc::Rc;
use tracing::warn;

/// Attribute names that are mirrored by a live boolean property on the host node.
///
/// Browsers treat the *presence* of these attributes as `true`, so `false` has to be expressed by removing them.
pub const BOOLEAN_PROPERTIES: &[&str] = &["autofocus", "checked", "disabled", "hidden", "multiple", "open", "required", "selected"];

/// Tags whose `value` attribute is backed by an editable live property.
pub const VALUE_PROPERTY_TAGS: &[&str] = &["input", "select", "textarea"];

/// A node in a virtual tree.
#[derive(Clone, Debug, PartialEq)]
pub enum VNode {
	Text(String),
	Element(Element),
}
impl VNode {
	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	/// The reconciliation key, if this is a keyed element.
	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		match self {
			VNode::Text(_) => None,
			VNode::Element(element) => element.key(),
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			VNode::Text(_) => None,
			VNode::Element(element) => Some(element),
		}
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			VNode::Text(text) => Some(text),
			VNode::Element(_) => None,
		}
	}
}
impl From<Element> for VNode {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}
impl From<&str> for VNode {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl From<String> for VNode {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

/// An element description: tag, optional key, classified attributes and child nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
	tag: String,
	key: Option<Key>,
	attributes: Vec<Attribute>,
	children: Vec<VNode>,
}
impl Element {
	/// Tag names are lower-cased here, so `"LI"` and `"li"` describe the same element.
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		let mut tag = tag.into();
		tag.make_ascii_lowercase();
		Self {
			tag,
			key: None,
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Sets an attribute, replacing any earlier one with the same name.
	///
	/// The name `"key"` is reserved and routed to [`Element::keyed`] instead.
	#[must_use]
	pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
		let value = value.into();
		if name == "key" {
			return match value.to_attribute_string() {
				Some(key) => self.keyed(key),
				None => {
					warn!("Ignoring event handler given as `key` on <{}>.", self.tag);
					self
				}
			};
		}

		match Attribute::classify(&self.tag, name, value) {
			Some(attribute) => {
				match self.attributes.iter_mut().find(|existing| existing.name() == attribute.name()) {
					Some(existing) => *existing = attribute,
					None => self.attributes.push(attribute),
				}
				self
			}
			None => {
				warn!("Ignoring event handler on non-event attribute {:?} of <{}>.", name, self.tag);
				self
			}
		}
	}

	/// Shorthand for `attr("on…", handler)`.
	#[must_use]
	pub fn on(self, event: &str, handler: impl Fn(&dyn Any) + 'static) -> Self {
		let name = format!("on{}", event);
		self.attr(&name, EventHandler::new(handler))
	}

	#[must_use]
	pub fn keyed(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<VNode>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<VNode>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	#[must_use]
	pub fn attributes(&self) -> &[Attribute] {
		&self.attributes
	}

	#[must_use]
	pub fn child_nodes(&self) -> &[VNode] {
		&self.children
	}

	/// Same tag and same key (or both unkeyed). Attributes don't participate.
	#[must_use]
	pub fn is_compatible_with(&self, other: &Element) -> bool {
		self.tag == other.tag && self.key == other.key
	}
}

/// Identity hint matching an element against a previous sibling across reorders.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);
impl Key {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}
impl From<&str> for Key {
	fn from(key: &str) -> Self {
		Self(key.to_owned())
	}
}
impl From<String> for Key {
	fn from(key: String) -> Self {
		Self(key)
	}
}
macro_rules! key_from_integer {
	($($integer:ty),*) => {$(
		impl From<$integer> for Key {
			fn from(key: $integer) -> Self {
				Self(key.to_string())
			}
		}
	)*};
}
key_from_integer!(i32, i64, u32, u64, usize);

/// A callback installed as a live event-handler property.
///
/// The argument is whatever the host passes: a [`web_sys::Event`] for [`DomHost`](`crate::dom::DomHost`),
/// an arbitrary payload for [`MemoryHost`](`crate::memory::MemoryHost`).
///
/// Handlers compare by identity, so a tree cloned from the previous one doesn't reinstall any of them.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&dyn Any)>);
impl EventHandler {
	pub fn new(handler: impl Fn(&dyn Any) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}
}
impl PartialEq for EventHandler {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Debug for EventHandler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("EventHandler").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}

/// Untyped attribute input, classified into an [`Attribute`] by [`Element::attr`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Text(String),
	Bool(bool),
	Number(f64),
	Handler(EventHandler),
}
impl Value {
	/// Truthiness as a browser would coerce it.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Text(text) => !text.is_empty(),
			Value::Bool(value) => *value,
			Value::Number(number) => *number != 0.0 && !number.is_nan(),
			Value::Handler(_) => true,
		}
	}

	/// The declarative string form. Handlers have none.
	#[must_use]
	pub fn to_attribute_string(&self) -> Option<String> {
		match self {
			Value::Text(text) => Some(text.clone()),
			Value::Bool(value) => Some(value.to_string()),
			Value::Number(number) => Some(number.to_string()),
			Value::Handler(_) => None,
		}
	}
}
impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}
macro_rules! value_from_integer {
	($($integer:ty),*) => {$(
		impl From<$integer> for Value {
			fn from(number: $integer) -> Self {
				#[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
				Self::Number(number as f64)
			}
		}
	)*};
}
value_from_integer!(i32, i64, u32, u64, usize);
impl From<EventHandler> for Value {
	fn from(handler: EventHandler) -> Self {
		Self::Handler(handler)
	}
}

/// An attribute with its host-level kind already resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
	/// A live `on<type>` property holding a callback.
	EventHandler { property: String, handler: EventHandler },
	/// A live boolean property whose `false` state requires the declarative attribute to be absent.
	BooleanProperty { name: String, value: bool },
	/// The editable `value` of an input-like element, written to both property and attribute.
	ValueProperty { value: String },
	/// A plain declarative string attribute.
	Plain { name: String, value: String },
}
impl Attribute {
	/// Returns [`None`] for a handler on a name that isn't `on<type>`, which has no declarative representation.
	#[must_use]
	pub fn classify(tag: &str, name: &str, value: Value) -> Option<Self> {
		Some(match value {
			Value::Handler(handler) if is_event_property(name) => Attribute::EventHandler {
				property: name.to_owned(),
				handler,
			},
			Value::Handler(_) => return None,
			value if BOOLEAN_PROPERTIES.contains(&name) => Attribute::BooleanProperty {
				name: name.to_owned(),
				value: value.is_truthy(),
			},
			value if name == "value" && VALUE_PROPERTY_TAGS.contains(&tag) => Attribute::ValueProperty {
				value: value.to_attribute_string()?,
			},
			value => Attribute::Plain {
				name: name.to_owned(),
				value: value.to_attribute_string()?,
			},
		})
	}

	#[must_use]
	pub fn name(&self) -> &str {
		match self {
			Attribute::EventHandler { property, .. } => property,
			Attribute::BooleanProperty { name, .. } | Attribute::Plain { name, .. } => name,
			Attribute::ValueProperty { .. } => "value",
		}
	}

	#[must_use]
	pub fn same_kind(&self, other: &Attribute) -> bool {
		core::mem::discriminant(self) == core::mem::discriminant(other)
	}
}

pub(crate) fn is_event_property(name: &str) -> bool {
	name.len() > 2 && name.starts_with("on")
}
