use crate::{
	error::HostError,
	host::{HostTree, Property},
	loggable,
	vnode::Attribute,
};
use hashbrown::HashMap;
use tracing::{instrument, trace, trace_span};

/// Applies the difference between two attribute lists to one host element.
///
/// Removals (including attributes whose kind changed) happen before any additions,
/// so no handler or property state of the previous kind survives.
pub(crate) fn patch_attributes<H: HostTree>(host: &mut H, node: &H::Node, mut a_1: &[Attribute], mut a_2: &[Attribute]) -> Result<(), HostError> {
	while !a_1.is_empty() && a_1.first() == a_2.first() {
		a_1 = &a_1[1..];
		a_2 = &a_2[1..];
	}
	while !a_1.is_empty() && a_1.last() == a_2.last() {
		a_1 = &a_1[..a_1.len() - 1];
		a_2 = &a_2[..a_2.len() - 1];
	}
	if a_1.is_empty() && a_2.is_empty() {
		return Ok(());
	}

	let span = trace_span!("Patching attributes", "a_1.len()" = a_1.len(), "a_2.len()" = a_2.len());
	let _enter = span.enter();

	let next: HashMap<&str, &Attribute> = a_2.iter().map(|attribute| (attribute.name(), attribute)).collect();
	for removed in a_1 {
		match next.get(removed.name()) {
			Some(kept) if kept.same_kind(removed) => (),
			_ => remove_attribute(host, node, removed)?,
		}
	}

	let previous: HashMap<&str, &Attribute> = a_1.iter().map(|attribute| (attribute.name(), attribute)).collect();
	for added in a_2 {
		if previous.get(added.name()) == Some(&added) {
			continue;
		}
		add_attribute(host, node, added)?;
	}
	Ok(())
}

#[instrument(skip(host, attribute), fields(name = attribute.name()))]
fn remove_attribute<H: HostTree>(host: &mut H, node: &H::Node, attribute: &Attribute) -> Result<(), HostError> {
	match attribute {
		Attribute::EventHandler { property, .. } => host.set_property(node, property, None),
		Attribute::BooleanProperty { name, .. } => {
			remove_present_attribute(host, node, name)?;
			host.set_property(node, name, Some(Property::Bool(false)))
		}
		Attribute::ValueProperty { .. } => {
			remove_present_attribute(host, node, "value")?;
			host.set_property(node, "value", Some(Property::Text(String::new())))
		}
		Attribute::Plain { name, .. } => remove_present_attribute(host, node, name),
	}
}

#[instrument(skip(host, attribute), fields(name = attribute.name()))]
fn add_attribute<H: HostTree>(host: &mut H, node: &H::Node, attribute: &Attribute) -> Result<(), HostError> {
	match attribute {
		Attribute::EventHandler { property, handler } => host.set_property(node, property, Some(Property::Handler(handler.clone()))),
		Attribute::BooleanProperty { name, value } => {
			host.set_property(node, name, Some(Property::Bool(*value)))?;
			if !value {
				remove_present_attribute(host, node, name)?;
			}
			Ok(())
		}
		Attribute::ValueProperty { value } => {
			trace!("Setting value {:?}", loggable(value));
			host.set_property(node, "value", Some(Property::Text(value.clone())))?;
			host.set_attribute(node, "value", value)
		}
		Attribute::Plain { name, value } => {
			trace!("Setting {}={:?}", name, loggable(value));
			host.set_attribute(node, name, value)
		}
	}
}

fn remove_present_attribute<H: HostTree>(host: &mut H, node: &H::Node, name: &str) -> Result<(), HostError> {
	if host.attribute(node, name).is_some() {
		host.remove_attribute(node, name)
	} else {
		trace!("Attribute {:?} already absent.", name);
		Ok(())
	}
}
