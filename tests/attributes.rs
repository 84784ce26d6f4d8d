use std::{any::Any, cell::Cell, rc::Rc};
use twig_dom::{
	memory::{MemoryHost, Mutation, NodeId},
	Attribute, Element, EventHandler, HostTree, Key, Property, Reconciler, VNode,
};

/// Renders `first`, then patches it into `second`, returning the node and the mutations of the second pass.
fn patch(host: &mut MemoryHost, first: &Element, second: &Element) -> (NodeId, Vec<Mutation>) {
	let root = host.root();
	let reconciler = Reconciler::new();
	let first = VNode::from(first.clone());
	reconciler.reconcile(host, &root, Some(&first), None, 0).unwrap();
	let node = host.child_at(&root, 0).unwrap();
	host.take_mutations();
	reconciler.reconcile(host, &root, Some(&second.clone().into()), Some(&first), 0).unwrap();
	assert_eq!(host.child_at(&root, 0), Some(node));
	(node, host.take_mutations())
}

fn counter() -> (Rc<Cell<u32>>, EventHandler) {
	let count = Rc::new(Cell::new(0));
	let handler = EventHandler::new({
		let count = Rc::clone(&count);
		move |_: &dyn Any| count.set(count.get() + 1)
	});
	(count, handler)
}

#[test]
fn classification() {
	let (_, handler) = counter();
	let input = Element::new("input")
		.attr("type", "text")
		.attr("value", "draft")
		.attr("disabled", "")
		.attr("required", "yes")
		.attr("maxlength", 20)
		.attr("oninput", handler.clone())
		.attr("title", handler);
	assert!(matches!(
		input.attributes(),
		[
			Attribute::Plain { name: type_, value: text },
			Attribute::ValueProperty { value: draft },
			Attribute::BooleanProperty { name: disabled, value: false },
			Attribute::BooleanProperty { name: required, value: true },
			Attribute::Plain { name: maxlength, value: twenty },
			Attribute::EventHandler { property: oninput, .. },
		] if type_ == "type" && text == "text" && draft == "draft" && disabled == "disabled" && required == "required"
			&& maxlength == "maxlength" && twenty == "20" && oninput == "oninput"
	));

	let li = Element::new("li").attr("value", 3).attr("class", "a").attr("class", "b").attr("key", 7);
	assert_eq!(li.key(), Some(&Key::from(7)));
	assert_eq!(
		li.attributes(),
		&[
			Attribute::Plain {
				name: "value".to_owned(),
				value: "3".to_owned(),
			},
			Attribute::Plain {
				name: "class".to_owned(),
				value: "b".to_owned(),
			},
		]
	);
}

#[test]
fn boolean_round_trip() {
	let mut host = MemoryHost::new();
	let (node, mutations) = patch(&mut host, &Element::new("button").attr("disabled", true), &Element::new("button").attr("disabled", false));
	assert_eq!(
		mutations,
		vec![Mutation::SetProperty {
			node,
			name: "disabled".to_owned(),
			value: Some(Property::Bool(false)),
		}]
	);
	assert_eq!(host.attribute(&node, "disabled"), None);
	assert_eq!(host.property(&node, "disabled"), Some(Property::Bool(false)));
}

#[test]
fn checked_overrides_markup() {
	let mut host = MemoryHost::new();
	let root = host.root();
	let reconciler = Reconciler::new();
	let checked: VNode = Element::new("input").attr("type", "checkbox").attr("checked", true).into();
	reconciler.reconcile(&mut host, &root, Some(&checked), None, 0).unwrap();
	let node = host.child_at(&root, 0).unwrap();
	assert_eq!(host.property(&node, "checked"), Some(Property::Bool(true)));

	// As left by hand-written markup:
	host.set_attribute(&node, "checked", "").unwrap();
	host.take_mutations();

	let unchecked: VNode = Element::new("input").attr("type", "checkbox").attr("checked", false).into();
	reconciler.reconcile(&mut host, &root, Some(&unchecked), Some(&checked), 0).unwrap();
	assert_eq!(
		host.take_mutations(),
		vec![
			Mutation::SetProperty {
				node,
				name: "checked".to_owned(),
				value: Some(Property::Bool(false)),
			},
			Mutation::RemoveAttribute {
				node,
				name: "checked".to_owned(),
			},
		]
	);
	assert_eq!(host.to_html(root), "<body><input type=\"checkbox\"></input></body>");
}

#[test]
fn dropped_boolean_resets_property() {
	let mut host = MemoryHost::new();
	let (node, mutations) = patch(&mut host, &Element::new("details").attr("open", true), &Element::new("details"));
	assert_eq!(
		mutations,
		vec![Mutation::SetProperty {
			node,
			name: "open".to_owned(),
			value: Some(Property::Bool(false)),
		}]
	);
}

#[test]
fn value_property() {
	let mut host = MemoryHost::new();
	let (node, mutations) = patch(&mut host, &Element::new("textarea").attr("value", "a"), &Element::new("textarea").attr("value", "b"));
	assert_eq!(
		mutations,
		vec![
			Mutation::SetProperty {
				node,
				name: "value".to_owned(),
				value: Some(Property::Text("b".to_owned())),
			},
			Mutation::SetAttribute {
				node,
				name: "value".to_owned(),
				value: "b".to_owned(),
			},
		]
	);

	let (node, mutations) = patch(&mut MemoryHost::new(), &Element::new("input").attr("value", "a"), &Element::new("input"));
	assert_eq!(
		mutations,
		vec![
			Mutation::RemoveAttribute {
				node,
				name: "value".to_owned(),
			},
			Mutation::SetProperty {
				node,
				name: "value".to_owned(),
				value: Some(Property::Text(String::new())),
			},
		]
	);
}

#[test]
fn plain_attributes() {
	let mut host = MemoryHost::new();
	let root = host.root();
	let (node, mutations) = patch(
		&mut host,
		&Element::new("a").attr("href", "/").attr("class", "nav").attr("title", "Home"),
		&Element::new("a").attr("href", "/").attr("class", "nav active").attr("lang", "en"),
	);
	assert_eq!(
		mutations,
		vec![
			Mutation::RemoveAttribute {
				node,
				name: "title".to_owned(),
			},
			Mutation::SetAttribute {
				node,
				name: "class".to_owned(),
				value: "nav active".to_owned(),
			},
			Mutation::SetAttribute {
				node,
				name: "lang".to_owned(),
				value: "en".to_owned(),
			},
		]
	);
	assert_eq!(host.to_html(root), "<body><a href=\"/\" class=\"nav active\" lang=\"en\"></a></body>");
}

#[test]
fn reordered_attributes_are_silent() {
	let mut host = MemoryHost::new();
	let (_, mutations) = patch(
		&mut host,
		&Element::new("p").attr("id", "x").attr("class", "y").attr("hidden", true),
		&Element::new("p").attr("hidden", true).attr("class", "y").attr("id", "x"),
	);
	assert!(mutations.is_empty(), "{:?}", mutations);
}

#[test]
fn handler_replacement() {
	let mut host = MemoryHost::new();
	let (first_count, first) = counter();
	let (second_count, second) = counter();
	let (node, mutations) = patch(
		&mut host,
		&Element::new("button").attr("onclick", first),
		&Element::new("button").attr("onclick", second.clone()),
	);
	assert_eq!(
		mutations,
		vec![Mutation::SetProperty {
			node,
			name: "onclick".to_owned(),
			value: Some(Property::Handler(second)),
		}]
	);

	assert!(host.fire(node, "click", &()));
	assert_eq!(first_count.get(), 0);
	assert_eq!(second_count.get(), 1);
}

#[test]
fn handler_removal() {
	let mut host = MemoryHost::new();
	let (count, handler) = counter();
	let (node, mutations) = patch(&mut host, &Element::new("div").attr("onclick", handler), &Element::new("div"));
	assert_eq!(
		mutations,
		vec![Mutation::SetProperty {
			node,
			name: "onclick".to_owned(),
			value: None,
		}]
	);
	assert!(!host.fire(node, "click", &()));
	assert_eq!(count.get(), 0);
}

#[test]
fn kind_change_removes_first() {
	let mut host = MemoryHost::new();
	let (count, handler) = counter();
	let (node, mutations) = patch(
		&mut host,
		&Element::new("div").attr("onclick", handler),
		&Element::new("div").attr("onclick", "alert(1)"),
	);
	assert_eq!(
		mutations,
		vec![
			Mutation::SetProperty {
				node,
				name: "onclick".to_owned(),
				value: None,
			},
			Mutation::SetAttribute {
				node,
				name: "onclick".to_owned(),
				value: "alert(1)".to_owned(),
			},
		]
	);
	assert!(!host.fire(node, "click", &()));
	assert_eq!(count.get(), 0);
}

#[test]
fn direct_patch() {
	let mut host = MemoryHost::new();
	let node = host.create_element("span").unwrap();
	let styled = Element::new("span").attr("style", "color: red");
	Reconciler::new().patch_attributes(&mut host, &node, styled.attributes(), &[]).unwrap();
	assert_eq!(host.attribute(&node, "style").as_deref(), Some("color: red"));

	Reconciler::new().patch_attributes(&mut host, &node, &[], styled.attributes()).unwrap();
	assert_eq!(host.attribute(&node, "style"), None);
}
