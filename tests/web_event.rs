#![cfg(target_arch = "wasm32")]

use js_sys::{Function, Reflect};
use std::{cell::RefCell, rc::Rc};
use twig_dom::{dom::DomHost, Element, EventBus, HostTree, Reconciler, VNode};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

mod web_setup_;

fn button(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> VNode {
	let log = Rc::clone(log);
	Element::new("button")
		.on("click", move |event| {
			event.downcast_ref::<web_sys::Event>().expect("Expected Event but received something else.");
			log.borrow_mut().push(name);
		})
		.child("Click me")
		.into()
}

fn click(host: &DomHost, container: &web_sys::Node) {
	host.child_at(container, 0).unwrap().dyn_into::<HtmlElement>().unwrap().click();
}

#[wasm_bindgen_test]
fn click_replace_remove() {
	let container = web_setup_::container();
	let mut host = DomHost::for_node(&container).unwrap();
	let reconciler = Reconciler::new();
	let log = Rc::new(RefCell::new(Vec::new()));

	let first = button(&log, "first");
	reconciler.reconcile(&mut host, &container, Some(&first), None, 0).unwrap();
	assert!(log.borrow().is_empty());
	click(&host, &container);
	assert_eq!(*log.borrow(), ["first"]);

	let installed: Function = Reflect::get(&host.child_at(&container, 0).unwrap(), &JsValue::from_str("onclick")).unwrap().dyn_into().unwrap();

	let second = button(&log, "second");
	reconciler.reconcile(&mut host, &container, Some(&second), Some(&first), 0).unwrap();
	host.settle(&container);
	click(&host, &container);
	assert_eq!(*log.borrow(), ["first", "second"]);

	// A stale copy of the first installation is ignored:
	let event = web_sys::Event::new("click").unwrap();
	installed.call1(&JsValue::UNDEFINED, &event).unwrap();
	assert_eq!(*log.borrow(), ["first", "second"]);

	let plain: VNode = Element::new("button").child("Click me").into();
	reconciler.reconcile(&mut host, &container, Some(&plain), Some(&second), 0).unwrap();
	host.settle(&container);
	click(&host, &container);
	assert_eq!(*log.borrow(), ["first", "second"]);
}

#[wasm_bindgen_test]
fn dispatch_through_bus() {
	let container = web_setup_::container();
	let mut host = DomHost::for_node(&container).unwrap();
	let bus = EventBus::<u32>::new();
	let received = Rc::new(RefCell::new(Vec::new()));
	let _subscription = bus.subscribe("remove", {
		let received = Rc::clone(&received);
		move |id| received.borrow_mut().push(*id)
	});

	let vdom: VNode = Element::new("button")
		.keyed(42)
		.on("click", {
			let bus = bus.clone();
			move |_| {
				bus.dispatch("remove", &42);
			}
		})
		.into();
	Reconciler::new().reconcile(&mut host, &container, Some(&vdom), None, 0).unwrap();
	click(&host, &container);
	assert_eq!(*received.borrow(), [42]);
}
