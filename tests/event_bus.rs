use std::{cell::RefCell, rc::Rc};
use twig_dom::{EventBus, Subscription};

fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&u32)>) {
	let log = Rc::new(RefCell::new(Vec::new()));
	let make = {
		let log = Rc::clone(&log);
		move |name: &str| -> Box<dyn Fn(&u32)> {
			let log = Rc::clone(&log);
			let name = name.to_owned();
			Box::new(move |payload: &u32| log.borrow_mut().push(format!("{}:{}", name, payload)))
		}
	};
	(log, make)
}

#[test]
fn subscription_order() {
	let bus = EventBus::<u32>::new();
	let (log, make) = recorder();
	let _a = bus.subscribe("toggle", make("a"));
	let _b = bus.subscribe("toggle", make("b"));
	let _other = bus.subscribe("remove", make("other"));

	assert_eq!(bus.dispatch("toggle", &7), 2);
	assert_eq!(*log.borrow(), ["a:7", "b:7"]);
	assert_eq!(bus.dispatch("nobody", &0), 0);
}

#[test]
fn unsubscribe() {
	let bus = EventBus::<u32>::new();
	let (log, make) = recorder();
	let a = bus.subscribe("toggle", make("a"));
	let b = bus.subscribe("toggle", make("b"));

	assert!(bus.unsubscribe(&a));
	assert!(!bus.unsubscribe(&a));
	bus.dispatch("toggle", &1);
	assert_eq!(*log.borrow(), ["b:1"]);

	assert_eq!(b.event(), "toggle");
	assert!(b.unsubscribe());
	assert!(!bus.has_subscribers("toggle"));
	assert_eq!(bus.dispatch("toggle", &2), 0);
}

#[test]
fn foreign_subscription() {
	let bus = EventBus::<u32>::new();
	let other = EventBus::<u32>::new();
	let subscription = other.subscribe("x", |_| ());
	assert!(!bus.unsubscribe(&subscription));
	assert!(other.has_subscribers("x"));
}

#[test]
fn clones_share_subscribers() {
	let bus = EventBus::<u32>::new();
	let (log, make) = recorder();
	let _a = bus.clone().subscribe("edit", make("a"));
	assert_eq!(bus.dispatch("edit", &3), 1);
	assert_eq!(*log.borrow(), ["a:3"]);
}

#[test]
fn clear() {
	let bus = EventBus::<u32>::new();
	let (_, make) = recorder();
	let _a = bus.subscribe("a", make("a"));
	let _b = bus.subscribe("b", make("b"));

	bus.clear_event("a");
	assert!(!bus.has_subscribers("a"));
	assert!(bus.has_subscribers("b"));

	bus.clear();
	assert!(!bus.has_subscribers("b"));
}

#[test]
fn subscription_outlives_bus() {
	let bus = EventBus::<u32>::new();
	let subscription = bus.subscribe("a", |_| ());
	drop(bus);
	assert!(!subscription.unsubscribe());
}

#[test]
fn reentrant_dispatch() {
	let bus = EventBus::<u32>::new();
	let (log, make) = recorder();
	let _inner = bus.subscribe("inner", make("inner"));
	let _outer = bus.subscribe("outer", {
		let bus = bus.clone();
		move |payload| {
			bus.dispatch("inner", &(payload + 1));
		}
	});
	let _after = bus.subscribe("outer", make("after"));

	bus.dispatch("outer", &1);
	assert_eq!(*log.borrow(), ["inner:2", "after:1"]);
}

#[test]
fn subscribing_during_dispatch() {
	let bus = EventBus::<u32>::new();
	let (log, make) = recorder();
	let make = Rc::new(make);
	let _spawner = bus.subscribe("tick", {
		let bus = bus.clone();
		let make = Rc::clone(&make);
		move |payload| {
			// The subscription lives until the bus is cleared.
			let _ = bus.subscribe("tick", make(&format!("late{}", payload)));
		}
	});

	assert_eq!(bus.dispatch("tick", &1), 1);
	assert!(log.borrow().is_empty());
	assert_eq!(bus.dispatch("tick", &2), 2);
	assert_eq!(*log.borrow(), ["late1:2"]);
}

#[test]
fn unsubscribing_during_dispatch() {
	let bus = EventBus::<u32>::new();
	let (log, make) = recorder();
	let victim = Rc::new(RefCell::new(None::<Subscription<u32>>));
	let _killer = bus.subscribe("go", {
		let bus = bus.clone();
		let victim = Rc::clone(&victim);
		move |_| {
			if let Some(subscription) = victim.borrow_mut().take() {
				assert!(bus.unsubscribe(&subscription));
			}
		}
	});
	*victim.borrow_mut() = Some(bus.subscribe("go", make("victim")));

	// Already captured for this dispatch:
	assert_eq!(bus.dispatch("go", &1), 2);
	assert_eq!(*log.borrow(), ["victim:1"]);
	assert_eq!(bus.dispatch("go", &2), 1);
	assert_eq!(*log.borrow(), ["victim:1"]);
}
