//! Named publish/subscribe channels for UI events.
//!
//! An [`EventBus`] is an ordinary value: whoever composes the application creates one and hands out clones.
//! Per-item handlers should dispatch an identifier (for example the item's key) as payload
//! instead of capturing the item itself.

use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use tracing::{instrument, trace, trace_span};

type Callback<P> = Rc<dyn Fn(&P)>;

/// Cloneable handle to a shared subscriber registry.
pub struct EventBus<P> {
	registry: Rc<RefCell<Registry<P>>>,
}

struct Registry<P> {
	next_id: u64,
	listeners: HashMap<String, Vec<(u64, Callback<P>)>>,
}

/// Returned by [`EventBus::subscribe`]. Dropping it does *not* unsubscribe.
#[must_use = "Without the `Subscription`, the callback can only be removed with `clear_event` or `clear`."]
pub struct Subscription<P> {
	event: String,
	id: u64,
	registry: Weak<RefCell<Registry<P>>>,
}

impl<P> Clone for EventBus<P> {
	fn clone(&self) -> Self {
		Self {
			registry: Rc::clone(&self.registry),
		}
	}
}
impl<P> Default for EventBus<P> {
	fn default() -> Self {
		Self::new()
	}
}
impl<P> Debug for EventBus<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let registry = self.registry.borrow();
		f.debug_struct("EventBus")
			.field("events", &registry.listeners.len())
			.field("subscribers", &registry.listeners.values().map(Vec::len).sum::<usize>())
			.finish()
	}
}
impl<P> Debug for Subscription<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("event", &self.event).field("id", &self.id).finish()
	}
}

impl<P> EventBus<P> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			registry: Rc::new(RefCell::new(Registry {
				next_id: 0,
				listeners: HashMap::new(),
			})),
		}
	}

	#[instrument(skip(self, callback))]
	pub fn subscribe(&self, event: &str, callback: impl Fn(&P) + 'static) -> Subscription<P> {
		let callback: Callback<P> = Rc::new(callback);
		let mut registry = self.registry.borrow_mut();
		let id = registry.next_id;
		registry.next_id += 1;
		registry.listeners.entry(event.to_owned()).or_default().push((id, callback));
		Subscription {
			event: event.to_owned(),
			id,
			registry: Rc::downgrade(&self.registry),
		}
	}

	/// Returns whether the subscription was still active.
	pub fn unsubscribe(&self, subscription: &Subscription<P>) -> bool {
		if !Weak::ptr_eq(&subscription.registry, &Rc::downgrade(&self.registry)) {
			trace!("Subscription belongs to a different bus.");
			return false;
		}
		remove(&self.registry, &subscription.event, subscription.id)
	}

	/// Synchronously calls every subscriber of `event`, in subscription order. Returns how many were called.
	///
	/// The subscriber list is captured up front: callbacks may subscribe, unsubscribe or dispatch further events,
	/// but subscribers added during this dispatch are first called by the next one.
	pub fn dispatch(&self, event: &str, payload: &P) -> usize {
		let span = trace_span!("Dispatching", event);
		let _enter = span.enter();

		let callbacks: Vec<Callback<P>> = match self.registry.borrow().listeners.get(event) {
			Some(listeners) => listeners.iter().map(|(_, callback)| Rc::clone(callback)).collect(),
			None => {
				trace!("No subscribers.");
				return 0;
			}
		};
		for callback in &callbacks {
			callback(payload);
		}
		callbacks.len()
	}

	#[must_use]
	pub fn has_subscribers(&self, event: &str) -> bool {
		self.registry.borrow().listeners.get(event).map_or(false, |listeners| !listeners.is_empty())
	}

	/// Removes all subscribers of `event`.
	pub fn clear_event(&self, event: &str) {
		self.registry.borrow_mut().listeners.remove(event);
	}

	/// Removes all subscribers.
	pub fn clear(&self) {
		self.registry.borrow_mut().listeners.clear();
	}
}

impl<P> Subscription<P> {
	#[must_use]
	pub fn event(&self) -> &str {
		&self.event
	}

	/// Returns whether the subscription was still active. Does nothing once the bus is gone.
	pub fn unsubscribe(self) -> bool {
		match self.registry.upgrade() {
			Some(registry) => remove(&registry, &self.event, self.id),
			None => false,
		}
	}
}

fn remove<P>(registry: &RefCell<Registry<P>>, event: &str, id: u64) -> bool {
	let mut registry = registry.borrow_mut();
	let Some(listeners) = registry.listeners.get_mut(event) else { return false };
	let before = listeners.len();
	listeners.retain(|(listener_id, _)| *listener_id != id);
	let removed = listeners.len() != before;
	if listeners.is_empty() {
		registry.listeners.remove(event);
	}
	removed
}
