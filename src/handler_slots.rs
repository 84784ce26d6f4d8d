use crate::vnode::EventHandler;
use core::cell::RefCell;
use hashbrown::HashMap;
use js_sys::{Function, Reflect};
use std::rc::Rc;
use tracing::{info, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// Event handler properties installed on DOM elements.
///
/// Every installed `on<type>` property is the same `common_handler` bound to a numeric slot id,
/// which is resolved to the slot's current [`EventHandler`] when the event fires.
/// A slot that was replaced or collected in the meantime is reported and ignored rather than called.
pub(crate) struct HandlerSlots {
	table: Rc<RefCell<SlotTable>>,
	common_handler: Closure<dyn Fn(JsValue, web_sys::Event)>,
}

#[derive(Default)]
struct SlotTable {
	next_id: u32,
	slots: HashMap<u32, Slot>,
}

struct Slot {
	element: web_sys::Element,
	property: String,
	handler: EventHandler,
	function: Function,
}

impl HandlerSlots {
	pub fn new() -> Self {
		let table = Rc::new(RefCell::new(SlotTable::default()));
		let common_table = Rc::clone(&table);
		Self {
			table,
			common_handler: Closure::wrap(Box::new(move |slot: JsValue, event: web_sys::Event| {
				let span = trace_span!("common_handler", ?slot, event = ?event.type_());
				let _enter = span.enter();

				// The borrow must end before the handler runs, since it may re-render.
				#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
				let handler = slot.as_f64().and_then(|id| common_table.borrow().slots.get(&(id as u32)).map(|slot| slot.handler.clone()));
				match handler {
					Some(handler) => handler.call(&event),
					None => warn!("Stale event handler slot {:?} fired. Ignoring.", slot),
				}
			}) as Box<dyn Fn(JsValue, web_sys::Event)>),
		}
	}

	/// Installs `handler` as `element[property]`, replacing whatever this registry installed there before.
	pub fn install(&self, element: &web_sys::Element, property: &str, handler: EventHandler) -> Result<(), JsValue> {
		self.release(element, property);

		let mut table = self.table.borrow_mut();
		let id = table.next_id;
		table.next_id = table.next_id.wrapping_add(1);

		let function = self.common_handler.as_ref().unchecked_ref::<Function>().bind1(&JsValue::UNDEFINED, &JsValue::from(id));
		Reflect::set(element, &JsValue::from_str(property), &function)?;
		trace!("Installed {} in slot {}.", property, id);
		table.slots.insert(
			id,
			Slot {
				element: element.clone(),
				property: property.to_owned(),
				handler,
				function,
			},
		);
		Ok(())
	}

	pub fn uninstall(&self, element: &web_sys::Element, property: &str) -> Result<(), JsValue> {
		self.release(element, property);
		Reflect::set(element, &JsValue::from_str(property), &JsValue::NULL)?;
		Ok(())
	}

	/// The handler currently installed as `element[property]`, if this registry installed it.
	pub fn lookup(&self, element: &web_sys::Element, property: &str) -> Option<EventHandler> {
		let current = Reflect::get(element, &JsValue::from_str(property)).ok()?;
		let table = self.table.borrow();
		table
			.slots
			.values()
			.find(|slot| slot.element == *element && slot.property == property && JsValue::from(slot.function.clone()) == current)
			.map(|slot| slot.handler.clone())
	}

	/// Frees the slots of elements no longer inside `root`, and of properties overwritten from outside.
	pub fn collect_garbage(&self, root: &web_sys::Node) {
		let mut table = self.table.borrow_mut();
		let before = table.slots.len();
		table.slots.retain(|_, slot| {
			let installed = Reflect::get(&slot.element, &JsValue::from_str(&slot.property)).map_or(false, |current| current == JsValue::from(slot.function.clone()));
			installed && root.contains(Some(slot.element.as_ref()))
		});
		trace!("Freed {} event handler slot(s).", before - table.slots.len());
		info!("Event handler slot count/capacity: {}/{}", table.slots.len(), table.slots.capacity());
	}

	fn release(&self, element: &web_sys::Element, property: &str) {
		self.table.borrow_mut().slots.retain(|_, slot| !(slot.element == *element && slot.property == property));
	}
}
