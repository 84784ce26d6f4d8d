#![doc(html_root_url = "https://docs.rs/twig-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod app;
mod attributes;
pub mod diff;
pub mod dom;
pub mod error;
pub mod event_bus;
mod handler_slots;
pub mod host;
pub mod load;
pub mod memory;
pub mod vnode;

pub use app::{RenderLoop, State};
pub use diff::{is_changed, Reconciler};
pub use error::{HostError, MalformedTree, ReconcileError};
pub use event_bus::{EventBus, Subscription};
pub use host::{HostTree, Property};
pub use vnode::{Attribute, Element, EventHandler, Key, VNode, Value};

/// Page content only makes it into log fields with the `dangerous-logging` feature.
pub(crate) fn loggable(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"<redacted>"
	}
}
