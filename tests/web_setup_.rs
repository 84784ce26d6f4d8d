#![cfg(target_arch = "wasm32")]
#![allow(dead_code)]

use std::sync::Once;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlBodyElement};

static LOG_INITIALIZED: Once = Once::new();

pub fn document() -> Document {
	window().unwrap().document().unwrap()
}

/// Installs logging once, then appends a fresh `<div>` to the body so tests don't see each other's nodes.
pub fn container() -> web_sys::Node {
	LOG_INITIALIZED.call_once(tracing_wasm::set_as_global_default);

	let document = document();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let container = document.create_element("div").unwrap();
	body.append_child(&container).unwrap();
	container.into()
}
