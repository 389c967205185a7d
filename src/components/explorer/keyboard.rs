//! Window-level keyboard bindings for the explorer.

use sharenav_core::{Dispatch, KeyInput, Modifiers};
use wasm_bindgen::prelude::Closure;
use web_sys::KeyboardEvent;

use crate::app::AppContext;
use crate::utils::dom;

/// Translate a DOM key event for the dispatcher.
fn key_input(event: &KeyboardEvent) -> KeyInput {
    let input = KeyInput::new(event.key()).with_modifiers(Modifiers {
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        shift: event.shift_key(),
        meta: event.meta_key(),
    });
    if dom::is_text_input_focused() {
        input.in_text_input()
    } else {
        input
    }
}

/// Install the keydown listener for the lifetime of the app.
pub fn install_keyboard(ctx: AppContext) {
    use wasm_bindgen::JsCast;

    let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        let Some(session) = ctx.session() else {
            return;
        };
        if session.dispatch_key(&key_input(&event)) == Dispatch::Handled {
            event.prevent_default();
        }
    }) as Box<dyn FnMut(KeyboardEvent)>);

    if let Some(window) = dom::window() {
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
    }

    // Keep the closure alive for the lifetime of the app
    closure.forget();
}
