//! Application router component.
//!
//! Handles hash routing with native hashchange events.
//!
//! # Architecture
//!
//! - **URL hash is the source of truth**: location is derived from
//!   `#/<connection>/<path>`
//! - **One session per app**: the first browse route starts it; later routes
//!   reuse it, switching connection when the route names another one
//! - **hashchange events**: browser back/forward buttons work automatically

use leptos::prelude::*;
use wasm_bindgen::prelude::Closure;

use crate::app::AppContext;
use crate::components::explorer::{Explorer, install_keyboard};
use crate::components::status::Status;
use crate::models::Route;

stylance::import_crate_style!(css, "src/components/router.module.css");

/// Main application router.
///
/// - `#/` → connection prompt
/// - `#/<connection>/<path>` → explorer at that location
#[component]
pub fn AppRouter() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let route = ctx.route;

    // Set up hashchange event listener (runs once on mount)
    {
        use wasm_bindgen::JsCast;
        let closure = Closure::wrap(Box::new(move || {
            route.set(Route::current());
        }) as Box<dyn Fn()>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref());
        }

        // Keep the closure alive for the lifetime of the app
        closure.forget();
    }

    install_keyboard(ctx);

    // Drive the session from the route
    Effect::new(move |_| {
        if let Route::Browse {
            connection,
            raw_path,
        } = route.get()
            && let Some(session) = ctx.ensure_session(&connection)
        {
            session.open_route(connection, raw_path);
        }
    });

    let browsing = Signal::derive(move || matches!(route.get(), Route::Browse { .. }));

    view! {
        <div class=css::layout>
            <Status />
            <main class=css::main>
                <Show
                    when=move || browsing.get()
                    fallback=|| view! {
                        <div class=css::placeholder>
                            "No connection selected. Open a link of the form #/<connection-id>/<path>."
                        </div>
                    }
                >
                    {move || match ctx.startup_error.get() {
                        Some(error) => view! {
                            <div class=css::placeholder>{error}</div>
                        }.into_any(),
                        None => view! { <Explorer /> }.into_any(),
                    }}
                </Show>
            </main>
        </div>
    }
}
