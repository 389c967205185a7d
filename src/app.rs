//! Root application module.
//!
//! Contains the main App component and the AppContext definition.

use std::rc::Rc;

use leptos::prelude::*;
use sharenav_core::{ConnectionId, Explorer};

use crate::components::AppRouter;
use crate::core::Session;
use crate::models::Route;
use crate::utils::{WebSocketTransport, dom};

stylance::import_crate_style!(css, "src/app.module.css");

// ============================================================================
// AppContext
// ============================================================================

/// Application-wide reactive context.
///
/// Provided at the root of the component tree and available from any child
/// through `use_context::<AppContext>()`.
///
/// # Note
///
/// This struct is `Copy`: the signals are arena handles and the session is
/// held in a local [`StoredValue`], since the engine is `Rc`-shared and not
/// `Send`.
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Location parsed from the URL hash.
    pub route: RwSignal<Route>,
    /// Engine change counter; see [`Session::with`].
    pub revision: RwSignal<u64>,
    /// Last session startup failure, shown instead of the explorer.
    pub startup_error: RwSignal<Option<String>>,
    session: StoredValue<Option<Rc<Session>>, LocalStorage>,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            route: RwSignal::new(Route::current()),
            revision: RwSignal::new(0),
            startup_error: RwSignal::new(None),
            session: StoredValue::new_local(None),
        }
    }

    /// The running session, if a connection has been opened.
    pub fn session(&self) -> Option<Rc<Session>> {
        self.session.get_value()
    }

    /// Read the engine, tracking engine changes. `None` before the first
    /// connection is opened.
    pub fn read<R>(&self, f: impl FnOnce(&Explorer<WebSocketTransport>) -> R) -> Option<R> {
        self.revision.track();
        self.session().map(|session| session.with(f))
    }

    /// Session for `connection`, started on first use.
    pub fn ensure_session(&self, connection: &ConnectionId) -> Option<Rc<Session>> {
        if let Some(session) = self.session() {
            return Some(session);
        }
        match Session::start(connection.clone(), self.revision) {
            Ok(session) => {
                self.session.set_value(Some(session.clone()));
                self.startup_error.set(None);
                Some(session)
            }
            Err(e) => {
                log::error!("cannot start session: {}", e);
                self.startup_error.set(Some(e.to_string()));
                None
            }
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Root component: provides [`AppContext`] and renders the router inside an
/// error boundary.
#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext::new();
    provide_context(ctx);

    view! {
        <ErrorBoundary
            fallback=|errors| view! {
                <div class=css::crash role="alert">
                    <h1>"The explorer hit an unexpected error"</h1>
                    <ul class=css::crashErrors>
                        {move || errors.get()
                            .into_iter()
                            .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                            .collect::<Vec<_>>()
                        }
                    </ul>
                    <button
                        class=css::reload
                        on:click=move |_| {
                            if let Some(window) = dom::window() {
                                let _ = window.location().reload();
                            }
                        }
                    >
                        "Reload"
                    </button>
                </div>
            }
        >
            <AppRouter />
        </ErrorBoundary>
    }
}
