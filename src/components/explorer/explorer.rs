//! Main explorer component.
//!
//! The file explorer view with path bar, error banner, file list and
//! preview pane.
//!
//! ## Layout
//!
//! - **Desktop (> 768px)**: file list on the left, preview on the right
//! - **Mobile (< 768px)**: preview covers the list

use leptos::prelude::*;
use leptos_icons::Icon;
use sharenav_core::ExplorerError;

use super::{FileList, PathBar, PreviewPane};
use crate::app::AppContext;
use crate::components::icons as ic;

stylance::import_crate_style!(css, "src/components/explorer/explorer.module.css");

/// File explorer view component.
#[component]
pub fn Explorer() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let previewing =
        Signal::derive(move || ctx.read(|ex| ex.state().preview().is_some()).unwrap_or(false));
    let loading = Signal::derive(move || ctx.read(|ex| ex.phase().is_loading()).unwrap_or(false));

    view! {
        <div class=css::explorer aria-busy=move || loading.get().to_string()>
            <PathBar />
            <ErrorBanner />

            <div class=css::body>
                <div class=move || {
                    if previewing.get() {
                        format!("{} {}", css::fileListPane, css::fileListPaneWithPreview)
                    } else {
                        css::fileListPane.to_string()
                    }
                }>
                    <FileList />
                </div>

                <Show when=move || previewing.get()>
                    <PreviewPane />
                </Show>
            </div>
        </div>
    }
}

/// Error phase message. Remote failures offer a retry; permission and path
/// errors are terminal.
#[component]
fn ErrorBanner() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let error = Signal::derive(move || ctx.read(|ex| ex.phase().error().cloned()).flatten());

    let retry = move |_: leptos::ev::MouseEvent| {
        if let Some(session) = ctx.session() {
            session.retry();
        }
    };

    view! {
        {move || error.get().map(|error| {
            let retryable = error.is_retryable();
            let class = if error.is_terminal() {
                format!("{} {}", css::banner, css::bannerTerminal)
            } else {
                css::banner.to_string()
            };
            view! {
                <div class=class role="alert">
                    <span class=css::bannerIcon><Icon icon=ic::WARNING /></span>
                    <span class=css::bannerText>{describe(&error)}</span>
                    {retryable.then(|| view! {
                        <button class=css::bannerButton on:click=retry>
                            <Icon icon=ic::REFRESH />
                            " Retry"
                        </button>
                    })}
                </div>
            }
        })}
    }
}

fn describe(error: &ExplorerError) -> String {
    match error {
        ExplorerError::PermissionDenied(_) => "You do not have access to this folder.".to_string(),
        ExplorerError::NotFound(_) => "This folder no longer exists.".to_string(),
        ExplorerError::InvalidPath(e) => format!("Invalid location: {}", e),
        other => other.to_string(),
    }
}
