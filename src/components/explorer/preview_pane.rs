//! Preview pane.
//!
//! Hosts the viewer for the engine's current [`PreviewRequest`] and the
//! gallery controls. Content decoding is left to the browser: the viewer
//! downloads the file with the session's credentials and links to the
//! resulting object URL.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_icons::Icon;
use sharenav_core::{Entry, PreviewRequest};

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::utils::format::{format_date, format_size};
use crate::utils::{fetch_object_url, preview_url, revoke_object_url};

stylance::import_crate_style!(css, "src/components/explorer/preview_pane.module.css");

#[derive(Clone, PartialEq)]
struct PreviewView {
    request: PreviewRequest,
    entry: Entry,
    has_previous: bool,
    has_next: bool,
}

#[component]
pub fn PreviewPane() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let preview = Memo::new(move |_| {
        ctx.read(|ex| {
            let state = ex.state().preview()?;
            Some(PreviewView {
                request: ex.preview_request()?,
                entry: state.entry().clone(),
                has_previous: state.has_previous(),
                has_next: state.has_next(),
            })
        })
        .flatten()
    });

    let on_close = Callback::new(move |_: ()| {
        if let Some(session) = ctx.session() {
            session.close_preview();
        }
    });
    let previous = move |_: leptos::ev::MouseEvent| {
        if let Some(session) = ctx.session() {
            session.previous_preview();
        }
    };
    let next = move |_: leptos::ev::MouseEvent| {
        if let Some(session) = ctx.session() {
            session.next_preview();
        }
    };

    view! {
        <aside class=css::pane aria-label="Preview">
            {move || preview.get().map(|p| {
                let counter = (p.request.gallery.len() > 1)
                    .then(|| format!("{} / {}", p.request.index + 1, p.request.gallery.len()));
                view! {
                    <header class=css::header>
                        <button
                            class=css::navButton
                            disabled={!p.has_previous}
                            title="Previous"
                            on:click=previous
                        >
                            <Icon icon=ic::CHEVRON_LEFT />
                        </button>
                        <span class=css::counter>{counter}</span>
                        <button
                            class=css::navButton
                            disabled={!p.has_next}
                            title="Next"
                            on:click=next
                        >
                            <Icon icon=ic::CHEVRON_RIGHT />
                        </button>
                        <button class=css::closeButton title="Close" on:click=move |_| on_close.run(())>
                            <Icon icon=ic::CLOSE />
                        </button>
                    </header>
                    <Viewer request=p.request entry=p.entry />
                }
            })}
        </aside>
    }
}

/// Metadata card with a link to the file content.
#[component]
fn Viewer(request: PreviewRequest, entry: Entry) -> impl IntoView {
    let icon = ic::for_entry(&entry);
    let content = RwSignal::new(None::<Result<String, String>>);

    let url = preview_url(&request.connection, &request.path);
    spawn_local(async move {
        let result = fetch_object_url(&url).await.map_err(|e| e.to_string());
        if let Err(message) = &result {
            log::warn!("preview of {} failed: {}", url, message);
        }
        // Viewer already replaced
        if let Some(Some(Ok(orphan))) = content.try_set(Some(result)) {
            revoke_object_url(&orphan);
        }
    });
    on_cleanup(move || {
        if let Some(Some(Ok(href))) = content.try_get_untracked() {
            revoke_object_url(&href);
        }
    });

    view! {
        <div class=css::viewer>
            <span class=css::bigIcon><Icon icon=icon /></span>
            <h2 class=css::title>{entry.name.clone()}</h2>
            <dl class=css::meta>
                <dt>"Size"</dt>
                <dd>{format_size(entry.size)}</dd>
                <dt>"Modified"</dt>
                <dd>{format_date(entry.modified)}</dd>
                {entry.mime_type.clone().map(|mime| view! {
                    <dt>"Type"</dt>
                    <dd>{mime}</dd>
                })}
            </dl>
            {move || match content.get() {
                None => view! {
                    <span class=css::pending>"Loading…"</span>
                }.into_any(),
                Some(Ok(href)) => view! {
                    <a class=css::openLink href=href target="_blank" rel="noopener">
                        <Icon icon=ic::EXTERNAL_LINK />
                        " Open"
                    </a>
                }.into_any(),
                Some(Err(message)) => view! {
                    <span class=css::unavailable title=message>
                        <Icon icon=ic::WARNING />
                        " Content unavailable"
                    </span>
                }.into_any(),
            }}
        </div>
    }
}
