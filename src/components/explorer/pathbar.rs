//! Path bar component.
//!
//! Displays the current path with clickable ancestor segments.

use leptos::prelude::*;
use leptos_icons::Icon;
use sharenav_core::RemotePath;

use crate::app::AppContext;
use crate::components::icons as ic;

stylance::import_crate_style!(css, "src/components/explorer/pathbar.module.css");

/// Path bar component displayed above the listing.
#[component]
pub fn PathBar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let path = Memo::new(move |_| ctx.read(|ex| ex.path().clone()).unwrap_or_default());
    let refreshing = Signal::derive(move || {
        ctx.read(|ex| ex.phase().is_loading() || ex.current().is_some_and(|c| c.refreshing))
            .unwrap_or(false)
    });

    let refresh = move |_: leptos::ev::MouseEvent| {
        if let Some(session) = ctx.session() {
            session.refresh();
        }
    };

    view! {
        <nav class=css::pathbar aria-label="Path">
            {move || {
                let current = path.get();
                current
                    .ancestors()
                    .into_iter()
                    .map(|segment| {
                        let is_root = segment.is_root();
                        let label = segment.name().unwrap_or("/").to_string();
                        let icon = if is_root { ic::HOME } else { ic::FOLDER };
                        let separator = (!is_root).then(|| view! {
                            <span class=css::separator><Icon icon=ic::CHEVRON_RIGHT /></span>
                        });
                        let button = if segment == current {
                            view! { <SegmentCurrent icon=icon label=label /> }.into_any()
                        } else {
                            view! { <SegmentLink icon=icon label=label target=segment /> }
                                .into_any()
                        };
                        view! { {separator} {button} }
                    })
                    .collect_view()
            }}
            <button
                class=move || {
                    if refreshing.get() {
                        format!("{} {}", css::refresh, css::refreshSpinning)
                    } else {
                        css::refresh.to_string()
                    }
                }
                title="Refresh"
                on:click=refresh
            >
                <Icon icon=ic::REFRESH />
            </button>
        </nav>
    }
}

/// Clickable path segment.
#[component]
fn SegmentLink(icon: icondata::Icon, label: String, target: RemotePath) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    view! {
        <button
            class=css::segment
            on:click=move |_| {
                if let Some(session) = ctx.session() {
                    session.navigate_to(&target);
                }
            }
        >
            <span class=css::icon><Icon icon=icon /></span>
            <span class=css::label>{label}</span>
        </button>
    }
}

/// Current (disabled) path segment.
#[component]
fn SegmentCurrent(icon: icondata::Icon, label: String) -> impl IntoView {
    view! {
        <button class=format!("{} {}", css::segment, css::segmentCurrent) disabled=true>
            <span class=css::icon><Icon icon=icon /></span>
            <span class=css::label>{label}</span>
        </button>
    }
}
