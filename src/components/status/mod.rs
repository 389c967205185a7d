//! Status bar component.
//!
//! Displays the application name, current location and live-update state.

use leptos::prelude::*;
use leptos_icons::Icon;
use sharenav_core::ChannelState;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::config::APP_NAME;

stylance::import_crate_style!(css, "src/components/status/status.module.css");

#[derive(Clone, Debug, PartialEq)]
enum LiveIndicator {
    Live,
    Connecting,
    Paused(String),
}

/// Status bar component.
///
/// ## Responsive behavior
///
/// | Breakpoint | Display |
/// |------------|---------|
/// | Desktop (> 768px) | `sharenav \| Connection: … \| Location: /a/b \| Live` |
/// | Mobile (< 480px) | Location and live state only |
#[component]
pub fn Status() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");

    let connection = Signal::derive(move || {
        ctx.read(|ex| ex.connection().to_string())
            .unwrap_or_else(|| "-".to_string())
    });
    let location = Signal::derive(move || {
        ctx.read(|ex| ex.path().to_string())
            .unwrap_or_else(|| "/".to_string())
    });
    let channel = Signal::derive(move || {
        ctx.read(|ex| {
            let live = ex.live();
            match live.ensure_connected() {
                Ok(()) => LiveIndicator::Live,
                Err(_) if live.state() == ChannelState::Connecting => LiveIndicator::Connecting,
                Err(error) => LiveIndicator::Paused(error.to_string()),
            }
        })
    });

    view! {
        <header class=css::bar>
            <div class=css::section>
                <span class=css::appName>{APP_NAME}</span>

                <span class=css::label>
                    <span class=css::labelText>"Connection:"</span>
                    <span class=css::labelIcon><Icon icon=ic::SERVER /></span>
                    <span class=css::value>{connection}</span>
                </span>

                <span class=css::labelCyan>
                    <span class=css::labelText>"Location:"</span>
                    <span class=css::labelIcon><Icon icon=ic::FOLDER /></span>
                    <span class=css::value>{location}</span>
                </span>
            </div>

            {move || match channel.get() {
                Some(LiveIndicator::Live) => view! {
                    <span class=css::live title="Live updates active">"Live"</span>
                }.into_any(),
                Some(LiveIndicator::Connecting) => view! {
                    <span class=css::paused title="Connecting to live updates">"Connecting…"</span>
                }.into_any(),
                Some(LiveIndicator::Paused(reason)) => view! {
                    <span class=css::paused title=reason>
                        <Icon icon=ic::OFFLINE />
                        " Updates paused"
                    </span>
                }.into_any(),
                None => ().into_any(),
            }}
        </header>
    }
}
