//! File list component for explorer view.
//!
//! Only the rows in the engine's visible range are rendered. Two spacer
//! elements stand in for the rows above and below so the scrollbar reflects
//! the full listing.

use leptos::html::Div;
use leptos::prelude::*;
use leptos_icons::Icon;
use sharenav_core::{Entry, VisibleRange};

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::utils::format::{format_date, format_size};

stylance::import_crate_style!(css, "src/components/explorer/file_list.module.css");

/// Rows to draw plus the spacer heights around them.
#[derive(Clone, PartialEq)]
struct Window {
    range: VisibleRange,
    rows: Vec<Entry>,
    selected: Option<String>,
    above: f64,
    below: f64,
}

#[component]
pub fn FileList() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let container = NodeRef::<Div>::new();

    // Report the container height once mounted and whenever the listing
    // changes size (the pane shrinks when a preview opens).
    Effect::new(move |_| {
        ctx.revision.track();
        if let (Some(el), Some(session)) = (container.get(), ctx.session()) {
            session.set_viewport_height(f64::from(el.client_height()));
        }
    });

    // Keyboard selection scrolls the engine viewport; mirror it to the DOM
    Effect::new(move |_| {
        let Some(offset) = ctx.read(|ex| ex.viewport().scroll_offset()) else {
            return;
        };
        if let Some(el) = container.get_untracked()
            && (f64::from(el.scroll_top()) - offset).abs() >= 1.0
        {
            el.set_scroll_top(offset as i32);
        }
    });

    let on_scroll = move |_: leptos::ev::Event| {
        if let (Some(el), Some(session)) = (container.get_untracked(), ctx.session()) {
            session.set_scroll_offset(f64::from(el.scroll_top()));
        }
    };

    let window = Memo::new(move |_| {
        ctx.read(|ex| {
            let (range, rows) = ex.visible_entries();
            let viewport = ex.viewport();
            let above = viewport.row_offset(range.start);
            Window {
                range,
                rows: rows.to_vec(),
                selected: ex.state().selected().map(str::to_string),
                above,
                below: (viewport.total_height() - viewport.row_offset(range.end)).max(0.0),
            }
        })
    });

    let empty = Signal::derive(move || {
        ctx.read(|ex| ex.listing().is_some_and(|l| l.entries.is_empty()))
            .unwrap_or(false)
    });

    view! {
        <div class=css::list role="grid" aria-label="File list">
            <div class=css::listHeader role="row">
                <span class=css::headerIcon></span>
                <span class=css::headerName>"Name"</span>
                <span class=css::headerDate>"Modified"</span>
                <span class=css::headerSize>"Size"</span>
            </div>
            <div class=css::scroller node_ref=container on:scroll=on_scroll>
                <Show when=move || empty.get()>
                    <div class=css::empty>"This folder is empty"</div>
                </Show>
                {move || window.get().map(|w| {
                    let rows = w.rows
                        .into_iter()
                        .enumerate()
                        .map(|(offset, entry)| {
                            let selected = w.selected.as_deref() == Some(entry.name.as_str());
                            view! {
                                <FileListItem
                                    entry=entry
                                    index=w.range.start + offset
                                    selected=selected
                                />
                            }
                        })
                        .collect_view();
                    view! {
                        <div style=format!("height: {}px", w.above)></div>
                        {rows}
                        <div style=format!("height: {}px", w.below)></div>
                    }
                })}
            </div>
        </div>
    }
}

#[component]
fn FileListItem(entry: Entry, index: usize, selected: bool) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let icon = ic::for_entry(&entry);
    let is_dir = entry.is_dir();
    let size = format_size(entry.size);
    let modified = format_date(entry.modified);

    let name_for_click = entry.name.clone();
    let handle_click = move |_: leptos::ev::MouseEvent| {
        if let Some(session) = ctx.session() {
            session.select(&name_for_click);
        }
    };

    // Double click: navigate into directory or preview file
    let name_for_open = entry.name.clone();
    let handle_dblclick = move |_: leptos::ev::MouseEvent| {
        if let Some(session) = ctx.session() {
            session.open_entry(&name_for_open);
        }
    };

    let name_class = if is_dir {
        format!("{} {}", css::name, css::nameDir)
    } else if entry.hidden {
        format!("{} {}", css::name, css::nameHidden)
    } else {
        css::name.to_string()
    };
    let item_class = if selected {
        format!("{} {}", css::listItem, css::selected)
    } else {
        css::listItem.to_string()
    };
    let row_index = (index + 1).to_string();
    let aria_label = if is_dir {
        format!("Folder: {}", entry.name)
    } else {
        format!("File: {}", entry.name)
    };

    view! {
        <div
            class=item_class
            on:click=handle_click
            on:dblclick=handle_dblclick
            role="row"
            aria-rowindex=row_index
            aria-label=aria_label
            aria-selected=selected.to_string()
        >
            <span class=css::icon aria-hidden="true"><Icon icon=icon /></span>
            <span class=name_class>
                {entry.name}
                {(!entry.readable).then(|| view! {
                    <span class=css::lockIcon><Icon icon=ic::LOCK /></span>
                })}
            </span>
            <span class=css::itemDate>{modified}</span>
            <span class=css::size>{size}</span>
        </div>
    }
}
