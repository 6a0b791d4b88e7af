use crate::editor::ContextMenuRequest;
use crate::geometry::LngLat;
use leptos::{component, view, Callable, Callback, IntoView, RwSignal, SignalGet, SignalSet};

#[component]
pub fn ContextMenu(
    menu: RwSignal<Option<ContextMenuRequest>>,
    on_new_node: Callback<LngLat>,
    on_new_segment: Callback<()>,
) -> impl IntoView {
    move || {
        menu.get().map(|request| {
            let style = format!("left: {}px; top: {}px;", request.screen.x, request.screen.y);
            view! {
                <div class="context-menu" style=style>
                    <div class="context-menu-coordinates">
                        {format!("{:.5}, {:.5}", request.coordinates.lat, request.coordinates.lon)}
                    </div>
                    <button
                        class="context-menu-item"
                        on:click=move |_| {
                            menu.set(None);
                            on_new_node.call(request.coordinates);
                        }
                    >
                        <i class="fa-solid fa-circle-plus"></i>
                        " New node here"
                    </button>
                    <button
                        class="context-menu-item"
                        on:click=move |_| {
                            menu.set(None);
                            on_new_segment.call(());
                        }
                    >
                        <i class="fa-solid fa-pen"></i>
                        " New segment"
                    </button>
                    <button class="context-menu-item" on:click=move |_| menu.set(None)>
                        "Close"
                    </button>
                </div>
            }
        })
    }
}
