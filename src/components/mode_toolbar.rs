use crate::editor::EditorMode;
use leptos::{component, view, Callable, Callback, IntoView, RwSignal, SignalGet};

fn button_class(active: bool) -> &'static str {
    if active {
        "toolbar-button active"
    } else {
        "toolbar-button"
    }
}

#[component]
pub fn ModeToolbar(
    mode: RwSignal<EditorMode>,
    completable: RwSignal<bool>,
    route_loading: RwSignal<bool>,
    on_new_segment: Callback<()>,
    on_auto_segment: Callback<()>,
    on_cancel_last_point: Callback<()>,
    on_save: Callback<()>,
    on_quit: Callback<()>,
) -> impl IntoView {
    let browsing = move || mode.get() == EditorMode::Normal;
    let drawing = move || mode.get() == EditorMode::Edit;
    let routing = move || mode.get() == EditorMode::AutoSegment;

    view! {
        <div class="mode-toolbar">
            <button
                class=move || button_class(drawing())
                disabled=move || !browsing()
                on:click=move |_| on_new_segment.call(())
            >
                <i class="fa-solid fa-pen"></i>
                " New segment"
            </button>
            <button
                class=move || button_class(routing())
                disabled=move || !browsing()
                on:click=move |_| on_auto_segment.call(())
            >
                <i class="fa-solid fa-route"></i>
                {move || if route_loading.get() { " Routing..." } else { " Auto segment" }}
            </button>
            <button
                class="toolbar-button"
                disabled=move || !drawing()
                on:click=move |_| on_cancel_last_point.call(())
            >
                <i class="fa-solid fa-rotate-left"></i>
                " Cancel last point"
            </button>
            <button
                class="toolbar-button"
                disabled=move || !completable.get()
                on:click=move |_| on_save.call(())
            >
                <i class="fa-solid fa-floppy-disk"></i>
                " Save"
            </button>
            <button
                class="toolbar-button"
                disabled=browsing
                on:click=move |_| on_quit.call(())
            >
                <i class="fa-solid fa-xmark"></i>
                " Quit"
            </button>
        </div>
    }
}
