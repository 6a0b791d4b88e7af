use leptos::{component, view, IntoView, RwSignal, SignalGet};

/// Name of the segment under the pointer
#[component]
#[must_use]
pub fn HoverLabel(label: RwSignal<Option<String>>) -> impl IntoView {
    move || {
        label.get().map(|name| {
            view! { <div class="hover-label">{name}</div> }
        })
    }
}
