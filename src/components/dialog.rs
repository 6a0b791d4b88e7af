use leptos::{component, view, Children, IntoView};

/// Centered modal box over a dimmed backdrop
#[component]
#[must_use]
pub fn Dialog(title: &'static str, children: Children) -> impl IntoView {
    view! {
        <div class="modal-overlay">
            <div class="dialog">
                <h3 class="dialog-title">{title}</h3>
                {children()}
            </div>
        </div>
    }
}
