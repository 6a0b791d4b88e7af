use crate::components::dialog::Dialog;
use crate::editor::{CompletionChoice, SegmentPrefill};
use leptos::{component, view, Callable, Callback, IntoView, RwSignal, SignalGet};

/// Asks whether a segment that reached a node should be saved
#[component]
pub fn CompletionPrompt(prompt: RwSignal<Option<SegmentPrefill>>, on_answer: Callback<CompletionChoice>) -> impl IntoView {
    move || {
        prompt.get().map(|prefill| {
            view! {
                <Dialog title="Segment complete">
                    <p class="confirmation-message">
                        {format!(
                            "The segment reached a node after {} points ({:.0} m). Save it now?",
                            prefill.vertex_count,
                            prefill.length_meters,
                        )}
                    </p>
                    <div class="confirmation-buttons">
                        <button
                            class="cancel-button"
                            on:click=move |_| on_answer.call(CompletionChoice::Continue)
                        >
                            "Keep editing"
                        </button>
                        <button
                            class="confirm-button"
                            on:click=move |_| on_answer.call(CompletionChoice::Confirm)
                        >
                            "Save segment"
                        </button>
                    </div>
                </Dialog>
            }
        })
    }
}
