use crate::components::dialog::Dialog;
use crate::editor::{DraftOrigin, SegmentPrefill};
use crate::models::{SegmentAttributes, SegmentCategory, SurfaceCondition};
use leptos::{
    component, create_signal, event_target_value, view, Callable, Callback, CollectView, IntoView, RwSignal, SignalGet,
    SignalGetUntracked, SignalSet,
};

#[component]
pub fn SegmentForm(form: RwSignal<Option<SegmentPrefill>>, on_submit: Callback<Option<SegmentAttributes>>) -> impl IntoView {
    move || {
        form.get().map(|prefill| {
            let (name, set_name) = create_signal(String::new());
            let (category, set_category) = create_signal(SegmentCategory::default());
            let (surface, set_surface) = create_signal(SurfaceCondition::default());

            let submit = move |_| {
                on_submit.call(Some(SegmentAttributes {
                    name: name.get_untracked(),
                    category: category.get_untracked(),
                    surface_condition: surface.get_untracked(),
                }));
            };
            let origin = match prefill.origin {
                DraftOrigin::Manual => "drawn",
                DraftOrigin::Routed => "routed",
            };

            view! {
                <Dialog title="New segment">
                    <p class="segment-summary">
                        {format!(
                            "{} segment, {} points, {:.0} m, bearings {:.0}° / {:.0}°",
                            origin,
                            prefill.vertex_count,
                            prefill.length_meters,
                            prefill.start_bearing_degrees,
                            prefill.end_bearing_degrees,
                        )}
                    </p>
                    <label>
                        "Name"
                        <input
                            type="text"
                            prop:value=name
                            on:input=move |ev| set_name.set(event_target_value(&ev))
                        />
                    </label>
                    <label>
                        "Category"
                        <select on:change=move |ev| {
                            if let Some(selected) = event_target_value(&ev)
                                .parse::<usize>()
                                .ok()
                                .and_then(|i| SegmentCategory::ALL.get(i))
                            {
                                set_category.set(*selected);
                            }
                        }>
                            {SegmentCategory::ALL
                                .into_iter()
                                .enumerate()
                                .map(|(i, option)| view! {
                                    <option value=i.to_string() selected=move || category.get() == option>
                                        {option.label()}
                                    </option>
                                })
                                .collect_view()}
                        </select>
                    </label>
                    <label>
                        "Surface"
                        <select on:change=move |ev| {
                            if let Some(selected) = event_target_value(&ev)
                                .parse::<usize>()
                                .ok()
                                .and_then(|i| SurfaceCondition::ALL.get(i))
                            {
                                set_surface.set(*selected);
                            }
                        }>
                            {SurfaceCondition::ALL
                                .into_iter()
                                .enumerate()
                                .map(|(i, option)| view! {
                                    <option value=i.to_string() selected=move || surface.get() == option>
                                        {option.label()}
                                    </option>
                                })
                                .collect_view()}
                        </select>
                    </label>
                    <div class="confirmation-buttons">
                        <button class="cancel-button" on:click=move |_| on_submit.call(None)>
                            "Cancel"
                        </button>
                        <button class="confirm-button" on:click=submit>
                            "Save"
                        </button>
                    </div>
                </Dialog>
            }
        })
    }
}
