use crate::components::dialog::Dialog;
use crate::editor::NodePrefill;
use crate::models::{Description, GeofenceRadius, Language, NodeAttributes, NodeCategory};
use indexmap::IndexMap;
use leptos::{
    component, create_rw_signal, event_target_value, view, Callable, Callback, CollectView, IntoView, RwSignal,
    SignalGet, SignalGetUntracked, SignalSet, SignalUpdate, SignalWith,
};

fn description_inputs(language: Language, descriptions: RwSignal<IndexMap<Language, Description>>) -> impl IntoView {
    let text = move |long: bool| {
        descriptions.with(|all| {
            all.get(&language)
                .map(|d| if long { d.long_text.clone() } else { d.short_text.clone() })
                .unwrap_or_default()
        })
    };
    let edit = move |long: bool, value: String| {
        descriptions.update(|all| {
            let entry = all.entry(language).or_insert_with(|| Description {
                short_text: String::new(),
                long_text: String::new(),
            });
            if long {
                entry.long_text = value;
            } else {
                entry.short_text = value;
            }
        });
    };

    view! {
        <fieldset class="node-description">
            <legend>{language.to_string()}</legend>
            <input
                type="text"
                placeholder="Short description"
                prop:value=move || text(false)
                on:input=move |ev| edit(false, event_target_value(&ev))
            />
            <textarea
                placeholder="Long description"
                prop:value=move || text(true)
                on:input=move |ev| edit(true, event_target_value(&ev))
            ></textarea>
        </fieldset>
    }
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn NodeForm(form: RwSignal<Option<NodePrefill>>, on_submit: Callback<Option<NodeAttributes>>) -> impl IntoView {
    move || {
        form.get().map(|prefill| {
            let existing = prefill.existing.clone();
            let title = if existing.is_some() { "Edit node" } else { "New node" };
            let category = create_rw_signal(existing.as_ref().map_or(NodeCategory::Crossroad, |n| n.category));
            let name = create_rw_signal(existing.as_ref().map(|n| n.display_name.clone()).unwrap_or_default());
            let radius = create_rw_signal(existing.as_ref().map(|n| n.geofence_radius).unwrap_or_default());
            let descriptions = create_rw_signal(existing.map(|n| n.descriptions).unwrap_or_default());

            let submit = move |_| {
                let category = category.get_untracked();
                let descriptions = if category.requires_descriptions() {
                    descriptions.get_untracked()
                } else {
                    IndexMap::new()
                };
                on_submit.call(Some(NodeAttributes {
                    category,
                    display_name: name.get_untracked(),
                    geofence_radius: radius.get_untracked(),
                    descriptions,
                }));
            };

            view! {
                <Dialog title=title>
                    <p class="node-coordinates">
                        {format!("{:.5}, {:.5}", prefill.coordinates.lat, prefill.coordinates.lon)}
                    </p>
                    <label>
                        "Name"
                        <input
                            type="text"
                            prop:value=name
                            on:input=move |ev| name.set(event_target_value(&ev))
                        />
                    </label>
                    <label>
                        "Category"
                        <select on:change=move |ev| {
                            if let Some(selected) = event_target_value(&ev)
                                .parse::<usize>()
                                .ok()
                                .and_then(|i| NodeCategory::ALL.get(i))
                            {
                                category.set(*selected);
                            }
                        }>
                            {NodeCategory::ALL
                                .into_iter()
                                .enumerate()
                                .map(|(i, option)| view! {
                                    <option value=i.to_string() selected=move || category.get() == option>
                                        {option.as_str()}
                                    </option>
                                })
                                .collect_view()}
                        </select>
                    </label>
                    <label>
                        "Geofence radius"
                        <select on:change=move |ev| {
                            if let Some(selected) = event_target_value(&ev)
                                .parse::<usize>()
                                .ok()
                                .and_then(|i| GeofenceRadius::ALL.get(i))
                            {
                                radius.set(*selected);
                            }
                        }>
                            {GeofenceRadius::ALL
                                .into_iter()
                                .enumerate()
                                .map(|(i, option)| view! {
                                    <option value=i.to_string() selected=move || radius.get() == option>
                                        {format!("{} m", option.meters())}
                                    </option>
                                })
                                .collect_view()}
                        </select>
                    </label>
                    {move || category.get().requires_descriptions().then(|| {
                        Language::ALL
                            .into_iter()
                            .map(|language| description_inputs(language, descriptions))
                            .collect_view()
                    })}
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
