use crate::components::completion_prompt::CompletionPrompt;
use crate::components::context_menu::ContextMenu;
use crate::components::editor_ui::{EditorSignals, LeptosEditorUi};
use crate::components::hover_label::HoverLabel;
use crate::components::mode_toolbar::ModeToolbar;
use crate::components::node_form::NodeForm;
use crate::components::segment_form::SegmentForm;
use crate::components::toast::ToastNotification;
use crate::editor::{EditorError, EditorMode, ModeController};
use crate::logging::log;
use crate::map::{MapLibreMap, MapLibreSurface};
use crate::models::{EditorSettings, TrailNetwork};
use crate::persistence::websocket::WebSocketChannel;
use crate::persistence::{GlooTimer, PersistenceGateway};
use crate::routing::OsrmRouter;
use crate::session::EditorSession;
use leptos::*;
use leptos_meta::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

type AppSession = EditorSession<MapLibreSurface, LeptosEditorUi, OsrmRouter, WebSocketChannel, GlooTimer>;

const MAP_STYLE_URL: &str = "https://demotiles.maplibre.org/style.json";

/// Element whose text holds the editor settings as JSON
const SETTINGS_ELEMENT_ID: &str = "editor-settings";

fn read_settings() -> EditorSettings {
    let text = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(SETTINGS_ELEMENT_ID))
        .and_then(|e| e.text_content());
    match text.map(|text| EditorSettings::from_json(&text)) {
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            leptos::logging::error!("Invalid editor settings, using defaults: {}", e);
            EditorSettings::new()
        }
        None => EditorSettings::new(),
    }
}

fn start_session(map: MapLibreMap, settings: EditorSettings, ui: LeptosEditorUi) -> Result<AppSession, String> {
    let channel = WebSocketChannel::connect(&settings.backend_url)?;
    let gateway = PersistenceGateway::new(channel, GlooTimer, settings.save_timeout());
    let router = OsrmRouter::new(&settings.routing);
    let controller = ModeController::new(MapLibreSurface::new(map), settings, TrailNetwork::new());
    let session = EditorSession::new(controller, ui, router, gateway);

    let forward_to = session.clone();
    session.controller().borrow().surface().connect(move |listener, event| {
        let session = forward_to.clone();
        spawn_local(async move {
            session.dispatch(listener, event).await;
        });
    });
    session.attach();

    let loader = session.clone();
    spawn_local(async move {
        loader.load_network().await;
    });
    Ok(session)
}

fn report_command(result: Result<(), EditorError>) {
    if let Err(e) = result {
        log!("Command refused: {}", e);
    }
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let signals = EditorSignals::new();
    let ui = LeptosEditorUi::new(signals);
    let session: StoredValue<Option<AppSession>> = store_value(None);
    let map_ref = create_node_ref::<html::Div>();

    let ui_for_map = ui.clone();
    map_ref.on_load(move |container| {
        let settings = read_settings();
        let element: &web_sys::HtmlElement = &container;
        let options = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&options, &"container".into(), element);
        let _ = js_sys::Reflect::set(&options, &"style".into(), &MAP_STYLE_URL.into());
        let map = MapLibreMap::new(&options);

        let loaded = map.clone();
        let on_map_load = Closure::once(move || match start_session(loaded, settings, ui_for_map) {
            Ok(started) => session.set_value(Some(started)),
            Err(e) => leptos::logging::error!("Editor failed to start: {}", e),
        });
        map.once("load", on_map_load.as_ref().unchecked_ref());
        on_map_load.forget();
    });

    let with_session = move |f: &dyn Fn(AppSession)| {
        if let Some(current) = session.get_value() {
            f(current);
        }
    };

    let on_new_segment = Callback::new(move |()| with_session(&|s| report_command(s.enter_edit_mode())));
    let on_auto_segment = Callback::new(move |()| with_session(&|s| report_command(s.start_auto_segment())));
    let on_cancel_last_point = Callback::new(move |()| {
        with_session(&|s| report_command(s.cancel_last_point()));
        signals.completable.set(false);
    });
    let on_save = Callback::new(move |()| {
        with_session(&|s| {
            spawn_local(async move {
                s.save_segment().await;
            });
        });
    });
    let on_quit = Callback::new(move |()| {
        with_session(&|s| match signals.mode.get_untracked() {
            EditorMode::Edit => report_command(s.quit_edit_mode()),
            EditorMode::AutoSegment => report_command(s.cancel_auto_segment()),
            EditorMode::Normal => {}
        });
    });
    let on_new_node = Callback::new(move |coordinates| {
        with_session(&|s| {
            spawn_local(async move {
                s.create_node(coordinates).await;
            });
        });
    });

    let prompt_ui = ui.clone();
    let segment_ui = ui.clone();
    let node_ui = ui;

    view! {
        <Stylesheet id="leptos" href="/pkg/trail_editor.css"/>
        <Title text="Trail network editor"/>

        <div class="app">
            <ModeToolbar
                mode=signals.mode
                completable=signals.completable
                route_loading=signals.route_loading
                on_new_segment=on_new_segment
                on_auto_segment=on_auto_segment
                on_cancel_last_point=on_cancel_last_point
                on_save=on_save
                on_quit=on_quit
            />
            <div class="map-container" node_ref=map_ref></div>
            <HoverLabel label=signals.hover_label/>
            <ContextMenu menu=signals.context_menu on_new_node=on_new_node on_new_segment=on_new_segment/>
            <CompletionPrompt
                prompt=signals.completion_prompt
                on_answer=Callback::new(move |choice| prompt_ui.answer_completion(choice))
            />
            <SegmentForm
                form=signals.segment_form
                on_submit=Callback::new(move |attributes| segment_ui.answer_segment_form(attributes))
            />
            <NodeForm
                form=signals.node_form
                on_submit=Callback::new(move |attributes| node_ui.answer_node_form(attributes))
            />
            <ToastNotification toast=signals.toast/>
        </div>
    }
}
