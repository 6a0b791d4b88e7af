use crate::components::toast::Toast;
use crate::editor::{CompletionChoice, ContextMenuRequest, EditorEvent, EditorMode, NodePrefill, SegmentPrefill};
use crate::models::{NodeAttributes, SegmentAttributes};
use crate::session::EditorUi;
use futures::channel::oneshot;
use leptos::{create_rw_signal, RwSignal, SignalSet, SignalUpdate};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Reactive view of what the editor wants shown
#[derive(Clone, Copy)]
pub struct EditorSignals {
    pub mode: RwSignal<EditorMode>,
    pub toast: RwSignal<Toast>,
    pub hover_label: RwSignal<Option<String>>,
    pub context_menu: RwSignal<Option<ContextMenuRequest>>,
    pub selection: RwSignal<Vec<Uuid>>,
    pub route_loading: RwSignal<bool>,
    /// A concluded draft is waiting to be saved
    pub completable: RwSignal<bool>,
    pub completion_prompt: RwSignal<Option<SegmentPrefill>>,
    pub segment_form: RwSignal<Option<SegmentPrefill>>,
    pub node_form: RwSignal<Option<NodePrefill>>,
}

impl EditorSignals {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: create_rw_signal(EditorMode::Normal),
            toast: create_rw_signal(Toast::default()),
            hover_label: create_rw_signal(None),
            context_menu: create_rw_signal(None),
            selection: create_rw_signal(Vec::new()),
            route_loading: create_rw_signal(false),
            completable: create_rw_signal(false),
            completion_prompt: create_rw_signal(None),
            segment_form: create_rw_signal(None),
            node_form: create_rw_signal(None),
        }
    }
}

impl Default for EditorSignals {
    fn default() -> Self {
        Self::new()
    }
}

type Pending<T> = Rc<RefCell<Option<oneshot::Sender<T>>>>;

/// [`EditorUi`] backed by Leptos signals.
///
/// Prompts and forms are answered by the components through the `answer_*`
/// methods. Opening a prompt drops any unanswered one, which resolves it as
/// dismissed.
#[derive(Clone)]
pub struct LeptosEditorUi {
    signals: EditorSignals,
    choice: Pending<CompletionChoice>,
    segment: Pending<Option<SegmentAttributes>>,
    node: Pending<Option<NodeAttributes>>,
    next_toast: Rc<RefCell<u64>>,
}

impl LeptosEditorUi {
    #[must_use]
    pub fn new(signals: EditorSignals) -> Self {
        Self {
            signals,
            choice: Rc::default(),
            segment: Rc::default(),
            node: Rc::default(),
            next_toast: Rc::default(),
        }
    }

    #[must_use]
    pub fn signals(&self) -> EditorSignals {
        self.signals
    }

    pub fn answer_completion(&self, choice: CompletionChoice) {
        self.signals.completion_prompt.set(None);
        if let Some(sender) = self.choice.borrow_mut().take() {
            let _ = sender.send(choice);
        }
    }

    pub fn answer_segment_form(&self, attributes: Option<SegmentAttributes>) {
        self.signals.segment_form.set(None);
        if let Some(sender) = self.segment.borrow_mut().take() {
            let _ = sender.send(attributes);
        }
    }

    pub fn answer_node_form(&self, attributes: Option<NodeAttributes>) {
        self.signals.node_form.set(None);
        if let Some(sender) = self.node.borrow_mut().take() {
            let _ = sender.send(attributes);
        }
    }

    /// Close every open prompt as if the user had dismissed it
    fn dismiss_prompts(&self) {
        self.answer_completion(CompletionChoice::Continue);
        self.answer_segment_form(None);
        self.answer_node_form(None);
    }

    fn show_toast(&self, toast: Toast) {
        let id = {
            let mut next = self.next_toast.borrow_mut();
            *next += 1;
            *next
        };
        self.signals.toast.set(Toast { id, ..toast });
        let toast_signal = self.signals.toast;
        leptos::set_timeout(
            move || {
                toast_signal.update(|current| {
                    if current.id == id {
                        current.visible = false;
                    }
                });
            },
            TOAST_DURATION,
        );
    }
}

fn pending<T>(slot: &Pending<T>) -> oneshot::Receiver<T> {
    let (sender, receiver) = oneshot::channel();
    *slot.borrow_mut() = Some(sender);
    receiver
}

impl EditorUi for LeptosEditorUi {
    fn publish(&self, event: EditorEvent) {
        match event {
            EditorEvent::ModeChanged { to, .. } => {
                self.dismiss_prompts();
                self.signals.mode.set(to);
                self.signals.context_menu.set(None);
                self.signals.completable.set(false);
            }
            EditorEvent::ContextMenu(request) => self.signals.context_menu.set(Some(request)),
            EditorEvent::Notice(notice) => self.show_toast(Toast::from_notice(notice)),
            EditorEvent::HoverLabel(label) => self.signals.hover_label.set(label),
            EditorEvent::SelectionChanged(selection) => self.signals.selection.set(selection),
            EditorEvent::RouteLoading(loading) => self.signals.route_loading.set(loading),
            EditorEvent::NetworkChanged => {}
        }
    }

    async fn decide_completion(&self, prefill: &SegmentPrefill) -> CompletionChoice {
        let receiver = pending(&self.choice);
        self.signals.completable.set(true);
        self.signals.completion_prompt.set(Some(prefill.clone()));
        receiver.await.unwrap_or(CompletionChoice::Continue)
    }

    async fn segment_form(&self, prefill: &SegmentPrefill) -> Option<SegmentAttributes> {
        let receiver = pending(&self.segment);
        self.signals.segment_form.set(Some(prefill.clone()));
        receiver.await.ok().flatten()
    }

    async fn node_form(&self, prefill: &NodePrefill) -> Option<NodeAttributes> {
        let receiver = pending(&self.node);
        self.signals.node_form.set(Some(prefill.clone()));
        receiver.await.ok().flatten()
    }
}
