use crate::editor::{
    CompletionChoice, Dispatch, EditorError, EditorEvent, ListenerId, MapEvent, MapSurface, ModeController,
    NodeFormRequest, Notice, NodePrefill, RouteRequest, SaveOutcome, SegmentFormRequest, SegmentPrefill,
};
use crate::geometry::LngLat;
use crate::logging::log;
use crate::models::{NodeAttributes, SegmentAttributes};
use crate::persistence::{PersistenceChannel, PersistenceGateway, Timer};
use crate::routing::RoutingService;
use std::cell::RefCell;
use std::rc::Rc;

/// What the editor needs from the user interface
#[allow(async_fn_in_trait)]
pub trait EditorUi {
    /// Show an event produced by the controller
    fn publish(&self, event: EditorEvent);

    /// Ask whether a completable draft should be saved or drawing continued
    async fn decide_completion(&self, prefill: &SegmentPrefill) -> CompletionChoice;

    /// Collect segment attributes; `None` when the user cancels
    async fn segment_form(&self, prefill: &SegmentPrefill) -> Option<SegmentAttributes>;

    /// Collect node attributes; `None` when the user cancels
    async fn node_form(&self, prefill: &NodePrefill) -> Option<NodeAttributes>;
}

/// Drives the controller's asynchronous flows: prompts, forms, routing and
/// saving.
///
/// The controller is only borrowed for synchronous calls, never across an
/// await, and the events it produced are published after every call.
pub struct EditorSession<S: MapSurface, U, R, C, T> {
    controller: Rc<RefCell<ModeController<S>>>,
    ui: Rc<U>,
    router: Rc<R>,
    gateway: Rc<PersistenceGateway<C, T>>,
}

impl<S: MapSurface, U, R, C, T> Clone for EditorSession<S, U, R, C, T> {
    fn clone(&self) -> Self {
        Self {
            controller: Rc::clone(&self.controller),
            ui: Rc::clone(&self.ui),
            router: Rc::clone(&self.router),
            gateway: Rc::clone(&self.gateway),
        }
    }
}

impl<S, U, R, C, T> EditorSession<S, U, R, C, T>
where
    S: MapSurface,
    U: EditorUi,
    R: RoutingService,
    C: PersistenceChannel,
    T: Timer,
{
    pub fn new(controller: ModeController<S>, ui: U, router: R, gateway: PersistenceGateway<C, T>) -> Self {
        Self {
            controller: Rc::new(RefCell::new(controller)),
            ui: Rc::new(ui),
            router: Rc::new(router),
            gateway: Rc::new(gateway),
        }
    }

    pub fn controller(&self) -> &Rc<RefCell<ModeController<S>>> {
        &self.controller
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn gateway(&self) -> &PersistenceGateway<C, T> {
        &self.gateway
    }

    fn with_controller<O>(&self, f: impl FnOnce(&mut ModeController<S>) -> O) -> Option<O> {
        let (output, events) = {
            let Ok(mut controller) = self.controller.try_borrow_mut() else {
                leptos::logging::warn!("Editor is busy, dropping call");
                return None;
            };
            let output = f(&mut controller);
            (output, controller.drain_events())
        };
        for event in events {
            self.ui.publish(event);
        }
        Some(output)
    }

    pub fn attach(&self) {
        self.with_controller(ModeController::attach);
    }

    pub fn detach(&self) {
        self.with_controller(ModeController::detach);
    }

    /// # Errors
    ///
    /// Returns an error if EDIT cannot be entered from the current mode
    pub fn enter_edit_mode(&self) -> Result<(), EditorError> {
        self.command(|c| c.enter_edit_mode().map_err(EditorError::from))
    }

    /// # Errors
    ///
    /// Returns an error outside EDIT mode
    pub fn quit_edit_mode(&self) -> Result<(), EditorError> {
        self.command(|c| c.quit_edit_mode().map_err(EditorError::from))
    }

    /// # Errors
    ///
    /// Returns an error if AUTO_SEGMENT cannot be entered from the current mode
    pub fn start_auto_segment(&self) -> Result<(), EditorError> {
        self.command(|c| c.start_auto_segment().map_err(EditorError::from))
    }

    /// # Errors
    ///
    /// Returns an error outside AUTO_SEGMENT mode
    pub fn cancel_auto_segment(&self) -> Result<(), EditorError> {
        self.command(|c| c.cancel_auto_segment().map_err(EditorError::from))
    }

    /// # Errors
    ///
    /// See [`ModeController::cancel_last_point`]
    pub fn cancel_last_point(&self) -> Result<(), EditorError> {
        self.command(|c| c.cancel_last_point().map(|_| ()))
    }

    /// # Errors
    ///
    /// See [`ModeController::discard_draft`]
    pub fn discard_draft(&self) -> Result<(), EditorError> {
        self.command(ModeController::discard_draft)
    }

    fn command(&self, f: impl FnOnce(&mut ModeController<S>) -> Result<(), EditorError>) -> Result<(), EditorError> {
        self.with_controller(f).unwrap_or_else(|| {
            let error = EditorError::Busy;
            self.ui.publish(EditorEvent::Notice(Notice::warning(error.to_string())));
            Err(error)
        })
    }

    /// Fetch the stored network from the backend and show it.
    ///
    /// On failure the current network stays and the user is told.
    pub async fn load_network(&self) -> bool {
        match self.gateway.load_network().await {
            Ok(network) => self.with_controller(|c| c.replace_network(network)).is_some(),
            Err(e) => {
                leptos::logging::error!("Failed to load the trail network: {}", e);
                self.ui.publish(EditorEvent::Notice(Notice::error(e.to_string())));
                false
            }
        }
    }

    /// Handle an event caught by `listener` and run whatever flow it starts
    pub async fn dispatch(&self, listener: ListenerId, event: MapEvent) -> Option<SaveOutcome> {
        match self.with_controller(|c| c.handle(listener, &event))? {
            Dispatch::SegmentCompletable(prefill) => self.decide_completion(prefill).await,
            Dispatch::RouteRequested(request) => self.compute_route(request).await,
            Dispatch::NodeMoved(request) => self.fill_node_form(request).await,
            Dispatch::Ignored | Dispatch::Handled | Dispatch::Rejected(_) => None,
        }
    }

    async fn decide_completion(&self, prefill: SegmentPrefill) -> Option<SaveOutcome> {
        match self.ui.decide_completion(&prefill).await {
            CompletionChoice::Continue => {
                self.with_controller(ModeController::continue_drawing);
                None
            }
            CompletionChoice::Confirm => self.save_segment().await,
        }
    }

    /// Open the attribute form for the completable draft and save it
    pub async fn save_segment(&self) -> Option<SaveOutcome> {
        let request = self.with_controller(|c| {
            c.confirm_segment().map_err(|e| {
                c.report(&e);
                e
            })
        })?;
        self.fill_segment_form(request.ok()?).await
    }

    async fn fill_segment_form(&self, request: SegmentFormRequest) -> Option<SaveOutcome> {
        loop {
            let Some(attributes) = self.ui.segment_form(&request.prefill).await else {
                self.with_controller(|c| c.cancel_segment_form(request.ticket));
                return None;
            };
            match self.with_controller(|c| c.submit_segment_form(request.ticket, attributes))? {
                Ok(pending) => {
                    let result = self.gateway.save(&pending.record).await;
                    return self.with_controller(|c| c.finish_segment_save(&pending, result));
                }
                // the form stays open for corrections
                Err(EditorError::Validation(_)) => {}
                Err(e) => {
                    log!("Segment form no longer applies: {}", e);
                    return None;
                }
            }
        }
    }

    async fn compute_route(&self, request: RouteRequest) -> Option<SaveOutcome> {
        let result = self
            .router
            .route(request.from.coordinates, request.to.coordinates)
            .await;
        let form = self.with_controller(|c| c.finish_route(request.ticket, result))??;
        self.fill_segment_form(form).await
    }

    /// Open the node form for a new node at `coordinates` and save it
    pub async fn create_node(&self, coordinates: LngLat) -> Option<SaveOutcome> {
        let request = self.with_controller(|c| {
            c.request_new_node(coordinates).map_err(|e| {
                c.report(&e);
                e
            })
        })?;
        self.fill_node_form(request.ok()?).await
    }

    async fn fill_node_form(&self, request: NodeFormRequest) -> Option<SaveOutcome> {
        loop {
            let Some(attributes) = self.ui.node_form(&request.prefill).await else {
                self.with_controller(|c| c.cancel_node_form(request.ticket));
                return None;
            };
            match self.with_controller(|c| c.submit_node_form(request.ticket, attributes))? {
                Ok(pending) => {
                    let result = self.gateway.save(&pending.record).await;
                    let outcome = self.with_controller(|c| c.finish_node_save(&pending, result))?;
                    // a failed save leaves the form open for another attempt
                    if outcome != SaveOutcome::Failed {
                        return Some(outcome);
                    }
                }
                Err(EditorError::Validation(_)) => {}
                Err(e) => {
                    log!("Node form no longer applies: {}", e);
                    return None;
                }
            }
        }
    }
}
