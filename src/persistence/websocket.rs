use crate::logging::log;
use futures::channel::oneshot;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

use super::{PersistenceChannel, Subscription, SubscriptionId};

/// Wire frame: every message is a named event with a JSON payload
#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

type Listeners = Rc<RefCell<IndexMap<SubscriptionId, (String, oneshot::Sender<serde_json::Value>)>>>;

/// Frames sent while the socket was still connecting
type Outbox = Rc<RefCell<Vec<String>>>;

/// Backend connection over a browser websocket
pub struct WebSocketChannel {
    socket: WebSocket,
    listeners: Listeners,
    outbox: Outbox,
    next_id: Cell<u64>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_open: Closure<dyn FnMut()>,
}

impl WebSocketChannel {
    /// Open a connection to `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the browser refuses to open the socket
    pub fn connect(url: &str) -> Result<Self, String> {
        let socket = WebSocket::new(url).map_err(|e| format!("Failed to open websocket: {e:?}"))?;
        let listeners: Listeners = Rc::new(RefCell::new(IndexMap::new()));

        let dispatch_to = listeners.clone();
        let on_message = Closure::wrap(Box::new(move |ev: MessageEvent| {
            let Some(text) = ev.data().as_string() else {
                return;
            };
            let frame: Frame = match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    leptos::logging::warn!("Ignoring malformed frame: {}", e);
                    return;
                }
            };
            // Oldest listener for the event gets the message
            let mut listeners = dispatch_to.borrow_mut();
            let Some(id) = listeners
                .iter()
                .find(|(_, (event, _))| *event == frame.event)
                .map(|(id, _)| *id)
            else {
                log!("No listener for {}", frame.event);
                return;
            };
            if let Some((_, sender)) = listeners.shift_remove(&id) {
                let _ = sender.send(frame.payload);
            }
        }) as Box<dyn FnMut(_)>);
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let outbox: Outbox = Rc::new(RefCell::new(Vec::new()));
        let flush_from = outbox.clone();
        let opened = socket.clone();
        let on_open = Closure::wrap(Box::new(move || {
            let queued: Vec<String> = flush_from.borrow_mut().drain(..).collect();
            log!("Connected, sending {} queued frames", queued.len());
            for text in queued {
                if let Err(e) = opened.send_with_str(&text) {
                    leptos::logging::error!("Failed to send queued frame: {:?}", e);
                }
            }
        }) as Box<dyn FnMut()>);
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        log!("Connecting to {}", url);
        Ok(Self {
            socket,
            listeners,
            outbox,
            next_id: Cell::new(0),
            _on_message: on_message,
            _on_open: on_open,
        })
    }
}

impl PersistenceChannel for WebSocketChannel {
    fn emit(&self, event: &str, payload: serde_json::Value) -> Result<(), String> {
        let frame = Frame {
            event: event.to_string(),
            payload,
        };
        let text = serde_json::to_string(&frame).map_err(|e| e.to_string())?;
        match self.socket.ready_state() {
            WebSocket::OPEN => self
                .socket
                .send_with_str(&text)
                .map_err(|e| format!("{e:?}")),
            WebSocket::CONNECTING => {
                self.outbox.borrow_mut().push(text);
                Ok(())
            }
            _ => Err("connection is not open".to_string()),
        }
    }

    fn once(&self, event: &str) -> Subscription {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let (sender, ack) = oneshot::channel();
        self.listeners
            .borrow_mut()
            .insert(id, (event.to_string(), sender));
        Subscription { id, ack }
    }

    fn off(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().shift_remove(&id);
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.socket.set_onmessage(None);
        self.socket.set_onopen(None);
        let _ = self.socket.close();
    }
}
