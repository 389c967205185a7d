//! WebSocket implementation of the live-update transport.
//!
//! Socket callbacks are tagged with the generation number the engine passed
//! to [`LiveTransport::open`], so frames from a replaced socket can be told
//! apart from the current one.

use std::rc::Rc;

use sharenav_core::{ClientMessage, ExplorerError, LiveTransport};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use crate::core::error::SocketError;

/// Event delivered from the browser socket to the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketEvent {
    Open(u64),
    Close(u64),
    Message(u64, String),
}

pub type SocketHandler = Rc<dyn Fn(SocketEvent)>;

/// A live socket and the JS callbacks attached to it.
struct OpenSocket {
    socket: WebSocket,
    _on_open: Closure<dyn FnMut()>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut()>,
}

impl OpenSocket {
    fn detach(self) {
        self.socket.set_onopen(None);
        self.socket.set_onclose(None);
        self.socket.set_onmessage(None);
        self.socket.set_onerror(None);
        let _ = self.socket.close();
    }
}

pub struct WebSocketTransport {
    url: String,
    handler: SocketHandler,
    current: Option<OpenSocket>,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>, handler: SocketHandler) -> Self {
        Self {
            url: url.into(),
            handler,
            current: None,
        }
    }

    fn connect(&self, generation: u64) -> Result<OpenSocket, SocketError> {
        let socket =
            WebSocket::new(&self.url).map_err(|e| SocketError::OpenFailed(format!("{:?}", e)))?;

        let handler = self.handler.clone();
        let on_open = Closure::wrap(Box::new(move || {
            handler(SocketEvent::Open(generation));
        }) as Box<dyn FnMut()>);

        let handler = self.handler.clone();
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            log::info!("live socket closed (code {})", event.code());
            handler(SocketEvent::Close(generation));
        }) as Box<dyn FnMut(CloseEvent)>);

        let handler = self.handler.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Some(text) = event.data().as_string() {
                handler(SocketEvent::Message(generation, text));
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        // A close event always follows an error
        let on_error = Closure::wrap(Box::new(move || {
            log::warn!("live socket error (generation {})", generation);
        }) as Box<dyn FnMut()>);

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(OpenSocket {
            socket,
            _on_open: on_open,
            _on_close: on_close,
            _on_message: on_message,
            _on_error: on_error,
        })
    }
}

impl LiveTransport for WebSocketTransport {
    fn open(&mut self, generation: u64) -> Result<(), ExplorerError> {
        self.close();
        log::debug!("opening live socket {} (generation {})", self.url, generation);
        self.current = Some(self.connect(generation)?);
        Ok(())
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), ExplorerError> {
        let open = self.current.as_ref().ok_or(SocketError::NotOpen)?;
        if open.socket.ready_state() != WebSocket::OPEN {
            return Err(SocketError::NotOpen.into());
        }
        let text = serde_json::to_string(message).map_err(|e| SocketError::Encode(e.to_string()))?;
        open.socket
            .send_with_str(&text)
            .map_err(|e| SocketError::OpenFailed(format!("{:?}", e)))?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(open) = self.current.take() {
            open.detach();
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}
