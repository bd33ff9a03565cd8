use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket, Window};

use chalkline_shared::agent::EventSink;
use chalkline_shared::wire::{decode_binary, decode_text, encode_binary};
use chalkline_shared::BoardEvent;

use crate::net::websocket_url;

#[derive(Debug)]
pub enum WsEvent {
    Open,
    Close,
    Error,
    Message(BoardEvent),
}

pub struct WsSender {
    socket: WebSocket,
}

impl WsSender {
    pub fn is_open(&self) -> bool {
        self.socket.ready_state() == WebSocket::OPEN
    }
}

impl EventSink for WsSender {
    fn send(&self, event: &BoardEvent) {
        if !self.is_open() {
            return;
        }
        match encode_binary(event) {
            Ok(payload) => {
                if let Err(error) = self.socket.send_with_u8_array(&payload) {
                    web_sys::console::error_2(&"WS send failed".into(), &error);
                }
            }
            Err(error) => {
                web_sys::console::error_1(&format!("WS encode failed: {error}").into());
            }
        }
    }
}

fn decode_message(event: &MessageEvent) -> Option<BoardEvent> {
    let data = event.data();
    let decoded = if let Ok(buffer) = data.clone().dyn_into::<js_sys::ArrayBuffer>() {
        decode_binary(&Uint8Array::new(&buffer).to_vec())
    } else if let Some(text) = data.as_string() {
        decode_text(&text)
    } else {
        web_sys::console::error_2(&"WS message data is not a string or arraybuffer".into(), &data);
        return None;
    };
    match decoded {
        Ok(message) => Some(message),
        Err(error) => {
            web_sys::console::error_1(&format!("WS message rejected: {error}").into());
            None
        }
    }
}

pub fn connect_ws(
    window: &Window,
    on_event: impl 'static + FnMut(WsEvent),
) -> Result<Rc<WsSender>, JsValue> {
    let ws_url = websocket_url(window)?;
    let socket = WebSocket::new(&ws_url)?;
    let _ = Reflect::set(
        socket.as_ref(),
        &JsValue::from_str("binaryType"),
        &JsValue::from_str("arraybuffer"),
    );

    let sender = Rc::new(WsSender {
        socket: socket.clone(),
    });

    let on_event = Rc::new(RefCell::new(on_event));

    {
        let on_event = on_event.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Open);
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let on_event = on_event.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Close);
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    {
        let on_event = on_event.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Error);
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    {
        let on_event = on_event.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            if let Some(message) = decode_message(&event) {
                on_event.borrow_mut()(WsEvent::Message(message));
            }
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    {
        let socket = socket.clone();
        let onbeforeunload = Closure::<dyn FnMut(Event)>::new(move |_| {
            let _ = socket.close();
        });
        window.add_event_listener_with_callback(
            "beforeunload",
            onbeforeunload.as_ref().unchecked_ref(),
        )?;
        onbeforeunload.forget();
    }

    Ok(sender)
}
