use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Element, Event, HtmlButtonElement, HtmlCanvasElement,
    HtmlInputElement, PointerEvent,
};

use chalkline_shared::agent::ToolMode;
use chalkline_shared::wire::MAX_STROKE_WIDTH;

use crate::dom::{
    event_to_point, fit_canvas_to_window, get_element, set_status, set_tool_button,
    sync_history_buttons,
};
use crate::render::BrowserCanvas;
use crate::state::State;
use crate::ws::{connect_ws, WsEvent};

fn document_ready_state(document: &web_sys::Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn parse_width(input: &HtmlInputElement) -> Option<f32> {
    let width = input.value().trim().parse::<f32>().ok()?;
    (width.is_finite() && width > 0.0 && width <= MAX_STROKE_WIDTH).then_some(width)
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let canvas: HtmlCanvasElement = get_element(&document, "board")?;
    let status_el: Element = get_element(&document, "status")?;
    let status_text: Element = get_element(&document, "status-text")?;
    let undo_button: HtmlButtonElement = get_element(&document, "undo")?;
    let redo_button: HtmlButtonElement = get_element(&document, "redo")?;
    let eraser_button: HtmlButtonElement = get_element(&document, "eraser")?;
    let pen_color_input: HtmlInputElement = get_element(&document, "pen-color")?;
    let pen_width_input: HtmlInputElement = get_element(&document, "pen-width")?;
    let eraser_width_input: HtmlInputElement = get_element(&document, "eraser-width")?;

    fit_canvas_to_window(&window, &canvas)?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let state = Rc::new(RefCell::new(State::new(BrowserCanvas::new(
        canvas.clone(),
        ctx,
    ))));
    {
        let mut guard = state.borrow_mut();
        let tool = guard.session.tool_mut();
        tool.pen_color = pen_color_input.value();
        if let Some(width) = parse_width(&pen_width_input) {
            tool.pen_width = width;
        }
        if let Some(width) = parse_width(&eraser_width_input) {
            tool.eraser_width = width;
        }
        sync_history_buttons(&guard.session, &undo_button, &redo_button);
    }
    {
        let settle_state = Rc::downgrade(&state);
        let settle_undo = undo_button.clone();
        let settle_redo = redo_button.clone();
        state.borrow().canvas.set_on_settled(move || {
            let Some(state) = settle_state.upgrade() else {
                return;
            };
            let mut guard = state.borrow_mut();
            let (session, canvas) = guard.split();
            session.settle(&*canvas);
            sync_history_buttons(session, &settle_undo, &settle_redo);
        });
    }
    set_tool_button(&eraser_button, false);
    set_status(&status_el, &status_text, "connecting", "Connecting...");

    let sender = {
        let state = state.clone();
        let undo_button = undo_button.clone();
        let redo_button = redo_button.clone();
        connect_ws(&window, move |event| match event {
            WsEvent::Open => set_status(&status_el, &status_text, "open", "Connected"),
            WsEvent::Close => set_status(&status_el, &status_text, "closed", "Disconnected"),
            WsEvent::Error => set_status(&status_el, &status_text, "error", "Connection error"),
            WsEvent::Message(message) => {
                let kind = message.kind();
                let mut guard = state.borrow_mut();
                let (session, canvas) = guard.split();
                if let Err(error) = session.handle_event(message, canvas) {
                    web_sys::console::warn_1(&format!("Skipped {kind} event: {error}").into());
                }
                session.settle(&*canvas);
                sync_history_buttons(session, &undo_button, &redo_button);
            }
        })?
    };

    {
        let down_state = state.clone();
        let down_sender = sender.clone();
        let down_canvas = canvas.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            event.prevent_default();
            let Some(point) = event_to_point(&down_canvas, &event) else {
                return;
            };
            let _ = down_canvas.set_pointer_capture(event.pointer_id());
            down_state
                .borrow_mut()
                .session
                .pointer_down(point, &*down_sender);
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let move_state = state.clone();
        let move_sender = sender.clone();
        let move_canvas = canvas.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let mut guard = move_state.borrow_mut();
            if !guard.session.is_drawing() {
                return;
            }
            event.prevent_default();
            if let Some(point) = event_to_point(&move_canvas, &event) {
                guard.session.pointer_move(point, &*move_sender);
            }
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let stop_state = state.clone();
        let stop_canvas = canvas.clone();
        let stop_undo = undo_button.clone();
        let stop_redo = redo_button.clone();
        let onstop = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if stop_canvas.has_pointer_capture(event.pointer_id()) {
                let _ = stop_canvas.release_pointer_capture(event.pointer_id());
            }
            let mut guard = stop_state.borrow_mut();
            let (session, canvas) = guard.split();
            session.pointer_up(&*canvas);
            sync_history_buttons(session, &stop_undo, &stop_redo);
        });
        canvas.add_event_listener_with_callback("pointerup", onstop.as_ref().unchecked_ref())?;
        canvas
            .add_event_listener_with_callback("pointercancel", onstop.as_ref().unchecked_ref())?;
        onstop.forget();
    }

    for (button, forward) in [(undo_button.clone(), false), (redo_button.clone(), true)] {
        let click_state = state.clone();
        let click_sender = sender.clone();
        let click_undo = undo_button.clone();
        let click_redo = redo_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mut guard = click_state.borrow_mut();
            let (session, canvas) = guard.split();
            if forward {
                session.redo(canvas, &*click_sender);
            } else {
                session.undo(canvas, &*click_sender);
            }
            sync_history_buttons(session, &click_undo, &click_redo);
        });
        button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let eraser_state = state.clone();
        let eraser_button_cb = eraser_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mode = eraser_state.borrow_mut().session.tool_mut().toggle_eraser();
            set_tool_button(&eraser_button_cb, mode == ToolMode::Eraser);
        });
        eraser_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let color_state = state.clone();
        let color_input = pen_color_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            let color = color_input.value();
            if color.is_empty() {
                return;
            }
            color_state.borrow_mut().session.tool_mut().pen_color = color;
        });
        pen_color_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    for (input, eraser) in [(pen_width_input, false), (eraser_width_input, true)] {
        let width_state = state.clone();
        let width_input = input.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let Some(width) = parse_width(&width_input) else {
                return;
            };
            let mut guard = width_state.borrow_mut();
            let tool = guard.session.tool_mut();
            if eraser {
                tool.eraser_width = width;
            } else {
                tool.pen_width = width;
            }
        });
        input.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    Ok(())
}
