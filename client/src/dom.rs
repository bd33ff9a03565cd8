use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlCanvasElement, PointerEvent, Window};

use chalkline_shared::agent::BoardSession;
use chalkline_shared::StrokePoint;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn set_tool_button(button: &HtmlButtonElement, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
}

pub fn sync_history_buttons(
    session: &BoardSession,
    undo_button: &HtmlButtonElement,
    redo_button: &HtmlButtonElement,
) {
    undo_button.set_disabled(!session.history().can_undo());
    redo_button.set_disabled(!session.history().can_redo());
}

pub fn set_status(status_el: &Element, status_text: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_text.set_text_content(Some(text));
}

/// Sizes the backing store to the window. Resizing wipes the raster, so this
/// only runs before the session records its blank snapshot.
pub fn fit_canvas_to_window(window: &Window, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    canvas.set_width(width.max(1.0) as u32);
    canvas.set_height(height.max(1.0) as u32);
    Ok(())
}

/// Maps a pointer event to canvas pixel space.
pub fn event_to_point(canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<StrokePoint> {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let scale_x = canvas.width() as f64 / rect.width();
    let scale_y = canvas.height() as f64 / rect.height();
    let x = (event.client_x() as f64 - rect.left()) * scale_x;
    let y = (event.client_y() as f64 - rect.top()) * scale_y;
    let point = StrokePoint::new(x as f32, y as f32);
    point.validate().ok().map(|_| point)
}
