use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, HtmlElement, PointerEvent};

use cardboard_core::gesture::Cursor;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

/// Maps client (viewport) coordinates into canvas coordinates, accounting
/// for CSS scaling of the fixed-size backing store.
pub fn client_to_canvas(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return (0.0, 0.0);
    }
    let scale_x = canvas.width() as f64 / rect.width();
    let scale_y = canvas.height() as f64 / rect.height();
    (
        (client_x - rect.left()) * scale_x,
        (client_y - rect.top()) * scale_y,
    )
}

pub fn event_to_canvas(canvas: &HtmlCanvasElement, event: &PointerEvent) -> (f64, f64) {
    client_to_canvas(canvas, event.client_x() as f64, event.client_y() as f64)
}

pub fn set_cursor(canvas: &HtmlCanvasElement, cursor: Cursor) {
    if let Ok(element) = canvas.clone().dyn_into::<HtmlElement>() {
        let _ = element.style().set_property("cursor", cursor.css());
    }
}
