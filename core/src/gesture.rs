//! Hit-testing and the drag / resize gesture state machine.
//!
//! Pointer-down priority, first match wins: text items topmost-first,
//! then any element's resize handle, then element bodies topmost-first.
//! Bodies are tested against their axis-aligned box; rotation is ignored
//! for hit purposes, and the handle stays axis-aligned even when the
//! element body is rotated.

use crate::geometry::{clamp, point_in_box, point_in_centered_box, MeasureText};
use crate::scene::{Element, Scene, Selection};

/// Side of the square resize handle anchored at an element's
/// bottom-right corner.
pub const HANDLE_SIZE: f64 = 12.0;

/// Smallest extent a resize gesture can shrink an element to.
pub const MIN_ELEMENT_SIZE: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Text(usize),
    Handle(usize),
    Body(usize),
    Miss,
}

/// At most one gesture is in flight; pointer-up or leaving the canvas
/// returns to `Idle` unconditionally.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    DragText {
        offset_x: f64,
        offset_y: f64,
    },
    DragElement {
        offset_x: f64,
        offset_y: f64,
    },
    ResizeElement,
}

/// Advisory hover feedback; changes no state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
    Resize,
    Grab,
    Crosshair,
}

impl Cursor {
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Resize => "nwse-resize",
            Cursor::Grab => "grab",
            Cursor::Crosshair => "crosshair",
        }
    }
}

fn handle_contains(element: &Element, x: f64, y: f64) -> bool {
    let hx = element.x() + element.width();
    let hy = element.y() + element.height();
    point_in_box(
        x,
        y,
        hx - HANDLE_SIZE,
        hy - HANDLE_SIZE,
        HANDLE_SIZE,
        HANDLE_SIZE,
    )
}

fn body_contains(element: &Element, x: f64, y: f64) -> bool {
    point_in_box(
        x,
        y,
        element.x(),
        element.y(),
        element.width(),
        element.height(),
    )
}

pub fn hit_test(scene: &Scene, measure: &dyn MeasureText, x: f64, y: f64) -> Hit {
    for index in (0..scene.texts.len()).rev() {
        let item = &scene.texts[index];
        let width = measure.text_width(&item.text, item.font_size);
        if point_in_centered_box(x, y, item.x, item.y, width, item.font_size) {
            return Hit::Text(index);
        }
    }
    for (index, element) in scene.elements.iter().enumerate() {
        if handle_contains(element, x, y) {
            return Hit::Handle(index);
        }
    }
    for index in (0..scene.elements.len()).rev() {
        if body_contains(&scene.elements[index], x, y) {
            return Hit::Body(index);
        }
    }
    Hit::Miss
}

/// Resolves the pointer target, updates the selection exclusively, and
/// starts the matching gesture. A miss clears the selection.
pub fn pointer_down(
    scene: &mut Scene,
    gesture: &mut Gesture,
    measure: &dyn MeasureText,
    x: f64,
    y: f64,
) -> Hit {
    let hit = hit_test(scene, measure, x, y);
    match hit {
        Hit::Text(index) => {
            scene.selection = Selection::Text(index);
            let item = &scene.texts[index];
            *gesture = Gesture::DragText {
                offset_x: x - item.x,
                offset_y: y - item.y,
            };
        }
        Hit::Handle(index) => {
            scene.selection = Selection::Element(index);
            *gesture = Gesture::ResizeElement;
        }
        Hit::Body(index) => {
            scene.selection = Selection::Element(index);
            let element = &scene.elements[index];
            *gesture = Gesture::DragElement {
                offset_x: x - element.x(),
                offset_y: y - element.y(),
            };
        }
        Hit::Miss => {
            scene.selection = Selection::None;
            *gesture = Gesture::Idle;
        }
    }
    hit
}

/// Advances the active gesture. Returns whether the scene changed.
pub fn pointer_move(
    scene: &mut Scene,
    gesture: &Gesture,
    measure: &dyn MeasureText,
    x: f64,
    y: f64,
) -> bool {
    match *gesture {
        Gesture::DragText { offset_x, offset_y } => {
            let Selection::Text(index) = scene.selection else {
                return false;
            };
            let (cw, ch) = (scene.canvas_width, scene.canvas_height);
            let Some(item) = scene.texts.get_mut(index) else {
                return false;
            };
            let half_width = measure.text_width(&item.text, item.font_size) / 2.0;
            let half_height = item.font_size / 2.0;
            item.x = clamp(x - offset_x, half_width, cw - half_width);
            item.y = clamp(y - offset_y, half_height, ch - half_height);
            true
        }
        Gesture::DragElement { offset_x, offset_y } => {
            let Selection::Element(index) = scene.selection else {
                return false;
            };
            let (cw, ch) = (scene.canvas_width, scene.canvas_height);
            let Some(element) = scene.elements.get_mut(index) else {
                return false;
            };
            let nx = clamp(x - offset_x, 0.0, cw - element.width());
            let ny = clamp(y - offset_y, 0.0, ch - element.height());
            element.set_position(nx, ny);
            true
        }
        Gesture::ResizeElement => {
            let Selection::Element(index) = scene.selection else {
                return false;
            };
            let (cw, ch) = (scene.canvas_width, scene.canvas_height);
            let Some(element) = scene.elements.get_mut(index) else {
                return false;
            };
            let width = clamp(x - element.x(), MIN_ELEMENT_SIZE, cw - element.x());
            let height = clamp(y - element.y(), MIN_ELEMENT_SIZE, ch - element.y());
            element.set_size(width, height);
            true
        }
        Gesture::Idle => false,
    }
}

pub fn pointer_up(gesture: &mut Gesture) {
    *gesture = Gesture::Idle;
}

/// Hover cursor: resize over a handle, grab over a body, crosshair
/// otherwise. Text items leave the cursor alone.
pub fn cursor_at(scene: &Scene, x: f64, y: f64) -> Cursor {
    if scene
        .elements
        .iter()
        .any(|element| handle_contains(element, x, y))
    {
        return Cursor::Resize;
    }
    if scene
        .elements
        .iter()
        .any(|element| body_contains(element, x, y))
    {
        return Cursor::Grab;
    }
    Cursor::Crosshair
}
