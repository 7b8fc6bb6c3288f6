use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, ClipboardEvent, DragEvent, Event,
    HtmlButtonElement, HtmlCanvasElement, HtmlElement, HtmlInputElement, KeyboardEvent,
    PointerEvent,
};

use cardboard_core::gesture::{cursor_at, pointer_down, pointer_move, pointer_up, Gesture};
use cardboard_core::scene::{PendingImage, Scene, Selection};

use crate::bitmaps::{decode_data_url, read_file_as_data_url, BitmapStore};
use crate::controls::{render_saved_list, saved_action_from_event, sync_controls, SavedAction, Ui};
use crate::dom::{client_to_canvas, event_to_canvas, get_element, set_cursor};
use crate::render::{draw_scene, CanvasMeasure};
use crate::storage::LocalStore;

struct App {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    scene: Scene,
    gesture: Gesture,
    bitmaps: BitmapStore,
    store: LocalStore,
}

fn render_all(app: &App, ui: &Ui) {
    draw_scene(&app.ctx, &app.scene, &app.bitmaps);
    sync_controls(ui, &app.scene);
    render_saved_list(ui, &app.scene.catalog, app.scene.loaded);
}

/// Decodes `src` and, once it is drawable, inserts it as a new image
/// element centered on `(center_x, center_y)`. Oversized images are
/// scaled down to 80% of the canvas width; small ones keep their
/// natural size.
fn place_image(app: &Rc<RefCell<App>>, ui: &Rc<Ui>, src: String, center_x: f64, center_y: f64) {
    let app = app.clone();
    let ui = ui.clone();
    let src_for_install = src.clone();
    decode_data_url(&src, move |image| {
        let natural_w = image.natural_width() as f64;
        let natural_h = image.natural_height() as f64;
        if natural_w <= 0.0 || natural_h <= 0.0 {
            web_sys::console::error_1(&"Decoded image has no size".into());
            return;
        }
        {
            let mut guard = app.borrow_mut();
            let App { scene, bitmaps, .. } = &mut *guard;
            let scale = (scene.canvas_width * 0.8 / natural_w).min(1.0);
            let width = natural_w * scale;
            let height = natural_h * scale;
            let index = scene.add_image(
                src_for_install.clone(),
                center_x - width / 2.0,
                center_y - height / 2.0,
                width,
                height,
            );
            let id = bitmaps.insert(image);
            scene.install_bitmap(index, &src_for_install, id);
        }
        render_all(&app.borrow(), &ui);
    });
}

/// Kicks off the decodes for image placeholders that came back from a
/// catalog load.
fn start_pending_decodes(app: &Rc<RefCell<App>>, ui: &Rc<Ui>, pending: Vec<PendingImage>) {
    for PendingImage { index, src } in pending {
        let app = app.clone();
        let ui = ui.clone();
        let src_for_install = src.clone();
        decode_data_url(&src, move |image| {
            {
                let mut guard = app.borrow_mut();
                let App { scene, bitmaps, .. } = &mut *guard;
                let id = bitmaps.insert(image);
                if !scene.install_bitmap(index, &src_for_install, id) {
                    // the scene moved on while we were decoding
                    bitmaps.prune(scene);
                    return;
                }
            }
            render_all(&app.borrow(), &ui);
        });
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    if document.ready_state() != "loading" {
        return start_app();
    }

    let onready = Closure::<dyn FnMut(Event)>::new(move |_| {
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    document
        .add_event_listener_with_callback("DOMContentLoaded", onready.as_ref().unchecked_ref())?;
    onready.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let canvas: HtmlCanvasElement = get_element(&document, "cardCanvas")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let text_input: HtmlInputElement = get_element(&document, "textInput")?;
    let font_size_input: HtmlInputElement = get_element(&document, "fontSizeInputNum")?;
    let color_input: HtmlInputElement = get_element(&document, "colorInput")?;
    let rotation_input: HtmlInputElement = get_element(&document, "rotationInput")?;
    let card_name_input: HtmlInputElement = get_element(&document, "cardNameInput")?;
    let saved_list: HtmlElement = get_element(&document, "savedCardsList")?;
    let save_card_button: HtmlButtonElement = get_element(&document, "saveCardBtn")?;
    let save_changes_button: HtmlButtonElement = get_element(&document, "saveChangesBtn")?;
    let delete_button: HtmlButtonElement = get_element(&document, "deleteBtn")?;
    let rotate_left_button: HtmlButtonElement = get_element(&document, "rotateLeftBtn")?;
    let rotate_right_button: HtmlButtonElement = get_element(&document, "rotateRightBtn")?;
    let new_card_button: HtmlButtonElement = get_element(&document, "newCardBtn")?;

    let store = LocalStore::new(&window);
    let scene = Scene::new(canvas.width() as f64, canvas.height() as f64, &store);

    let app = Rc::new(RefCell::new(App {
        canvas: canvas.clone(),
        ctx,
        scene,
        gesture: Gesture::Idle,
        bitmaps: BitmapStore::default(),
        store,
    }));
    let ui = Rc::new(Ui {
        document: document.clone(),
        text_input: text_input.clone(),
        font_size_input: font_size_input.clone(),
        color_input: color_input.clone(),
        rotation_input: rotation_input.clone(),
        card_name_input: card_name_input.clone(),
        saved_list: saved_list.clone(),
    });

    render_all(&app.borrow(), &ui);

    {
        let key_app = app.clone();
        let key_ui = ui.clone();
        let text_input_cb = text_input.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.key() != "Enter" {
                return;
            }
            event.prevent_default();
            let value = text_input_cb.value();
            if value.trim().is_empty() {
                return;
            }
            {
                let mut guard = key_app.borrow_mut();
                let App { scene, ctx, .. } = &mut *guard;
                let font_size = key_ui.font_size_input.value().parse().unwrap_or(20.0);
                let color = key_ui.color_input.value();
                let (cx, cy) = (scene.canvas_width / 2.0, scene.canvas_height / 2.0);
                scene.add_text(value, font_size, color, cx, cy);
                scene.clamp_selected_text(&CanvasMeasure { ctx });
            }
            render_all(&key_app.borrow(), &key_ui);
            text_input_cb.set_value("");
            let _ = text_input_cb.blur();
        });
        text_input
            .add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    {
        let edit_app = app.clone();
        let edit_ui = ui.clone();
        let text_input_cb = text_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            {
                let mut guard = edit_app.borrow_mut();
                let App { scene, ctx, .. } = &mut *guard;
                if !matches!(scene.selection, Selection::Text(_)) {
                    return;
                }
                scene.set_text(&text_input_cb.value());
                scene.clamp_selected_text(&CanvasMeasure { ctx });
            }
            render_all(&edit_app.borrow(), &edit_ui);
        });
        text_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let font_app = app.clone();
        let font_ui = ui.clone();
        let font_input_cb = font_size_input.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let Ok(size) = font_input_cb.value().parse::<f64>() else {
                return;
            };
            {
                let mut guard = font_app.borrow_mut();
                let App { scene, ctx, .. } = &mut *guard;
                scene.set_font_size(size);
                scene.clamp_selected_text(&CanvasMeasure { ctx });
            }
            render_all(&font_app.borrow(), &font_ui);
        });
        font_size_input
            .add_event_listener_with_callback("input", onchange.as_ref().unchecked_ref())?;
        font_size_input
            .add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let color_app = app.clone();
        let color_ui = ui.clone();
        let color_input_cb = color_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            color_app
                .borrow_mut()
                .scene
                .set_selected_color(&color_input_cb.value());
            render_all(&color_app.borrow(), &color_ui);
        });
        color_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let rotation_app = app.clone();
        let rotation_ui = ui.clone();
        let rotation_input_cb = rotation_input.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let deg = rotation_input_cb.value().parse::<f64>().unwrap_or(0.0);
            rotation_app.borrow_mut().scene.set_selected_rotation(deg);
            render_all(&rotation_app.borrow(), &rotation_ui);
        });
        rotation_input
            .add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let rotate_app = app.clone();
        let rotate_ui = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            rotate_app.borrow_mut().scene.rotate_selected(-15.0);
            render_all(&rotate_app.borrow(), &rotate_ui);
        });
        rotate_left_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let rotate_app = app.clone();
        let rotate_ui = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            rotate_app.borrow_mut().scene.rotate_selected(15.0);
            render_all(&rotate_app.borrow(), &rotate_ui);
        });
        rotate_right_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let delete_app = app.clone();
        let delete_ui = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            {
                let mut guard = delete_app.borrow_mut();
                let App { scene, bitmaps, .. } = &mut *guard;
                match scene.selection {
                    Selection::Text(index) => scene.delete_text(index),
                    Selection::Element(index) => scene.delete_element(index),
                    Selection::None => return,
                }
                bitmaps.prune(scene);
            }
            render_all(&delete_app.borrow(), &delete_ui);
        });
        delete_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let save_app = app.clone();
        let save_ui = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            {
                let mut guard = save_app.borrow_mut();
                let App { scene, store, .. } = &mut *guard;
                scene.save_card(&save_ui.card_name_input.value(), store);
            }
            render_all(&save_app.borrow(), &save_ui);
        });
        save_card_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let save_app = app.clone();
        let save_ui = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            {
                let mut guard = save_app.borrow_mut();
                let App { scene, store, .. } = &mut *guard;
                scene.save_changes(&save_ui.card_name_input.value(), store);
            }
            render_all(&save_app.borrow(), &save_ui);
        });
        save_changes_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let new_app = app.clone();
        let new_ui = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            {
                let mut guard = new_app.borrow_mut();
                let App { scene, bitmaps, .. } = &mut *guard;
                scene.new_scene();
                bitmaps.prune(scene);
            }
            new_ui.card_name_input.set_value("");
            render_all(&new_app.borrow(), &new_ui);
        });
        new_card_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let list_app = app.clone();
        let list_ui = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let action = match saved_action_from_event(&event) {
                Some(action) => action,
                None => return,
            };
            match action {
                SavedAction::Load(index) => {
                    let pending = {
                        let mut guard = list_app.borrow_mut();
                        let App { scene, bitmaps, .. } = &mut *guard;
                        let name = match scene.catalog.cards.get(index) {
                            Some(card) => card.name.clone(),
                            None => return,
                        };
                        let pending = scene.load_card(index);
                        bitmaps.prune(scene);
                        list_ui.card_name_input.set_value(&name);
                        pending
                    };
                    render_all(&list_app.borrow(), &list_ui);
                    start_pending_decodes(&list_app, &list_ui, pending);
                }
                SavedAction::Delete(index) => {
                    {
                        let mut guard = list_app.borrow_mut();
                        let App { scene, store, .. } = &mut *guard;
                        scene.delete_saved(index, store);
                    }
                    render_all(&list_app.borrow(), &list_ui);
                }
            }
        });
        saved_list.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let down_app = app.clone();
        let down_ui = ui.clone();
        let down_canvas = canvas.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            event.prevent_default();
            let (x, y) = event_to_canvas(&down_canvas, &event);
            {
                let mut guard = down_app.borrow_mut();
                let App {
                    scene,
                    gesture,
                    ctx,
                    ..
                } = &mut *guard;
                pointer_down(scene, gesture, &CanvasMeasure { ctx }, x, y);
            }
            render_all(&down_app.borrow(), &down_ui);
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let move_app = app.clone();
        let move_canvas = canvas.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let (x, y) = event_to_canvas(&move_canvas, &event);
            let mut guard = move_app.borrow_mut();
            if guard.gesture == Gesture::Idle {
                let cursor = cursor_at(&guard.scene, x, y);
                set_cursor(&guard.canvas, cursor);
                return;
            }
            let App {
                scene,
                gesture,
                ctx,
                bitmaps,
                ..
            } = &mut *guard;
            if pointer_move(scene, gesture, &CanvasMeasure { ctx }, x, y) {
                draw_scene(ctx, scene, bitmaps);
            }
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let up_app = app.clone();
        let onup = Closure::<dyn FnMut(PointerEvent)>::new(move |_| {
            pointer_up(&mut up_app.borrow_mut().gesture);
        });
        canvas.add_event_listener_with_callback("pointerup", onup.as_ref().unchecked_ref())?;
        canvas.add_event_listener_with_callback("pointerleave", onup.as_ref().unchecked_ref())?;
        onup.forget();
    }

    {
        let ondragover = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
        });
        canvas
            .add_event_listener_with_callback("dragover", ondragover.as_ref().unchecked_ref())?;
        ondragover.forget();
    }

    {
        let drop_app = app.clone();
        let drop_ui = ui.clone();
        let drop_canvas = canvas.clone();
        let ondrop = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
            let file = event
                .data_transfer()
                .and_then(|transfer| transfer.files())
                .and_then(|files| files.get(0));
            let Some(file) = file else {
                return;
            };
            if !file.type_().starts_with("image/") {
                return;
            }
            let (x, y) = client_to_canvas(
                &drop_canvas,
                event.client_x() as f64,
                event.client_y() as f64,
            );
            let app = drop_app.clone();
            let ui = drop_ui.clone();
            read_file_as_data_url(&file, move |src| place_image(&app, &ui, src, x, y));
        });
        canvas.add_event_listener_with_callback("drop", ondrop.as_ref().unchecked_ref())?;
        ondrop.forget();
    }

    {
        let paste_app = app.clone();
        let paste_ui = ui.clone();
        let onpaste = Closure::<dyn FnMut(ClipboardEvent)>::new(move |event: ClipboardEvent| {
            let Some(data) = event.clipboard_data() else {
                return;
            };
            let items = data.items();
            for index in 0..items.length() {
                let Some(item) = items.get(index) else {
                    continue;
                };
                if !item.type_().starts_with("image/") {
                    continue;
                }
                let Ok(Some(file)) = item.get_as_file() else {
                    continue;
                };
                event.prevent_default();
                let (cx, cy) = {
                    let scene = &paste_app.borrow().scene;
                    (scene.canvas_width / 2.0, scene.canvas_height / 2.0)
                };
                let app = paste_app.clone();
                let ui = paste_ui.clone();
                read_file_as_data_url(&file, move |src| place_image(&app, &ui, src, cx, cy));
                break;
            }
        });
        document.add_event_listener_with_callback("paste", onpaste.as_ref().unchecked_ref())?;
        onpaste.forget();
    }

    Ok(())
}
