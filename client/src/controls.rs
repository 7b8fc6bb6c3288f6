use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement, HtmlInputElement, Node};

use cardboard_core::catalog::Catalog;
use cardboard_core::scene::{Scene, Selection};

pub enum SavedAction {
    Load(usize),
    Delete(usize),
}

/// The sidebar controls, looked up once at startup.
pub struct Ui {
    pub document: Document,
    pub text_input: HtmlInputElement,
    pub font_size_input: HtmlInputElement,
    pub color_input: HtmlInputElement,
    pub rotation_input: HtmlInputElement,
    pub card_name_input: HtmlInputElement,
    pub saved_list: HtmlElement,
}

/// Rebuilds the saved-card list. Each entry carries `data-action` /
/// `data-index` attributes; a single click listener on the container
/// resolves them.
pub fn render_saved_list(ui: &Ui, catalog: &Catalog, loaded: Option<usize>) {
    ui.saved_list.set_inner_html("");
    for (index, card) in catalog.cards.iter().enumerate() {
        let Ok(entry_el) = ui.document.create_element("div") else {
            continue;
        };
        let Ok(entry) = entry_el.dyn_into::<HtmlElement>() else {
            continue;
        };
        let class_name = if loaded == Some(index) {
            "saved-card active"
        } else {
            "saved-card"
        };
        let _ = entry.set_attribute("class", class_name);

        if let Ok(title) = ui.document.create_element("span") {
            let _ = title.set_attribute("class", "saved-card-title");
            title.set_text_content(Some(&card.title()));
            let _ = entry.append_child(&title);
        }
        if let Ok(load_el) = ui.document.create_element("button") {
            if let Ok(load_button) = load_el.dyn_into::<HtmlButtonElement>() {
                let _ = load_button.set_attribute("type", "button");
                let _ = load_button.set_attribute("data-action", "load");
                let _ = load_button.set_attribute("data-index", &index.to_string());
                load_button.set_text_content(Some("Load"));
                let _ = entry.append_child(&load_button);
            }
        }
        if let Ok(delete_el) = ui.document.create_element("button") {
            if let Ok(delete_button) = delete_el.dyn_into::<HtmlButtonElement>() {
                let _ = delete_button.set_attribute("type", "button");
                let _ = delete_button.set_attribute("data-action", "delete");
                let _ = delete_button.set_attribute("data-index", &index.to_string());
                delete_button.set_text_content(Some("Delete"));
                let _ = entry.append_child(&delete_button);
            }
        }
        let _ = ui.saved_list.append_child(&entry);
    }
}

pub fn saved_action_from_event(event: &Event) -> Option<SavedAction> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let (Some(action), Some(index)) = (
            element.get_attribute("data-action"),
            element.get_attribute("data-index"),
        ) {
            let index = index.parse::<usize>().ok()?;
            return match action.as_str() {
                "load" => Some(SavedAction::Load(index)),
                "delete" => Some(SavedAction::Delete(index)),
                _ => None,
            };
        }
        current = element.parent_element();
    }
    None
}

fn has_focus(document: &Document, input: &HtmlInputElement) -> bool {
    let Some(active) = document.active_element() else {
        return false;
    };
    let active: Node = active.into();
    let input: &Node = input.as_ref();
    input.is_same_node(Some(&active))
}

/// Pushes the selected item's properties into the sidebar inputs. The
/// text field is left alone while the user is typing in it, so syncing
/// never fights the caret.
pub fn sync_controls(ui: &Ui, scene: &Scene) {
    match scene.selection {
        Selection::Text(_) => {
            let Some(item) = scene.selected_text() else {
                return;
            };
            if !has_focus(&ui.document, &ui.text_input) {
                ui.text_input.set_value(&item.text);
            }
            ui.font_size_input.set_value(&item.font_size.to_string());
            ui.color_input.set_value(&item.color);
            ui.rotation_input.set_value(&item.rotation.to_string());
        }
        Selection::Element(_) => {
            let Some(element) = scene.selected_element() else {
                return;
            };
            ui.color_input.set_value(element.color());
            ui.rotation_input.set_value(&element.rotation().to_string());
        }
        Selection::None => {
            ui.rotation_input.set_value("0");
        }
    }
}
