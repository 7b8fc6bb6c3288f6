use serde::{Deserialize, Serialize};

use crate::catalog::{CardStore, Catalog, SavedCard};
use crate::geometry::{clamp, MeasureText};

pub const DEFAULT_COLOR: &str = "#000";
pub const DEFAULT_CARD_NAME: &str = "Untitled";

/// A text label anchored at its center, unlike elements which anchor at
/// their top-left corner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub font_size: f64,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Bar,
    Arrow,
}

/// Opaque handle into the client's table of decoded bitmaps. Transient:
/// never serialized, reassigned on every decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitmapId(pub u64);

/// A graphic element. Anchor is the top-left corner plus a size.
///
/// An image starts out as a placeholder: `src` identifies it, `bitmap`
/// stays `None` until the asynchronous decode lands, and the render
/// projection skips it until then.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Image {
        src: String,
        #[serde(skip)]
        bitmap: Option<BitmapId>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rotation: f64,
        color: String,
    },
    Shape {
        kind: ShapeKind,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rotation: f64,
        filled: bool,
        color: String,
    },
}

impl Element {
    pub fn x(&self) -> f64 {
        match self {
            Element::Image { x, .. } | Element::Shape { x, .. } => *x,
        }
    }

    pub fn y(&self) -> f64 {
        match self {
            Element::Image { y, .. } | Element::Shape { y, .. } => *y,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Element::Image { width, .. } | Element::Shape { width, .. } => *width,
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            Element::Image { height, .. } | Element::Shape { height, .. } => *height,
        }
    }

    pub fn rotation(&self) -> f64 {
        match self {
            Element::Image { rotation, .. } | Element::Shape { rotation, .. } => *rotation,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            Element::Image { color, .. } | Element::Shape { color, .. } => color,
        }
    }

    pub fn set_position(&mut self, nx: f64, ny: f64) {
        match self {
            Element::Image { x, y, .. } | Element::Shape { x, y, .. } => {
                *x = nx;
                *y = ny;
            }
        }
    }

    pub fn set_size(&mut self, w: f64, h: f64) {
        match self {
            Element::Image { width, height, .. } | Element::Shape { width, height, .. } => {
                *width = w;
                *height = h;
            }
        }
    }

    pub fn set_rotation(&mut self, deg: f64) {
        match self {
            Element::Image { rotation, .. } | Element::Shape { rotation, .. } => *rotation = deg,
        }
    }

    pub fn set_color(&mut self, value: &str) {
        match self {
            Element::Image { color, .. } | Element::Shape { color, .. } => {
                *color = value.to_string();
            }
        }
    }

    fn rescale(&mut self, sx: f64, sy: f64) {
        match self {
            Element::Image {
                x,
                y,
                width,
                height,
                ..
            }
            | Element::Shape {
                x,
                y,
                width,
                height,
                ..
            } => {
                *x *= sx;
                *width *= sx;
                *y *= sy;
                *height *= sy;
            }
        }
    }
}

/// At most one item is selected at a time; the enum makes the text /
/// element exclusivity structural.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Text(usize),
    Element(usize),
}

#[derive(Clone, Debug)]
pub struct ShapeOptions {
    pub rotation: f64,
    pub filled: bool,
    pub color: String,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            filled: false,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// An image element restored from the catalog that still needs its
/// bitmap decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingImage {
    pub index: usize,
    pub src: String,
}

/// The live, editable document: text items, graphic elements, selection
/// state, plus the catalog of saved cards and the index of the catalog
/// entry the scene was loaded from (if any).
pub struct Scene {
    pub texts: Vec<TextItem>,
    pub elements: Vec<Element>,
    pub selection: Selection,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub catalog: Catalog,
    pub loaded: Option<usize>,
}

impl Scene {
    pub fn new(canvas_width: f64, canvas_height: f64, store: &dyn CardStore) -> Self {
        Self {
            texts: Vec::new(),
            elements: Vec::new(),
            selection: Selection::None,
            canvas_width,
            canvas_height,
            catalog: Catalog::load(store),
            loaded: None,
        }
    }

    // Text operations. Selection-scoped setters silently do nothing when
    // no text is selected; stale indices are routine, not errors.

    pub fn add_text(&mut self, text: String, font_size: f64, color: String, x: f64, y: f64) {
        self.texts.push(TextItem {
            text,
            font_size,
            color,
            x,
            y,
            rotation: 0.0,
        });
        self.selection = Selection::Text(self.texts.len() - 1);
    }

    pub fn select_text(&mut self, index: usize) {
        if index < self.texts.len() {
            self.selection = Selection::Text(index);
        }
    }

    pub fn selected_text(&self) -> Option<&TextItem> {
        match self.selection {
            Selection::Text(index) => self.texts.get(index),
            _ => None,
        }
    }

    fn selected_text_mut(&mut self) -> Option<&mut TextItem> {
        match self.selection {
            Selection::Text(index) => self.texts.get_mut(index),
            _ => None,
        }
    }

    pub fn set_text(&mut self, text: &str) {
        if let Some(item) = self.selected_text_mut() {
            item.text = text.to_string();
        }
    }

    pub fn set_font_size(&mut self, size: f64) {
        if let Some(item) = self.selected_text_mut() {
            item.font_size = size;
        }
    }

    pub fn set_color(&mut self, color: &str) {
        if let Some(item) = self.selected_text_mut() {
            item.color = color.to_string();
        }
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        if let Some(item) = self.selected_text_mut() {
            item.x = x;
            item.y = y;
        }
    }

    pub fn set_text_rotation(&mut self, deg: f64) {
        if let Some(item) = self.selected_text_mut() {
            item.rotation = deg;
        }
    }

    pub fn delete_text(&mut self, index: usize) {
        if index >= self.texts.len() {
            return;
        }
        self.texts.remove(index);
        match self.selection {
            Selection::Text(selected) if selected == index => self.selection = Selection::None,
            Selection::Text(selected) if selected > index => {
                self.selection = Selection::Text(selected - 1);
            }
            _ => {}
        }
    }

    // Element operations.

    pub fn add_image(&mut self, src: String, x: f64, y: f64, width: f64, height: f64) -> usize {
        self.elements.push(Element::Image {
            src,
            bitmap: None,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            color: DEFAULT_COLOR.to_string(),
        });
        let index = self.elements.len() - 1;
        self.selection = Selection::Element(index);
        self.clamp_element(index);
        index
    }

    /// Decode completion: installs the bitmap if `index` still refers to
    /// the image it was started for, then re-clamps (geometry may be
    /// stale after a rescale-on-load). Returns whether anything changed.
    pub fn install_bitmap(&mut self, index: usize, src: &str, id: BitmapId) -> bool {
        match self.elements.get_mut(index) {
            Some(Element::Image {
                src: existing,
                bitmap,
                ..
            }) if existing == src => {
                *bitmap = Some(id);
                self.clamp_element(index);
                true
            }
            _ => false,
        }
    }

    pub fn add_shape(
        &mut self,
        kind: ShapeKind,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        options: ShapeOptions,
    ) -> usize {
        self.elements.push(Element::Shape {
            kind,
            x,
            y,
            width,
            height,
            rotation: options.rotation,
            filled: options.filled,
            color: options.color,
        });
        let index = self.elements.len() - 1;
        self.selection = Selection::Element(index);
        self.clamp_element(index);
        index
    }

    pub fn delete_element(&mut self, index: usize) {
        if index >= self.elements.len() {
            return;
        }
        self.elements.remove(index);
        match self.selection {
            Selection::Element(selected) if selected == index => self.selection = Selection::None,
            Selection::Element(selected) if selected > index => {
                self.selection = Selection::Element(selected - 1);
            }
            _ => {}
        }
    }

    pub fn selected_element(&self) -> Option<&Element> {
        match self.selection {
            Selection::Element(index) => self.elements.get(index),
            _ => None,
        }
    }

    pub fn set_element_position(&mut self, index: usize, x: f64, y: f64) {
        if let Some(element) = self.elements.get_mut(index) {
            element.set_position(x, y);
            self.clamp_element(index);
        }
    }

    pub fn set_element_size(&mut self, index: usize, width: f64, height: f64) {
        if let Some(element) = self.elements.get_mut(index) {
            element.set_size(width, height);
            self.clamp_element(index);
        }
    }

    pub fn set_element_rotation(&mut self, index: usize, deg: f64) {
        if let Some(element) = self.elements.get_mut(index) {
            element.set_rotation(deg);
        }
    }

    pub fn set_element_color(&mut self, index: usize, color: &str) {
        if let Some(element) = self.elements.get_mut(index) {
            element.set_color(color);
        }
    }

    // Selection-dispatched controls: rotation applies to whichever of
    // text / element is selected, color too.

    pub fn rotate_selected(&mut self, delta: f64) {
        match self.selection {
            Selection::Text(index) => {
                if let Some(item) = self.texts.get_mut(index) {
                    item.rotation += delta;
                }
            }
            Selection::Element(index) => {
                if let Some(element) = self.elements.get_mut(index) {
                    let rotation = element.rotation();
                    element.set_rotation(rotation + delta);
                }
            }
            Selection::None => {}
        }
    }

    pub fn set_selected_rotation(&mut self, deg: f64) {
        match self.selection {
            Selection::Text(index) => {
                if let Some(item) = self.texts.get_mut(index) {
                    item.rotation = deg;
                }
            }
            Selection::Element(index) => {
                if let Some(element) = self.elements.get_mut(index) {
                    element.set_rotation(deg);
                }
            }
            Selection::None => {}
        }
    }

    pub fn selected_rotation(&self) -> Option<f64> {
        match self.selection {
            Selection::Text(index) => self.texts.get(index).map(|item| item.rotation),
            Selection::Element(index) => self.elements.get(index).map(Element::rotation),
            Selection::None => None,
        }
    }

    pub fn set_selected_color(&mut self, color: &str) {
        match self.selection {
            Selection::Text(index) => {
                if let Some(item) = self.texts.get_mut(index) {
                    item.color = color.to_string();
                }
            }
            Selection::Element(index) => {
                if let Some(element) = self.elements.get_mut(index) {
                    element.set_color(color);
                }
            }
            Selection::None => {}
        }
    }

    // Clamping. Elements stay fully on-canvas; text anchors stay within
    // half the measured extent of each edge.

    pub fn clamp_element(&mut self, index: usize) {
        let (cw, ch) = (self.canvas_width, self.canvas_height);
        if let Some(element) = self.elements.get_mut(index) {
            let width = element.width().min(cw);
            let height = element.height().min(ch);
            element.set_size(width, height);
            let x = clamp(element.x(), 0.0, cw - width);
            let y = clamp(element.y(), 0.0, ch - height);
            element.set_position(x, y);
        }
    }

    pub fn clamp_text(&mut self, index: usize, measure: &dyn MeasureText) {
        let (cw, ch) = (self.canvas_width, self.canvas_height);
        if let Some(item) = self.texts.get_mut(index) {
            let half_width = measure.text_width(&item.text, item.font_size) / 2.0;
            let half_height = item.font_size / 2.0;
            item.x = clamp(item.x, half_width, cw - half_width);
            item.y = clamp(item.y, half_height, ch - half_height);
        }
    }

    pub fn clamp_selected_text(&mut self, measure: &dyn MeasureText) {
        if let Selection::Text(index) = self.selection {
            self.clamp_text(index, measure);
        }
    }

    pub fn clamp_all(&mut self, measure: &dyn MeasureText) {
        for index in 0..self.elements.len() {
            self.clamp_element(index);
        }
        for index in 0..self.texts.len() {
            self.clamp_text(index, measure);
        }
    }

    // Catalog operations. Every mutation flushes the whole catalog.

    /// Deep-copy snapshot of the live scene: bitmap handles stripped,
    /// current canvas size attached.
    pub fn snapshot(&self, name: &str) -> SavedCard {
        let name = name.trim();
        let name = if name.is_empty() {
            DEFAULT_CARD_NAME
        } else {
            name
        };
        let mut elements = self.elements.clone();
        for element in &mut elements {
            if let Element::Image { bitmap, .. } = element {
                *bitmap = None;
            }
        }
        SavedCard {
            name: name.to_string(),
            texts: self.texts.clone(),
            elements,
            canvas_width: Some(self.canvas_width),
            canvas_height: Some(self.canvas_height),
        }
    }

    /// Appends the snapshot; the new entry becomes the loaded one so a
    /// following "save changes" updates it instead of duplicating.
    pub fn save_card(&mut self, name: &str, store: &dyn CardStore) {
        let card = self.snapshot(name);
        self.catalog.append(card, store);
        self.loaded = Some(self.catalog.cards.len() - 1);
    }

    /// Replaces the loaded catalog entry, or appends when the scene was
    /// never loaded from (or its entry was deleted).
    pub fn save_changes(&mut self, name: &str, store: &dyn CardStore) {
        let card = self.snapshot(name);
        match self.loaded {
            Some(index) if index < self.catalog.cards.len() => {
                self.catalog.update(index, card, store);
            }
            _ => {
                self.catalog.append(card, store);
                self.loaded = Some(self.catalog.cards.len() - 1);
            }
        }
    }

    /// Removes a catalog entry. If it was the loaded one the linkage is
    /// cleared, so subsequent edits become an unsaved new card instead of
    /// overwriting a different entry.
    pub fn delete_saved(&mut self, index: usize, store: &dyn CardStore) {
        if index >= self.catalog.cards.len() {
            return;
        }
        self.catalog.delete(index, store);
        match self.loaded {
            Some(loaded) if loaded == index => self.loaded = None,
            Some(loaded) if loaded > index => self.loaded = Some(loaded - 1),
            _ => {}
        }
    }

    /// Restores a catalog entry into the live scene. Texts come back
    /// verbatim with the first one selected; element geometry is rescaled
    /// when the card was authored at a different canvas size, then
    /// clamped right away. Image elements come back as placeholders; the
    /// returned list tells the caller which decodes to start.
    pub fn load_card(&mut self, index: usize) -> Vec<PendingImage> {
        let Some(card) = self.catalog.cards.get(index).cloned() else {
            return Vec::new();
        };
        self.texts = card.texts;
        self.elements = card.elements;

        let sx = match card.canvas_width {
            Some(saved) if saved > 0.0 && saved != self.canvas_width => self.canvas_width / saved,
            _ => 1.0,
        };
        let sy = match card.canvas_height {
            Some(saved) if saved > 0.0 && saved != self.canvas_height => self.canvas_height / saved,
            _ => 1.0,
        };
        if sx != 1.0 || sy != 1.0 {
            for element in &mut self.elements {
                element.rescale(sx, sy);
            }
        }
        for element_index in 0..self.elements.len() {
            self.clamp_element(element_index);
        }

        self.selection = if self.texts.is_empty() {
            Selection::None
        } else {
            Selection::Text(0)
        };
        self.loaded = Some(index);

        self.elements
            .iter()
            .enumerate()
            .filter_map(|(element_index, element)| match element {
                Element::Image {
                    src, bitmap: None, ..
                } => Some(PendingImage {
                    index: element_index,
                    src: src.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn new_scene(&mut self) {
        self.texts.clear();
        self.elements.clear();
        self.selection = Selection::None;
        self.loaded = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::MemStore;
    use crate::geometry::MonospaceMeasure;

    fn scene(store: &MemStore) -> Scene {
        Scene::new(800.0, 600.0, store)
    }

    fn add_rect(scene: &mut Scene, x: f64, y: f64, w: f64, h: f64) -> usize {
        scene.add_shape(ShapeKind::Rect, x, y, w, h, ShapeOptions::default())
    }

    #[test]
    fn add_text_selects_it() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("Hello".into(), 20.0, "#000".into(), 100.0, 100.0);
        assert_eq!(scene.selection, Selection::Text(0));
        assert_eq!(scene.selected_text().unwrap().rotation, 0.0);
    }

    #[test]
    fn adding_an_element_replaces_a_text_selection() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("Hello".into(), 20.0, "#000".into(), 100.0, 100.0);
        add_rect(&mut scene, 10.0, 10.0, 50.0, 30.0);
        assert_eq!(scene.selection, Selection::Element(0));
    }

    #[test]
    fn text_setters_are_noops_without_a_text_selection() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.set_text("ghost");
        scene.set_font_size(99.0);
        scene.set_position(1.0, 2.0);
        assert!(scene.texts.is_empty());

        add_rect(&mut scene, 10.0, 10.0, 50.0, 30.0);
        scene.set_text("still a ghost");
        assert!(scene.texts.is_empty());
    }

    #[test]
    fn shape_defaults_are_unfilled_black_unrotated() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        let index = add_rect(&mut scene, 10.0, 10.0, 50.0, 30.0);
        let element = &scene.elements[index];
        assert_eq!(element.rotation(), 0.0);
        assert_eq!(element.color(), DEFAULT_COLOR);
        assert!(matches!(
            element,
            Element::Shape { filled: false, .. }
        ));
    }

    #[test]
    fn delete_element_clears_or_shifts_selection() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        add_rect(&mut scene, 0.0, 0.0, 20.0, 20.0);
        add_rect(&mut scene, 30.0, 30.0, 20.0, 20.0);
        add_rect(&mut scene, 60.0, 60.0, 20.0, 20.0);

        // selection at 2; deleting below shifts it to keep the same item
        scene.delete_element(0);
        assert_eq!(scene.selection, Selection::Element(1));
        assert_eq!(scene.elements[1].x(), 60.0);

        // deleting the selected item clears the selection
        scene.delete_element(1);
        assert_eq!(scene.selection, Selection::None);

        // deleting above an earlier selection leaves it alone
        add_rect(&mut scene, 90.0, 90.0, 20.0, 20.0);
        scene.selection = Selection::Element(0);
        scene.delete_element(1);
        assert_eq!(scene.selection, Selection::Element(0));
    }

    #[test]
    fn delete_text_maintains_the_same_invariant() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("a".into(), 20.0, "#000".into(), 100.0, 100.0);
        scene.add_text("b".into(), 20.0, "#000".into(), 200.0, 200.0);

        scene.delete_text(0);
        assert_eq!(scene.selection, Selection::Text(0));
        assert_eq!(scene.selected_text().unwrap().text, "b");

        scene.delete_text(0);
        assert_eq!(scene.selection, Selection::None);

        scene.delete_text(5);
        assert!(scene.texts.is_empty());
    }

    #[test]
    fn indexed_element_setters_ignore_invalid_indices() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.set_element_position(0, 5.0, 5.0);
        scene.set_element_size(3, 40.0, 40.0);
        scene.set_element_rotation(1, 45.0);
        scene.set_element_color(2, "#f00");
        assert!(scene.elements.is_empty());
    }

    #[test]
    fn element_mutations_stay_clamped_on_canvas() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        let index = add_rect(&mut scene, 10.0, 10.0, 50.0, 30.0);
        scene.set_element_position(index, 790.0, 590.0);
        let element = &scene.elements[index];
        assert_eq!(element.x(), 750.0);
        assert_eq!(element.y(), 570.0);

        scene.set_element_size(index, 2000.0, 2000.0);
        let element = &scene.elements[index];
        assert_eq!(element.width(), 800.0);
        assert_eq!(element.height(), 600.0);
        assert_eq!(element.x(), 0.0);
        assert_eq!(element.y(), 0.0);
    }

    #[test]
    fn clamping_is_idempotent() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        let measure = MonospaceMeasure::default();
        add_rect(&mut scene, 795.0, -20.0, 50.0, 30.0);
        scene.add_text("Hello".into(), 20.0, "#000".into(), -50.0, 700.0);

        scene.clamp_all(&measure);
        let once: Vec<_> = scene
            .elements
            .iter()
            .map(|e| (e.x(), e.y(), e.width(), e.height()))
            .collect();
        let text_once = (scene.texts[0].x, scene.texts[0].y);

        scene.clamp_all(&measure);
        let twice: Vec<_> = scene
            .elements
            .iter()
            .map(|e| (e.x(), e.y(), e.width(), e.height()))
            .collect();
        assert_eq!(once, twice);
        assert_eq!(text_once, (scene.texts[0].x, scene.texts[0].y));
        assert_eq!(text_once, (30.0, 590.0));
    }

    #[test]
    fn rotation_controls_follow_the_selection() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.rotate_selected(15.0); // nothing selected: no-op

        scene.add_text("spin".into(), 20.0, "#000".into(), 100.0, 100.0);
        scene.rotate_selected(-15.0);
        scene.rotate_selected(-15.0);
        assert_eq!(scene.selected_rotation(), Some(-30.0));

        add_rect(&mut scene, 10.0, 10.0, 50.0, 30.0);
        scene.set_selected_rotation(90.0);
        assert_eq!(scene.elements[0].rotation(), 90.0);
        assert_eq!(scene.texts[0].rotation, -30.0);
    }

    #[test]
    fn color_control_reaches_texts_and_elements() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("c".into(), 20.0, "#000".into(), 100.0, 100.0);
        scene.set_selected_color("#123456");
        assert_eq!(scene.texts[0].color, "#123456");

        add_rect(&mut scene, 10.0, 10.0, 50.0, 30.0);
        scene.set_selected_color("#abcdef");
        assert_eq!(scene.elements[0].color(), "#abcdef");
        assert_eq!(scene.texts[0].color, "#123456");
    }

    #[test]
    fn install_bitmap_checks_index_and_src() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        let index = scene.add_image("data:image/png;base64,AA".into(), 10.0, 10.0, 100.0, 80.0);

        assert!(!scene.install_bitmap(index, "data:other", BitmapId(1)));
        assert!(!scene.install_bitmap(index + 1, "data:image/png;base64,AA", BitmapId(1)));
        assert!(scene.install_bitmap(index, "data:image/png;base64,AA", BitmapId(1)));
        assert!(matches!(
            scene.elements[index],
            Element::Image {
                bitmap: Some(BitmapId(1)),
                ..
            }
        ));
    }

    #[test]
    fn snapshot_strips_bitmaps_and_records_canvas_size() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        let index = scene.add_image("data:uri".into(), 10.0, 10.0, 100.0, 80.0);
        scene.install_bitmap(index, "data:uri", BitmapId(7));

        let card = scene.snapshot("");
        assert_eq!(card.name, DEFAULT_CARD_NAME);
        assert_eq!(card.canvas_width, Some(800.0));
        assert_eq!(card.canvas_height, Some(600.0));
        assert!(matches!(
            card.elements[0],
            Element::Image { bitmap: None, .. }
        ));
        // the live scene keeps its decoded bitmap
        assert!(matches!(
            scene.elements[0],
            Element::Image {
                bitmap: Some(BitmapId(7)),
                ..
            }
        ));
    }

    #[test]
    fn save_then_load_round_trips_a_text_card() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("Hello".into(), 20.0, "#000".into(), 100.0, 100.0);
        scene.save_card("Card A", &store);

        scene.new_scene();
        assert!(scene.texts.is_empty());
        assert_eq!(scene.loaded, None);

        let pending = scene.load_card(0);
        assert!(pending.is_empty());
        assert_eq!(scene.texts.len(), 1);
        let item = &scene.texts[0];
        assert_eq!(item.text, "Hello");
        assert_eq!(item.font_size, 20.0);
        assert_eq!(item.color, "#000");
        assert_eq!(item.rotation, 0.0);
        assert_eq!(scene.selection, Selection::Text(0));
        assert_eq!(scene.loaded, Some(0));
    }

    #[test]
    fn catalog_survives_a_fresh_store_reload() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("Hello".into(), 20.0, "#000".into(), 100.0, 100.0);
        scene.save_card("Card A", &store);

        // a brand-new scene loads the persisted catalog from scratch
        let fresh = Scene::new(800.0, 600.0, &store);
        assert_eq!(fresh.catalog.cards.len(), 1);
        assert_eq!(fresh.catalog.cards[0].name, "Card A");
        assert_eq!(fresh.catalog.cards[0].texts[0].text, "Hello");
    }

    #[test]
    fn loading_into_a_double_size_canvas_doubles_element_geometry() {
        let store = MemStore::default();
        let mut authored = Scene::new(400.0, 300.0, &store);
        add_rect(&mut authored, 10.0, 10.0, 50.0, 30.0);
        authored.save_card("rect", &store);

        let mut doubled = Scene::new(800.0, 600.0, &store);
        doubled.load_card(0);
        let element = &doubled.elements[0];
        assert_eq!(
            (element.x(), element.y(), element.width(), element.height()),
            (20.0, 20.0, 100.0, 60.0)
        );

        // same-size load leaves geometry untouched
        let mut same = Scene::new(400.0, 300.0, &store);
        same.load_card(0);
        let element = &same.elements[0];
        assert_eq!(
            (element.x(), element.y(), element.width(), element.height()),
            (10.0, 10.0, 50.0, 30.0)
        );
    }

    #[test]
    fn loaded_elements_are_reclamped_immediately() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        // legacy card: no recorded canvas size, so no rescale happens,
        // and its geometry does not fit this canvas
        let card = SavedCard {
            name: "legacy".to_string(),
            texts: Vec::new(),
            elements: vec![Element::Shape {
                kind: ShapeKind::Rect,
                x: 700.0,
                y: 500.0,
                width: 900.0,
                height: 200.0,
                rotation: 0.0,
                filled: false,
                color: DEFAULT_COLOR.to_string(),
            }],
            canvas_width: None,
            canvas_height: None,
        };
        scene.catalog.append(card, &store);

        scene.load_card(0);
        let element = &scene.elements[0];
        assert_eq!(element.width(), 800.0);
        assert_eq!(element.x(), 0.0);
        assert_eq!(element.y(), 400.0);
    }

    #[test]
    fn load_reports_pending_images_and_resets_selection() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        let index = scene.add_image("data:img".into(), 10.0, 10.0, 100.0, 80.0);
        scene.install_bitmap(index, "data:img", BitmapId(3));
        scene.save_card("pic", &store);

        let pending = scene.load_card(0);
        assert_eq!(
            pending,
            vec![PendingImage {
                index: 0,
                src: "data:img".to_string(),
            }]
        );
        // no texts: element selection is reset to none, not restored
        assert_eq!(scene.selection, Selection::None);
        assert!(matches!(
            scene.elements[0],
            Element::Image { bitmap: None, .. }
        ));
    }

    #[test]
    fn deleting_the_loaded_card_clears_the_linkage() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("only".into(), 20.0, "#000".into(), 100.0, 100.0);
        scene.save_card("only", &store);
        assert_eq!(scene.loaded, Some(0));

        scene.delete_saved(0, &store);
        assert!(scene.catalog.cards.is_empty());
        assert_eq!(scene.loaded, None);

        // with the linkage gone, save-changes appends instead of updating
        scene.save_changes("again", &store);
        assert_eq!(scene.catalog.cards.len(), 1);
        assert_eq!(scene.loaded, Some(0));
    }

    #[test]
    fn deleting_below_the_loaded_card_shifts_the_linkage() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.save_card("first", &store);
        scene.save_card("second", &store);
        assert_eq!(scene.loaded, Some(1));

        scene.delete_saved(0, &store);
        assert_eq!(scene.loaded, Some(0));
        assert_eq!(scene.catalog.cards[0].name, "second");
    }

    #[test]
    fn save_changes_updates_the_loaded_entry_in_place() {
        let store = MemStore::default();
        let mut scene = scene(&store);
        scene.add_text("v1".into(), 20.0, "#000".into(), 100.0, 100.0);
        scene.save_card("draft", &store);

        scene.set_text("v2");
        scene.save_changes("draft", &store);
        assert_eq!(scene.catalog.cards.len(), 1);
        assert_eq!(scene.catalog.cards[0].texts[0].text, "v2");
    }
}
