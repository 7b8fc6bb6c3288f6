use serde::{Deserialize, Serialize};

use crate::scene::{Element, TextItem};

/// Single storage key under which the whole serialized catalog lives.
pub const STORAGE_KEY: &str = "cardboard.savedCards";

/// Key-value blob store consumed by the catalog. The client backs this
/// with localStorage; tests use an in-memory map.
pub trait CardStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// A persisted, named snapshot of a scene plus the canvas size it was
/// authored at. Image elements carry only their portable `src` string
/// here; decoded bitmaps never reach storage.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SavedCard {
    pub name: String,
    pub texts: Vec<TextItem>,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub canvas_width: Option<f64>,
    #[serde(default)]
    pub canvas_height: Option<f64>,
}

impl SavedCard {
    /// Title shown in the saved list: the card name, else the card's text
    /// contents joined together, else a placeholder.
    pub fn title(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.clone();
        }
        if self.texts.is_empty() {
            return "(empty card)".to_string();
        }
        self.texts
            .iter()
            .map(|item| item.text.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Ordered, index-addressed collection of saved cards. Loaded once at
/// scene construction and flushed in full after every mutation.
#[derive(Default, Debug)]
pub struct Catalog {
    pub cards: Vec<SavedCard>,
}

impl Catalog {
    /// Absent or unparsable data yields an empty catalog; this never
    /// fails.
    pub fn load(store: &dyn CardStore) -> Self {
        let cards = store
            .get(STORAGE_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { cards }
    }

    fn flush(&self, store: &dyn CardStore) {
        if let Ok(raw) = serde_json::to_string(&self.cards) {
            store.set(STORAGE_KEY, &raw);
        }
    }

    pub fn append(&mut self, card: SavedCard, store: &dyn CardStore) {
        self.cards.push(card);
        self.flush(store);
    }

    pub fn update(&mut self, index: usize, card: SavedCard, store: &dyn CardStore) {
        if let Some(slot) = self.cards.get_mut(index) {
            *slot = card;
            self.flush(store);
        }
    }

    pub fn delete(&mut self, index: usize, store: &dyn CardStore) {
        if index < self.cards.len() {
            self.cards.remove(index);
            self.flush(store);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemStore;
    use super::*;
    use crate::scene::TextItem;

    fn card(name: &str) -> SavedCard {
        SavedCard {
            name: name.to_string(),
            texts: Vec::new(),
            elements: Vec::new(),
            canvas_width: Some(800.0),
            canvas_height: Some(600.0),
        }
    }

    fn text(content: &str) -> TextItem {
        TextItem {
            text: content.to_string(),
            font_size: 20.0,
            color: "#000".to_string(),
            x: 100.0,
            y: 100.0,
            rotation: 0.0,
        }
    }

    #[test]
    fn absent_data_yields_empty_catalog() {
        let store = MemStore::default();
        assert!(Catalog::load(&store).cards.is_empty());
    }

    #[test]
    fn corrupt_data_yields_empty_catalog() {
        let store = MemStore::with_entry(STORAGE_KEY, "{not json");
        assert!(Catalog::load(&store).cards.is_empty());
    }

    #[test]
    fn append_persists_and_reloads() {
        let store = MemStore::default();
        let mut catalog = Catalog::load(&store);
        catalog.append(card("Card A"), &store);

        let reloaded = Catalog::load(&store);
        assert_eq!(reloaded.cards.len(), 1);
        assert_eq!(reloaded.cards[0].name, "Card A");
        assert_eq!(reloaded.cards[0].canvas_width, Some(800.0));
    }

    #[test]
    fn update_replaces_entry_in_place() {
        let store = MemStore::default();
        let mut catalog = Catalog::load(&store);
        catalog.append(card("before"), &store);
        catalog.update(0, card("after"), &store);
        catalog.update(7, card("ignored"), &store);

        let reloaded = Catalog::load(&store);
        assert_eq!(reloaded.cards.len(), 1);
        assert_eq!(reloaded.cards[0].name, "after");
    }

    #[test]
    fn delete_removes_and_persists() {
        let store = MemStore::default();
        let mut catalog = Catalog::load(&store);
        catalog.append(card("a"), &store);
        catalog.append(card("b"), &store);
        catalog.delete(0, &store);
        catalog.delete(9, &store);

        let reloaded = Catalog::load(&store);
        assert_eq!(reloaded.cards.len(), 1);
        assert_eq!(reloaded.cards[0].name, "b");
    }

    #[test]
    fn title_prefers_name_then_texts_then_placeholder() {
        let mut named = card("Birthday");
        named.texts.push(text("Hello"));
        assert_eq!(named.title(), "Birthday");

        let mut unnamed = card("");
        unnamed.texts.push(text("Hello"));
        unnamed.texts.push(text("World"));
        assert_eq!(unnamed.title(), "Hello | World");

        assert_eq!(card("  ").title(), "(empty card)");
    }

    #[test]
    fn missing_canvas_size_deserializes_as_none() {
        let raw = r#"[{"name":"legacy","texts":[],"elements":[]}]"#;
        let store = MemStore::with_entry(STORAGE_KEY, raw);
        let catalog = Catalog::load(&store);
        assert_eq!(catalog.cards.len(), 1);
        assert_eq!(catalog.cards[0].canvas_width, None);
        assert_eq!(catalog.cards[0].canvas_height, None);
    }
}
