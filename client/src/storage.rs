use web_sys::Storage;

use cardboard_core::catalog::CardStore;

/// localStorage-backed card store. Constructed once at startup; when the
/// browser refuses storage access the editor still runs, it just cannot
/// persist.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn new(window: &web_sys::Window) -> Self {
        let storage = window.local_storage().ok().flatten();
        if storage.is_none() {
            web_sys::console::warn_1(&"localStorage unavailable, cards will not persist".into());
        }
        Self { storage }
    }
}

impl CardStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };
        if storage.set_item(key, value).is_err() {
            web_sys::console::warn_1(&format!("Failed to persist {key}").into());
        }
    }
}
