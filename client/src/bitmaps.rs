use std::collections::HashMap;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{File, FileReader, HtmlImageElement, ProgressEvent};

use cardboard_core::scene::{BitmapId, Element, Scene};

/// Client-side table of decoded images. The scene only holds opaque
/// [`BitmapId`] handles; the actual `HtmlImageElement`s live here.
#[derive(Default)]
pub struct BitmapStore {
    next: u64,
    images: HashMap<BitmapId, HtmlImageElement>,
}

impl BitmapStore {
    pub fn insert(&mut self, image: HtmlImageElement) -> BitmapId {
        let id = BitmapId(self.next);
        self.next += 1;
        self.images.insert(id, image);
        id
    }

    pub fn get(&self, id: BitmapId) -> Option<&HtmlImageElement> {
        self.images.get(&id)
    }

    /// Drops table entries no longer referenced by the scene. Called after
    /// operations that replace the element list wholesale.
    pub fn prune(&mut self, scene: &Scene) {
        self.images.retain(|id, _| {
            scene.elements.iter().any(|element| {
                matches!(element, Element::Image { bitmap: Some(live), .. } if live == id)
            })
        });
    }
}

/// Starts an asynchronous decode of a data-URI image. `done` runs once
/// the image is usable for drawing; a failed decode logs and drops the
/// callback.
pub fn decode_data_url(src: &str, done: impl FnOnce(HtmlImageElement) + 'static) {
    let image = match HtmlImageElement::new() {
        Ok(image) => image,
        Err(err) => {
            web_sys::console::error_1(&err);
            return;
        }
    };

    let image_cb = image.clone();
    let onload = Closure::once(move || done(image_cb));
    image.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    let onerror = Closure::once(move || {
        web_sys::console::error_1(&"Image decode failed".into());
    });
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    image.set_src(src);
}

/// Reads a dropped or pasted file into a data-URI string.
pub fn read_file_as_data_url(file: &File, done: impl FnOnce(String) + 'static) {
    let reader = match FileReader::new() {
        Ok(reader) => reader,
        Err(err) => {
            web_sys::console::error_1(&err);
            return;
        }
    };

    let onload = Closure::once(move |event: ProgressEvent| {
        let src = event
            .target()
            .and_then(|target| target.dyn_into::<FileReader>().ok())
            .and_then(|reader| reader.result().ok())
            .and_then(|value| value.as_string());
        match src {
            Some(src) => done(src),
            None => web_sys::console::error_1(&"File read produced no data URL".into()),
        }
    });
    reader.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    if let Err(err) = reader.read_as_data_url(file) {
        web_sys::console::error_1(&err);
    }
}
