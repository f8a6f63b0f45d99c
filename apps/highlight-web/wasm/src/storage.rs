//! localStorage-backed preference store

use highlight_core::{PreferenceError, PreferenceStore};
use wasm_bindgen::JsValue;

use crate::js_error_message;

/// Preference store over `window.localStorage`.
///
/// Private browsing or disabled storage leaves `storage` empty; reads then
/// return nothing and writes report an error the caller may ignore.
pub struct LocalStoragePreference {
    storage: Option<web_sys::Storage>,
}

impl LocalStoragePreference {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, PreferenceError> {
        self.storage
            .as_ref()
            .ok_or_else(|| PreferenceError("localStorage is not available".to_string()))
    }
}

impl Default for LocalStoragePreference {
    fn default() -> Self {
        Self::new()
    }
}

fn to_preference_error(err: JsValue) -> PreferenceError {
    PreferenceError(js_error_message(&err))
}

impl PreferenceStore for LocalStoragePreference {
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        self.storage()?.get_item(key).map_err(to_preference_error)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.storage()?
            .set_item(key, value)
            .map_err(to_preference_error)
    }

    fn clear(&mut self, key: &str) -> Result<(), PreferenceError> {
        self.storage()?.remove_item(key).map_err(to_preference_error)
    }
}
