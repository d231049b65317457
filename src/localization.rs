//! Message dictionaries and active-locale switching.
//!
//! Dictionary content lives outside this crate. The only contract here is
//! that switching the locale fully replaces the previous one and happens
//! before anything locale-dependent is produced.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Locale used when nothing else matches.
pub const DEFAULT_LOCALE: &str = "en";

/// `{locale: {message key: message}}`
pub type Dictionary = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("Failed to read message dictionary {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Message dictionary {path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Receiver of locale switches.
pub trait Localizer: Send {
    /// Merge `messages` into the loaded dictionaries.
    fn load_messages(&mut self, messages: Dictionary);

    /// Make `code` the active locale, replacing the previous one.
    fn apply_locale(&mut self, code: &str);

    fn active_locale(&self) -> &str;
}

/// In-process dictionary store.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    dictionaries: Dictionary,
    active: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            dictionaries: HashMap::new(),
            active: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Dictionary) -> Self {
        let mut catalog = Self::new();
        catalog.load_messages(messages);
        catalog
    }

    /// Load a JSON dictionary file.
    pub fn from_json_file(path: &Path) -> Result<Self, LocalizationError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LocalizationError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let messages: Dictionary =
            serde_json::from_str(&contents).map_err(|source| LocalizationError::Decode {
                path: path.display().to_string(),
                source,
            })?;
        tracing::info!(
            "Loaded {} locale dictionaries from {}",
            messages.len(),
            path.display()
        );
        Ok(Self::with_messages(messages))
    }

    /// Look up `key` for the active locale.
    ///
    /// Falls back to the primary language subtag (`de` for `de-CH`), then to
    /// the default locale.
    pub fn format_message(&self, key: &str) -> Option<&str> {
        let primary = self.active.split(['-', '_']).next().unwrap_or(&self.active);
        [self.active.as_str(), primary, DEFAULT_LOCALE]
            .into_iter()
            .filter_map(|locale| self.dictionaries.get(locale))
            .find_map(|messages| messages.get(key))
            .map(String::as_str)
    }
}

impl Localizer for MessageCatalog {
    fn load_messages(&mut self, messages: Dictionary) {
        for (locale, entries) in messages {
            self.dictionaries.entry(locale).or_default().extend(entries);
        }
    }

    fn apply_locale(&mut self, code: &str) {
        let code = code.trim().to_lowercase();
        if code != self.active {
            tracing::info!("Switching locale {} -> {}", self.active, code);
        }
        self.active = code;
    }

    fn active_locale(&self) -> &str {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dictionary() -> Dictionary {
        let mut en = HashMap::new();
        en.insert("Save".to_string(), "Save".to_string());
        en.insert("Cancel".to_string(), "Cancel".to_string());
        let mut de = HashMap::new();
        de.insert("Save".to_string(), "Speichern".to_string());
        let mut dict = HashMap::new();
        dict.insert("en".to_string(), en);
        dict.insert("de".to_string(), de);
        dict
    }

    #[test]
    fn test_switch_replaces_previous_locale() {
        let mut catalog = MessageCatalog::with_messages(dictionary());
        catalog.apply_locale("de");
        assert_eq!(catalog.format_message("Save"), Some("Speichern"));
        catalog.apply_locale("en");
        assert_eq!(catalog.active_locale(), "en");
        assert_eq!(catalog.format_message("Save"), Some("Save"));
    }

    #[test]
    fn test_fallback_chain() {
        let mut catalog = MessageCatalog::with_messages(dictionary());
        catalog.apply_locale("DE-ch");
        assert_eq!(catalog.active_locale(), "de-ch");
        assert_eq!(catalog.format_message("Save"), Some("Speichern"));
        assert_eq!(catalog.format_message("Cancel"), Some("Cancel"));
        assert_eq!(catalog.format_message("Missing"), None);
    }

    #[test]
    fn test_repeated_loads_merge() {
        let mut catalog = MessageCatalog::with_messages(dictionary());
        let mut extra = HashMap::new();
        extra.insert(
            "de".to_string(),
            HashMap::from([("Cancel".to_string(), "Abbrechen".to_string())]),
        );
        catalog.load_messages(extra);
        catalog.apply_locale("de");
        assert_eq!(catalog.format_message("Save"), Some("Speichern"));
        assert_eq!(catalog.format_message("Cancel"), Some("Abbrechen"));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"nl": {{"Save": "Opslaan"}}}}"#).unwrap();

        let mut catalog = MessageCatalog::from_json_file(file.path()).unwrap();
        catalog.apply_locale("nl");
        assert_eq!(catalog.format_message("Save"), Some("Opslaan"));

        let missing = MessageCatalog::from_json_file(Path::new("/nonexistent/messages.json"));
        assert!(matches!(missing, Err(LocalizationError::Read { .. })));
    }
}
