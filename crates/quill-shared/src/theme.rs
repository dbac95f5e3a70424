//! Theme preference controller.
//!
//! A headless state machine for the two-valued UI theme. The browser pieces
//! (preference storage and the document) are passed in behind traits, so the
//! controller behaves identically compiled to WASM or driven from native
//! tests. Storage faults are logged and swallowed: the theme still applies
//! in memory for the session.

use thiserror::Error;

/// Storage key for the persisted preference.
pub const THEME_STORAGE_KEY: &str = "quill.theme";

/// Deprecated theme names and the canonical theme each resolves to. An
/// explicit table so a new alias is one added row, not new control flow.
const LEGACY_ALIASES: &[(&str, &str)] = &[("midnight", "dark")];

/// The canonical themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Classic,
    Dark,
}

impl Theme {
    pub const DEFAULT: Theme = Theme::Classic;

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Classic => Theme::Dark,
            Theme::Dark => Theme::Classic,
        }
    }

    /// Resolve a raw name to a canonical theme, accepting legacy aliases.
    pub fn resolve(name: &str) -> Option<Theme> {
        let canonical = LEGACY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, target)| *target)
            .unwrap_or(name);
        match canonical {
            "classic" => Some(Theme::Classic),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Failure talking to the durable preference store.
#[derive(Debug, Error)]
#[error("preference storage unavailable: {0}")]
pub struct StoreError(pub String);

/// One durable string value under a fixed key.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// The UI context the controller mutates: the document-level theme
/// attribute plus two optional dependent elements. Implementations must
/// treat a missing toggle control or label as a no-op, not an error.
pub trait ThemeSurface {
    /// Current document theme attribute, if one is set.
    fn document_theme(&self) -> Option<String>;

    /// Write the document theme attribute.
    fn apply_theme(&mut self, name: &str);

    /// Reflect the active theme on the toggle control's checked state.
    fn set_toggle_checked(&mut self, checked: bool);

    /// Reflect the active theme name on the text label.
    fn set_toggle_label(&mut self, name: &str);
}

/// Determines, applies and persists the UI theme.
pub struct ThemeController<S, D> {
    store: S,
    surface: D,
}

impl<S: PreferenceStore, D: ThemeSurface> ThemeController<S, D> {
    /// Wire up the controller and run [`initialize`](Self::initialize).
    pub fn attach(store: S, surface: D) -> Self {
        let mut controller = Self { store, surface };
        controller.initialize();
        controller
    }

    /// Determine the active theme and apply it, in order of precedence:
    /// a persisted preference (legacy aliases rewritten to canonical form),
    /// an already-applied document attribute, then the default. A persisted
    /// value that resolves to nothing valid is cleared.
    pub fn initialize(&mut self) {
        if let Some(theme) = self.stored_theme() {
            self.apply(theme);
            return;
        }
        if let Some(theme) = self
            .surface
            .document_theme()
            .as_deref()
            .and_then(Theme::resolve)
        {
            self.apply(theme);
            return;
        }
        self.apply(Theme::DEFAULT);
    }

    /// Flip the theme: read the current document attribute, normalize it
    /// through the same alias resolution (an unreadable attribute counts as
    /// the default), apply and persist the other canonical theme.
    pub fn toggle(&mut self) {
        let current = self
            .surface
            .document_theme()
            .as_deref()
            .and_then(Theme::resolve)
            .unwrap_or(Theme::DEFAULT);
        let next = current.toggled();
        self.apply(next);
        self.persist(next);
    }

    /// Keyboard activation of the toggle control. Returns `true` when the
    /// key toggled the theme, in which case the caller must suppress the
    /// default browser action.
    pub fn handle_key(&mut self, key: &str) -> bool {
        match key {
            " " | "Spacebar" | "Enter" => {
                self.toggle();
                true
            }
            _ => false,
        }
    }

    /// Pointer activation of the toggle control; the caller likewise
    /// suppresses the default action.
    pub fn handle_click(&mut self) {
        self.toggle();
    }

    /// The theme currently applied to the document.
    pub fn active_theme(&self) -> Theme {
        self.surface
            .document_theme()
            .as_deref()
            .and_then(Theme::resolve)
            .unwrap_or(Theme::DEFAULT)
    }

    /// Read and normalize the persisted preference. A value that only
    /// resolved through a legacy alias is rewritten in canonical form;
    /// an unresolvable value is removed.
    fn stored_theme(&mut self) -> Option<Theme> {
        let raw = match self.store.get(THEME_STORAGE_KEY) {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!(error = %e, "theme preference read failed");
                return None;
            }
        };
        match Theme::resolve(&raw) {
            Some(theme) => {
                if raw != theme.as_str() {
                    self.persist(theme);
                }
                Some(theme)
            }
            None => {
                if let Err(e) = self.store.remove(THEME_STORAGE_KEY) {
                    tracing::warn!(error = %e, "stale theme preference removal failed");
                }
                None
            }
        }
    }

    fn apply(&mut self, theme: Theme) {
        self.surface.apply_theme(theme.as_str());
        self.surface.set_toggle_checked(theme == Theme::Dark);
        self.surface.set_toggle_label(theme.as_str());
    }

    fn persist(&mut self, theme: Theme) {
        if let Err(e) = self.store.set(THEME_STORAGE_KEY, theme.as_str()) {
            tracing::warn!(error = %e, "theme preference write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        values: HashMap<String, String>,
    }

    impl PreferenceStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            self.values.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.values.remove(key);
            Ok(())
        }
    }

    /// Storage that fails every call, like a browser with storage disabled.
    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError("quota exceeded".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError("quota exceeded".into()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError("quota exceeded".into()))
        }
    }

    #[derive(Default)]
    struct FakeSurface {
        attribute: Option<String>,
        checked: Option<bool>,
        label: Option<String>,
    }

    impl ThemeSurface for FakeSurface {
        fn document_theme(&self) -> Option<String> {
            self.attribute.clone()
        }

        fn apply_theme(&mut self, name: &str) {
            self.attribute = Some(name.to_string());
        }

        fn set_toggle_checked(&mut self, checked: bool) {
            self.checked = Some(checked);
        }

        fn set_toggle_label(&mut self, name: &str) {
            self.label = Some(name.to_string());
        }
    }

    fn stored(value: &str) -> MemoryStore {
        let mut store = MemoryStore::default();
        store
            .values
            .insert(THEME_STORAGE_KEY.to_string(), value.to_string());
        store
    }

    #[test]
    fn initialize_defaults_to_classic() {
        let controller = ThemeController::attach(MemoryStore::default(), FakeSurface::default());
        assert_eq!(controller.active_theme(), Theme::Classic);
        assert_eq!(controller.surface.checked, Some(false));
        assert_eq!(controller.surface.label.as_deref(), Some("classic"));
    }

    #[test]
    fn initialize_prefers_persisted_preference() {
        let mut surface = FakeSurface::default();
        surface.attribute = Some("classic".to_string());
        let controller = ThemeController::attach(stored("dark"), surface);
        assert_eq!(controller.active_theme(), Theme::Dark);
        assert_eq!(controller.surface.checked, Some(true));
    }

    #[test]
    fn initialize_rewrites_legacy_alias_to_canonical() {
        let controller = ThemeController::attach(stored("midnight"), FakeSurface::default());
        assert_eq!(controller.active_theme(), Theme::Dark);
        assert_eq!(
            controller.store.values.get(THEME_STORAGE_KEY).map(String::as_str),
            Some("dark")
        );
    }

    #[test]
    fn initialize_clears_unresolvable_preference() {
        let controller = ThemeController::attach(stored("sepia"), FakeSurface::default());
        assert_eq!(controller.active_theme(), Theme::Classic);
        assert!(!controller.store.values.contains_key(THEME_STORAGE_KEY));
    }

    #[test]
    fn initialize_falls_back_to_document_attribute() {
        let mut surface = FakeSurface::default();
        surface.attribute = Some("dark".to_string());
        let controller = ThemeController::attach(MemoryStore::default(), surface);
        assert_eq!(controller.active_theme(), Theme::Dark);
        // Nothing persisted: only interaction and alias rewriting write.
        assert!(controller.store.values.is_empty());
    }

    #[test]
    fn toggle_twice_returns_to_the_original_theme() {
        let mut controller =
            ThemeController::attach(MemoryStore::default(), FakeSurface::default());
        assert_eq!(controller.active_theme(), Theme::Classic);

        controller.toggle();
        assert_eq!(controller.active_theme(), Theme::Dark);
        assert_eq!(
            controller.store.values.get(THEME_STORAGE_KEY).map(String::as_str),
            Some("dark")
        );

        controller.toggle();
        assert_eq!(controller.active_theme(), Theme::Classic);
        assert_eq!(
            controller.store.values.get(THEME_STORAGE_KEY).map(String::as_str),
            Some("classic")
        );
    }

    #[test]
    fn toggle_normalizes_a_legacy_attribute() {
        let mut surface = FakeSurface::default();
        surface.attribute = Some("midnight".to_string());
        let mut controller = ThemeController {
            store: MemoryStore::default(),
            surface,
        };
        // midnight normalizes to dark, so toggling lands on classic.
        controller.toggle();
        assert_eq!(controller.active_theme(), Theme::Classic);
    }

    #[test]
    fn toggle_treats_unreadable_attribute_as_default() {
        let mut surface = FakeSurface::default();
        surface.attribute = Some("garbage".to_string());
        let mut controller = ThemeController {
            store: MemoryStore::default(),
            surface,
        };
        controller.toggle();
        assert_eq!(controller.active_theme(), Theme::Dark);
    }

    #[test]
    fn keyboard_activation_consumes_space_and_enter_only() {
        let mut controller =
            ThemeController::attach(MemoryStore::default(), FakeSurface::default());

        assert!(controller.handle_key(" "));
        assert_eq!(controller.active_theme(), Theme::Dark);

        assert!(controller.handle_key("Enter"));
        assert_eq!(controller.active_theme(), Theme::Classic);

        assert!(!controller.handle_key("Tab"));
        assert!(!controller.handle_key("a"));
        assert_eq!(controller.active_theme(), Theme::Classic);
    }

    #[test]
    fn storage_failure_degrades_to_in_memory_theme() {
        let mut controller = ThemeController::attach(BrokenStore, FakeSurface::default());
        assert_eq!(controller.active_theme(), Theme::Classic);

        controller.toggle();
        assert_eq!(controller.active_theme(), Theme::Dark);
        assert_eq!(controller.surface.checked, Some(true));
    }

    #[test]
    fn alias_table_resolution() {
        assert_eq!(Theme::resolve("classic"), Some(Theme::Classic));
        assert_eq!(Theme::resolve("dark"), Some(Theme::Dark));
        assert_eq!(Theme::resolve("midnight"), Some(Theme::Dark));
        assert_eq!(Theme::resolve(""), None);
        assert_eq!(Theme::resolve("DARK"), None);
    }
}
