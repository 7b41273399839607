//! Shared, live-updatable style configuration.
//!
//! A [`ConfigRegistry`] owns the one live [`StyleConfig`] for the process, loads and persists it
//! through a [`SettingsStore`], and pushes every new snapshot to its registered observers
//! (normally one [`DecorationManager`](crate::DecorationManager) per open view).
//!
//! The registry only holds [`Weak`] handles: observers own their own lifetime and unregister on
//! drop. Everything runs on the host's UI thread, so interior mutability is `Cell`/`RefCell`
//! based and the registry is `!Send`.
//!
//! # Example
//!
//! ```rust
//! use blackspace_core::{ConfigObserver, ConfigRegistry, MemorySettingsStore, StyleConfig};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Seen(Vec<bool>);
//!
//! impl ConfigObserver for Seen {
//!     fn config_changed(&mut self, config: &StyleConfig) {
//!         self.0.push(config.trim_on_save);
//!     }
//! }
//!
//! let registry = ConfigRegistry::new(MemorySettingsStore::new());
//! let seen = Rc::new(RefCell::new(Seen::default()));
//! registry.register(&seen);
//!
//! let mut config = registry.config();
//! config.trim_on_save = true;
//! registry.apply(config).unwrap();
//!
//! assert_eq!(seen.borrow().0, vec![false, true]);
//! ```

use crate::settings::{SettingsStore, StoreError};
use crate::style::{BrushSettings, Color, StyleConfig};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Name of the settings collection every key lives in.
pub const SETTINGS_COLLECTION: &str = "BlackSpace";

/// Persisted property names.
pub mod keys {
    /// Fill color of trailing-space overlays.
    pub const SPACES_BACKGROUND_COLOR: &str = "SpacesBackgroundColor";
    /// Border color of trailing-space overlays.
    pub const SPACES_BORDER_COLOR: &str = "SpacesBorderColor";
    /// Border thickness of trailing-space overlays.
    pub const SPACES_BORDER_THICKNESS: &str = "SpacesBorderThickness";
    /// Fill color of trailing-tab overlays.
    pub const TABS_BACKGROUND_COLOR: &str = "TabsBackgroundColor";
    /// Border color of trailing-tab overlays.
    pub const TABS_BORDER_COLOR: &str = "TabsBorderColor";
    /// Border thickness of trailing-tab overlays.
    pub const TABS_BORDER_THICKNESS: &str = "TabsBorderThickness";
    /// Trim trailing whitespace when saving.
    pub const TRIM_ON_SAVE: &str = "DeleteWhiteSpaceWhenSaving";

    /// Every key, in persistence order.
    pub const ALL: [&str; 7] = [
        SPACES_BACKGROUND_COLOR,
        SPACES_BORDER_COLOR,
        SPACES_BORDER_THICKNESS,
        TABS_BACKGROUND_COLOR,
        TABS_BORDER_COLOR,
        TABS_BORDER_THICKNESS,
        TRIM_ON_SAVE,
    ];
}

/// Receives every new configuration snapshot.
pub trait ConfigObserver {
    /// Called on registration and after every [`ConfigRegistry::apply`] or
    /// [`ConfigRegistry::load`].
    fn config_changed(&mut self, config: &StyleConfig);
}

/// Handle returned by [`ConfigRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

struct ObserverEntry {
    id: ObserverId,
    observer: Weak<RefCell<dyn ConfigObserver>>,
}

/// Owner of the live [`StyleConfig`].
pub struct ConfigRegistry {
    store: RefCell<Box<dyn SettingsStore>>,
    config: Cell<StyleConfig>,
    observers: RefCell<Vec<ObserverEntry>>,
    next_observer_id: Cell<u64>,
}

impl ConfigRegistry {
    /// Create a registry over `store` and load the current configuration.
    ///
    /// If the settings collection does not exist yet it is created and seeded with the defaults.
    pub fn new(store: impl SettingsStore + 'static) -> Self {
        let registry = Self {
            store: RefCell::new(Box::new(store)),
            config: Cell::new(StyleConfig::default()),
            observers: RefCell::new(Vec::new()),
            next_observer_id: Cell::new(1),
        };
        registry.seed_defaults();
        registry.load();
        registry
    }

    /// The current configuration snapshot.
    pub fn config(&self) -> StyleConfig {
        self.config.get()
    }

    /// Re-read every field from the store and broadcast the result.
    ///
    /// Fields that are missing or fail to parse fall back to their defaults. Never fails.
    pub fn load(&self) -> StyleConfig {
        let defaults = StyleConfig::default();
        let config = {
            let guard = self.store.borrow();
            let store: &dyn SettingsStore = &**guard;
            StyleConfig {
                spaces: BrushSettings {
                    background: read_color(
                        store,
                        keys::SPACES_BACKGROUND_COLOR,
                        defaults.spaces.background,
                    ),
                    border: read_color(store, keys::SPACES_BORDER_COLOR, defaults.spaces.border),
                    border_thickness: read_thickness(
                        store,
                        keys::SPACES_BORDER_THICKNESS,
                        defaults.spaces.border_thickness,
                    ),
                },
                tabs: BrushSettings {
                    background: read_color(
                        store,
                        keys::TABS_BACKGROUND_COLOR,
                        defaults.tabs.background,
                    ),
                    border: read_color(store, keys::TABS_BORDER_COLOR, defaults.tabs.border),
                    border_thickness: read_thickness(
                        store,
                        keys::TABS_BORDER_THICKNESS,
                        defaults.tabs.border_thickness,
                    ),
                },
                trim_on_save: read_bool(store, keys::TRIM_ON_SAVE, defaults.trim_on_save),
            }
        };

        self.config.set(config);
        self.notify_observers();
        config
    }

    /// Persist `config`, make it the live snapshot and push it to every observer.
    ///
    /// The snapshot is replaced and broadcast even if persisting fails; the first write error
    /// is returned afterwards.
    pub fn apply(&self, config: StyleConfig) -> Result<(), StoreError> {
        let config = config.normalized();
        let persisted = self.persist(&config);

        self.config.set(config);
        self.notify_observers();

        if let Err(err) = &persisted {
            tracing::warn!(error = %err, "failed to persist settings, keeping them for this session");
        }
        persisted
    }

    /// Add `observer` and immediately push the current snapshot to it.
    ///
    /// Registering the same observer twice returns the existing id. An observer that is
    /// borrowed at the time is not pushed to; it is expected to compare against
    /// [`ConfigRegistry::config`] before drawing.
    pub fn register<O>(&self, observer: &Rc<RefCell<O>>) -> ObserverId
    where
        O: ConfigObserver + 'static,
    {
        let weak: Weak<RefCell<O>> = Rc::downgrade(observer);
        let weak: Weak<RefCell<dyn ConfigObserver>> = weak;
        let existing = self
            .observers
            .borrow()
            .iter()
            .find(|entry| Weak::ptr_eq(&entry.observer, &weak))
            .map(|entry| entry.id);

        let id = match existing {
            Some(id) => id,
            None => {
                let id = ObserverId(self.next_observer_id.get());
                self.next_observer_id.set(id.0 + 1);
                self.observers.borrow_mut().push(ObserverEntry {
                    id,
                    observer: weak,
                });
                tracing::debug!(observer = id.0, "registered config observer");
                id
            }
        };

        match observer.try_borrow_mut() {
            Ok(mut observer) => observer.config_changed(&self.config.get()),
            Err(_) => tracing::debug!(observer = id.0, "observer is busy, snapshot left pending"),
        }
        id
    }

    /// Remove an observer. Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|entry| entry.id != id);
        let removed = observers.len() != before;
        if removed {
            tracing::debug!(observer = id.0, "unregistered config observer");
        }
        removed
    }

    /// Number of registered observers that are still alive.
    pub fn observer_count(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|entry| entry.observer.strong_count() > 0)
            .count()
    }

    fn seed_defaults(&self) {
        let missing = !self.store.borrow().collection_exists(SETTINGS_COLLECTION);
        if !missing {
            return;
        }

        let created = self
            .store
            .borrow_mut()
            .create_collection(SETTINGS_COLLECTION);
        match created.and_then(|()| self.persist(&StyleConfig::default())) {
            Ok(()) => tracing::debug!(collection = SETTINGS_COLLECTION, "seeded default settings"),
            Err(err) => tracing::warn!(error = %err, "failed to seed default settings"),
        }
    }

    fn persist(&self, config: &StyleConfig) -> Result<(), StoreError> {
        let mut store = self.store.borrow_mut();
        let strings = [
            (keys::SPACES_BACKGROUND_COLOR, config.spaces.background.to_string()),
            (keys::SPACES_BORDER_COLOR, config.spaces.border.to_string()),
            (keys::TABS_BACKGROUND_COLOR, config.tabs.background.to_string()),
            (keys::TABS_BORDER_COLOR, config.tabs.border.to_string()),
            (
                keys::SPACES_BORDER_THICKNESS,
                config.spaces.border_thickness.to_string(),
            ),
            (
                keys::TABS_BORDER_THICKNESS,
                config.tabs.border_thickness.to_string(),
            ),
        ];

        let mut first_error = None;
        let mut record = |name: &str, result: Result<(), StoreError>| {
            if let Err(err) = result {
                tracing::debug!(property = name, error = %err, "settings write failed");
                first_error.get_or_insert(err);
            }
        };
        for (name, value) in &strings {
            record(*name, store.set_string(SETTINGS_COLLECTION, *name, value.as_str()));
        }
        record(
            keys::TRIM_ON_SAVE,
            store.set_bool(SETTINGS_COLLECTION, keys::TRIM_ON_SAVE, config.trim_on_save),
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn notify_observers(&self) {
        // Upgrade first and release the borrow, so observers may register/unregister (or be
        // dropped) while being notified.
        let live: Vec<_> = {
            let mut observers = self.observers.borrow_mut();
            observers.retain(|entry| entry.observer.strong_count() > 0);
            observers
                .iter()
                .filter_map(|entry| entry.observer.upgrade().map(|observer| (entry.id, observer)))
                .collect()
        };

        let config = self.config.get();
        tracing::debug!(observers = live.len(), "broadcasting config snapshot");
        for (id, observer) in &live {
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.config_changed(&config),
                Err(_) => tracing::debug!(
                    observer = id.0,
                    "observer is busy, snapshot left pending"
                ),
            }
        }
    }
}

fn read_string(store: &dyn SettingsStore, name: &str) -> Option<String> {
    match store.get_string(SETTINGS_COLLECTION, name) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(property = name, error = %err, "unreadable setting, using default");
            None
        }
    }
}

fn read_color(store: &dyn SettingsStore, name: &str, default: Color) -> Color {
    let Some(raw) = read_string(store, name) else {
        return default;
    };
    raw.parse().unwrap_or_else(|err| {
        tracing::debug!(property = name, value = %raw, error = %err, "invalid color, using default");
        default
    })
}

fn read_thickness(store: &dyn SettingsStore, name: &str, default: f64) -> f64 {
    let Some(raw) = read_string(store, name) else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => {
            tracing::debug!(property = name, value = %raw, "invalid thickness, using default");
            default
        }
    }
}

fn read_bool(store: &dyn SettingsStore, name: &str, default: bool) -> bool {
    match store.get_bool(SETTINGS_COLLECTION, name) {
        Ok(value) => value.unwrap_or(default),
        Err(err) => {
            tracing::debug!(property = name, error = %err, "unreadable setting, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemorySettingsStore, StoredValue};

    #[derive(Default)]
    struct Recorder {
        seen: Vec<StyleConfig>,
    }

    impl ConfigObserver for Recorder {
        fn config_changed(&mut self, config: &StyleConfig) {
            self.seen.push(*config);
        }
    }

    fn store_with(name: &str, value: StoredValue) -> MemorySettingsStore {
        let mut store = MemorySettingsStore::new();
        store.insert(SETTINGS_COLLECTION, name, value);
        store
    }

    #[test]
    fn test_empty_store_is_seeded_with_defaults() {
        let registry = ConfigRegistry::new(MemorySettingsStore::new());
        assert_eq!(registry.config(), StyleConfig::default());

        let store = registry.store.borrow();
        assert!(store.collection_exists(SETTINGS_COLLECTION));
        assert_eq!(
            store
                .get_string(SETTINGS_COLLECTION, keys::SPACES_BACKGROUND_COLOR)
                .unwrap()
                .as_deref(),
            Some("160, 43, 0, 149")
        );
        assert_eq!(
            store.get_bool(SETTINGS_COLLECTION, keys::TRIM_ON_SAVE).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_existing_collection_is_not_overwritten() {
        let store = store_with(keys::TRIM_ON_SAVE, StoredValue::Bool(true));
        let registry = ConfigRegistry::new(store);
        assert!(registry.config().trim_on_save);
        // Only the stored key is present; the rest fall back to defaults.
        assert_eq!(registry.config().spaces, StyleConfig::default().spaces);
    }

    #[test]
    fn test_load_falls_back_per_field() {
        let mut store = store_with(
            keys::SPACES_BACKGROUND_COLOR,
            StoredValue::String("not a color".to_string()),
        );
        store.insert(
            SETTINGS_COLLECTION,
            keys::TABS_BORDER_COLOR,
            StoredValue::String("#FF112233".to_string()),
        );
        store.insert(
            SETTINGS_COLLECTION,
            keys::SPACES_BORDER_THICKNESS,
            StoredValue::String("abc".to_string()),
        );
        store.insert(
            SETTINGS_COLLECTION,
            keys::TABS_BORDER_THICKNESS,
            StoredValue::String("2.5".to_string()),
        );
        store.insert(
            SETTINGS_COLLECTION,
            keys::TRIM_ON_SAVE,
            StoredValue::String("true".to_string()),
        );

        let config = ConfigRegistry::new(store).config();
        let defaults = StyleConfig::default();
        assert_eq!(config.spaces.background, defaults.spaces.background);
        assert_eq!(config.spaces.border_thickness, defaults.spaces.border_thickness);
        assert_eq!(config.tabs.border, Color::from_argb(0xff, 0x11, 0x22, 0x33));
        assert_eq!(config.tabs.border_thickness, 2.5);
        assert_eq!(config.trim_on_save, defaults.trim_on_save);
    }

    #[test]
    fn test_negative_persisted_thickness_uses_default() {
        let store = store_with(
            keys::TABS_BORDER_THICKNESS,
            StoredValue::String("-1".to_string()),
        );
        assert_eq!(ConfigRegistry::new(store).config().tabs.border_thickness, 1.0);
    }

    #[test]
    fn test_register_pushes_current_snapshot() {
        let registry = ConfigRegistry::new(MemorySettingsStore::new());
        let mut config = registry.config();
        config.trim_on_save = true;
        registry.apply(config).unwrap();

        let late = Rc::new(RefCell::new(Recorder::default()));
        registry.register(&late);
        assert_eq!(late.borrow().seen, vec![config]);
    }

    #[test]
    fn test_apply_persists_and_broadcasts() {
        let registry = ConfigRegistry::new(MemorySettingsStore::new());
        let a = Rc::new(RefCell::new(Recorder::default()));
        let b = Rc::new(RefCell::new(Recorder::default()));
        registry.register(&a);
        registry.register(&b);

        let mut config = registry.config();
        config.tabs.background = Color::from_rgb(1, 2, 3);
        config.spaces.border_thickness = 3.0;
        registry.apply(config).unwrap();

        assert_eq!(a.borrow().seen.last(), Some(&config));
        assert_eq!(b.borrow().seen.last(), Some(&config));

        // A fresh load reads back exactly what was applied.
        assert_eq!(registry.load(), config);
    }

    #[test]
    fn test_unregister_and_dropped_observers_are_not_notified() {
        let registry = ConfigRegistry::new(MemorySettingsStore::new());
        let kept = Rc::new(RefCell::new(Recorder::default()));
        let removed = Rc::new(RefCell::new(Recorder::default()));
        let dropped = Rc::new(RefCell::new(Recorder::default()));
        registry.register(&kept);
        let removed_id = registry.register(&removed);
        registry.register(&dropped);
        assert_eq!(registry.observer_count(), 3);

        assert!(registry.unregister(removed_id));
        assert!(!registry.unregister(removed_id));
        drop(dropped);
        assert_eq!(registry.observer_count(), 1);

        registry.apply(StyleConfig::default()).unwrap();
        assert_eq!(kept.borrow().seen.len(), 2);
        assert_eq!(removed.borrow().seen.len(), 1);
    }

    #[test]
    fn test_busy_observer_is_skipped_not_panicked() {
        let registry = ConfigRegistry::new(MemorySettingsStore::new());
        let observer = Rc::new(RefCell::new(Recorder::default()));
        {
            let _held = observer.borrow_mut();
            registry.register(&observer);
            registry.apply(StyleConfig::default()).unwrap();
        }
        assert!(observer.borrow().seen.is_empty());
        assert_eq!(registry.observer_count(), 1);

        registry.apply(StyleConfig::default()).unwrap();
        assert_eq!(observer.borrow().seen.len(), 1);
    }

    #[test]
    fn test_register_twice_keeps_one_entry() {
        let registry = ConfigRegistry::new(MemorySettingsStore::new());
        let observer = Rc::new(RefCell::new(Recorder::default()));
        let first = registry.register(&observer);
        let second = registry.register(&observer);
        assert_eq!(first, second);
        assert_eq!(registry.observer_count(), 1);
    }

    #[test]
    fn test_apply_normalizes_thickness() {
        let registry = ConfigRegistry::new(MemorySettingsStore::new());
        let mut config = registry.config();
        config.spaces.border_thickness = -4.0;
        registry.apply(config).unwrap();
        assert_eq!(registry.config().spaces.border_thickness, 0.0);
    }
}
