//! OpenParquet preferences library
//!
//! Persists the display theme and the recently opened files list in
//! `preferences.json`.

pub mod config;
pub mod constant;
pub mod preferences;
pub mod recent;
pub mod saver;
pub mod store;
pub mod theme;

pub use preferences::{PreferenceError, PreferenceStore, Preferences};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use theme::Theme;
