//! Channel catalog state, queries and user preferences

pub mod demo;
pub mod preferences;
pub mod queries;
pub mod store;

pub use preferences::{PreferenceStore, PreferencesSnapshot};
pub use store::{CatalogSnapshot, CatalogSource, CatalogStore, DemoCatalogSource, RefreshOutcome};
