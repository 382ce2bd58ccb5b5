//! Send settings and model catalog
//!
//! # Settings Hierarchy
//!
//! Settings are merged in the following order (lowest to highest priority):
//!
//! 1. **Built-in defaults** - [`SendSettings::default`]
//! 2. **User settings** - `~/.config/turnstile/settings.json`
//! 3. **Explicit file** - a path passed to [`SettingsLoader::with_file`]
//! 4. **Environment variables** - `TURNSTILE_*`
//!
//! Every layer is a partial [`SettingsPatch`]; unknown fields are rejected.

mod catalog;
mod loader;
mod settings;
mod validation;

pub use catalog::{ModelCatalog, ModelSpec, ReservePolicy, StaticModelCatalog};
pub use loader::{ENV_PREFIX, SettingsLoader};
pub use settings::{SendSettings, SettingsPatch};
pub use validation::{MAX_REQUEST_TIMEOUT_SECS, SettingsValidator};
