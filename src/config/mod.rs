pub mod settings;

// Re-export commonly used types
pub use settings::{
    load_settings, load_settings_from, save_settings, save_settings_to, CosmeticSettings,
};
