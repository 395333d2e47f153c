//! User configuration.
//!
//! Settings live in an INI file under the platform config directory
//! (`~/.config/parkwatch/config.ini` on Linux). Missing files and missing
//! keys fall back to defaults; values that do not parse are errors.
//!
//! ```ini
//! [detection]
//! stationary_radius_m = 20
//! leaving_radius_m = 50
//! confirm_delay_secs = 30
//! stationary_anchor = previous_sample
//! strict_coordinates = false
//!
//! [logging]
//! level = info
//! directory =
//!
//! [reporter]
//! user_id =
//! paid = false
//! ```

mod file;
mod keys;

pub use file::{config_directory, config_file_path, ConfigError, ConfigFile, ReporterSettings};
pub use keys::ConfigKey;
