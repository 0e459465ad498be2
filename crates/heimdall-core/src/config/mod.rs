pub mod codec;
pub mod defaults;
pub mod paths;
pub mod types;

pub use codec::{decode, encode};
pub use defaults::{available_profiles, is_known_profile, profile_defaults};
pub use paths::ManagerPaths;
pub use types::{CURRENT_SCHEMA_VERSION, MANAGED_BY, ShellConfiguration};
