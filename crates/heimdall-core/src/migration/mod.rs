pub mod errors;
mod history;
pub mod migrator;
pub mod registry;
pub mod steps;
pub mod types;

pub use errors::MigrationError;
pub use migrator::VersionMigrator;
pub use registry::{Migration, MigrationRegistry};
pub use steps::MigrationStep;
pub use types::MigrationRecord;
