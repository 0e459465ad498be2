pub mod errors;
pub mod injector;
pub mod types;

pub use errors::InjectionError;
pub use injector::PropertyInjector;
pub use types::{InjectionReport, InjectionRule, Strategy};
