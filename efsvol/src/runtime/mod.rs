pub mod layout;
pub mod lock;
pub mod logging;
pub mod options;

pub use layout::{DriverLayout, validate_volume_name};
pub use lock::RegistryLock;
pub use logging::init_logging_for;
pub use options::DriverOptions;
