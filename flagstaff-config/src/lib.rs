// Flag set loading for Flagstaff
//
// Flags are materialized once, from files, the environment, or code, into an
// immutable `FlagRegistry`. Evaluation itself lives in `flagstaff-features`.

pub mod env;
pub mod error;
pub mod loader;
pub mod registry;

pub use env::{DEFAULT_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{FileFormat, FlagLoader, FlagSet};
pub use registry::{FlagRegistry, FlagRegistryBuilder};

/// Load a registry from a single flag file, detecting its format
pub fn load_flags(path: &str) -> Result<FlagRegistry> {
    let loader = FlagLoader::auto(path)?;
    FlagRegistry::builder().add_file(path, loader.format()).build()
}
