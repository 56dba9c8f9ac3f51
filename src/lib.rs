// Flagstaff - deterministic feature flags for Rust
//
// Re-exports the evaluation core and, with the `config` feature, the flag
// set loaders and registry.

// Re-export core functionality
pub use flagstaff_features::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use flagstaff_config;

pub mod logging;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        EvaluationContext, FlagRule, FlagVariant, MatchReason, NO_VARIANT, VariantAssignment,
        evaluate, select_variant,
    };

    #[cfg(feature = "config")]
    pub use flagstaff_config::{FileFormat, FlagRegistry, load_flags};
}
