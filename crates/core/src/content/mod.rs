pub mod builder;
pub mod payload;
pub mod profile;

pub use builder::CanonicalBuilder;
pub use profile::{InstituteProfile, ProfileError};
