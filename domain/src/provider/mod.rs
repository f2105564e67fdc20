//! Provider identity and capability tags

mod entities;
mod strength;

pub use entities::ProviderProfile;
pub use strength::Strength;
