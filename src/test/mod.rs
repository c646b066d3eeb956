//! Shared test support: binary builders and an in-memory metadata provider.

mod builders;
mod fixture;

pub use builders::*;
pub use fixture::FixtureProvider;
pub use il::Il;
