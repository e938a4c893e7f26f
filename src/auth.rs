//! Credential material, client assertions, and access-token models.

pub mod assertion;
pub mod credential;
pub mod token;

pub use assertion::*;
pub use credential::*;
pub use token::*;
