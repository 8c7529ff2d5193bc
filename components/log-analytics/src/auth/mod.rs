//! Credentials, shared-key signing and bearer token acquisition.

pub mod credentials;
pub mod signer;
pub mod token;
