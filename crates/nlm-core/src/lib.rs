pub mod credentials;
pub mod error;

pub use credentials::{AuthCredentials, CredentialStore, StoredCredentials};
pub use error::{Error, Result};
