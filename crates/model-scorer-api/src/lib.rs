pub mod client;
pub mod credentials;
pub mod error;
pub mod schemas;

pub use client::Client;
pub use credentials::RegistryCredentials;
pub use error::ClientError;
