pub mod credentials;
pub mod users;

pub use credentials::CredentialVerifier;
pub use users::UserService;
