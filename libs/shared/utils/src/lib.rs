pub mod extractor;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod request_id;
pub mod state;
pub mod test_utils;
pub mod validators;

pub use state::AppState;
