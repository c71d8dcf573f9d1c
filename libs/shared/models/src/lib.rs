pub mod auth;
pub mod error;
pub mod pagination;
pub mod workshop;
