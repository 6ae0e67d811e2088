pub mod admin;
pub mod auth;
pub mod health;

pub use self::auth::model::LoginRequest;
