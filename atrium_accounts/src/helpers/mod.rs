pub mod passwords;

pub use passwords::{hash_password, verify_against_dummy, verify_password, PasswordHashError};
