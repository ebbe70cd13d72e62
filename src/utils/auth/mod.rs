pub mod password;
pub mod tokens;
pub mod uid;
