pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod random_token;
pub mod session_cookie;
pub mod validate;

pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use random_token::random_token;
