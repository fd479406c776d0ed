pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{AuthSession, Identity};
pub use requests::{SignInRequest, SignUpRequest};
pub use responses::SessionResponse;
