pub mod entities;
pub mod requests;

pub use entities::{Profile, UserRole};
pub use requests::{NewProfile, UpdateProfileRequest};
