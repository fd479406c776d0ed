//! 会话与资料提供者
//!
//! 每个浏览器会话一个 [`SessionProvider`]：持有身份令牌，监听身份事件，
//! 并在身份变化时拉取对应的资料行。

pub mod auth_client;
pub mod events;
pub mod provider;
pub mod registry;

pub use auth_client::AuthClient;
pub use events::{AuthEvent, AuthStateChange};
pub use provider::{SessionProvider, SessionState};
pub use registry::{PortalSession, SessionRegistry};
