//! Bus core: configuration, dispatch and the public [`Bus`] handle.
//!
//! The only public API from this module is [`Bus`] with its [`Config`] and the
//! [`Delivery`] report of action publishes.
//!
//! Internal modules:
//! - [`config`]: [`Config`] and [`FallbackPolicy`];
//! - [`dispatch`]: scoped/global dispatch of actions and functions, cancellation;
//! - [`bus`]: registration and publishing surface over two registries.

mod bus;
mod config;
mod dispatch;

pub use bus::Bus;
pub use config::{Config, FallbackPolicy};
pub use dispatch::Delivery;
