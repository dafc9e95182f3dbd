#[cfg(feature = "browser")]
pub mod browser;
pub mod static_page;

#[cfg(feature = "browser")]
pub use browser::{ChromiumNode, ChromiumSession, ChromiumSessions};
pub use static_page::{StaticNode, StaticPage, StaticSessions};
