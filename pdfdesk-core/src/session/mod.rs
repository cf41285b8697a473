//! Authenticated session management
//!
//! A [`Session`] carries the bearer token pair and the identity returned by
//! login. [`SessionHandle`] is the shared, cheaply cloneable view every
//! service reads its token from; it writes through to a [`SessionStore`] so a
//! CLI invocation can resume the previous login.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfdesk_core::session::{FileSessionStore, SessionHandle};
//!
//! let handle = SessionHandle::new(FileSessionStore::new(".pdfdesk/session.json"));
//! handle.restore().await?;
//! if handle.is_authenticated() {
//!     println!("signed in as {}", handle.user().unwrap().email);
//! }
//! ```

pub mod auth;
pub mod file;
pub mod handle;
pub mod memory;
pub mod refresh;
pub mod store;

pub use auth::AuthService;
pub use file::FileSessionStore;
pub use handle::SessionHandle;
pub use memory::MemorySessionStore;
pub use refresh::{JwtRefresher, TokenRefresher};
pub use store::{Session, SessionStore};
