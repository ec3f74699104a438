//! User directory tools module.
//!
//! Both tools fetch the record set from the upstream [`RecordSource`]:
//! - `search`: flexible multi-field search (`search_users`)
//! - `list`: plain listing with a limit (`list_users`)
//!
//! [`RecordSource`]: crate::domains::upstream::RecordSource

pub mod common;
pub mod list;
pub mod search;

pub use list::{ListUsersParams, ListUsersTool};
pub use search::{SearchUsersParams, SearchUsersTool};
