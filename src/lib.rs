//! Dray is a small Active Record layer over plain SQL.
//!
//! A struct deriving [`Model`] maps to one table keyed by an integer `id`
//! column. Instances save, update and delete themselves through a
//! [`Database`], which wraps any driver [`Executor`] and normalizes every
//! statement outcome into a [`QueryResponse`].
//!
//! ```ignore
//! #[derive(Model, Default)]
//! #[dray(table = "users")]
//! struct User {
//!     id: i64,
//!     name: String,
//!     age: Option<i32>,
//! }
//!
//! let mut db = Database::new(SqliteConnection::connect("sqlite://:memory:").await?);
//! let mut user = User { name: "Ann".into(), ..Default::default() };
//! user.save(&mut db, None).await?;
//! let found = User::find(&mut db, user.id).await?;
//! ```
pub use dray_core::*;
pub use dray_macros::*;
