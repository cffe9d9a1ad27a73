//! Core business logic - framework-agnostic wishlist operations.
//!
//! Every function here takes a database connection plus plain data and returns
//! entity models, view structs or a typed [`crate::errors::Error`]. Nothing in
//! this module knows about HTTP, sessions or rendering.

pub mod access;
pub mod category;
pub mod family;
pub mod invite;
pub mod item;
pub mod reservation;
pub mod user;
pub mod visibility;

use sea_orm::{DbErr, SqlErr};

/// Whether the store rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
