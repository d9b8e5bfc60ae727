//! Row structs and create DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row and a create DTO for inserts. Rows are never updated.

pub mod entry;
pub mod media;
