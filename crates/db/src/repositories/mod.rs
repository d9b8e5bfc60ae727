//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept a pool (or, for statements that must join a transaction, any
//! SQLite executor) as the first argument.

pub mod entry_repo;
pub mod media_repo;

pub use entry_repo::EntryRepo;
pub use media_repo::MediaRepo;
