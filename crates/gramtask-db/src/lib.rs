//! Shared database layer for the follow-reward service
//!
//! Owns the schema migrations and the settlement transaction. Task creation
//! and participation registration are written by the surrounding application;
//! this crate only ever mutates them inside [`settlement::settle_follow`].

pub mod migrate;
pub mod settlement;
pub mod types;
