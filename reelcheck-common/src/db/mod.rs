//! Database initialization and persistence queries

pub mod comments;
pub mod init;
pub mod submissions;

pub use init::*;
