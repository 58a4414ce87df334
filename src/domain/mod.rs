// Domain layer - snapshot, row and connection models
pub mod connection;
pub mod history;
pub mod row;
pub mod snapshot;
