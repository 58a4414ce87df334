// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_history;
pub mod sse_transport;
