// Application layer - synchronization use cases
pub mod detail_binder;
pub mod event_transport;
pub mod fleet_binder;
pub mod history_loader;
pub mod history_source;
pub mod stream_client;
