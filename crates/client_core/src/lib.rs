pub mod bindings;
pub mod producer;
pub mod sim;
pub mod store;
pub mod transport;

pub use bindings::{standard_bindings, BindingBehavior, DeckBinding};
pub use producer::{fire, ControlSink, HttpControlClient};
pub use sim::spawn_synthetic_producer;
pub use store::{EventId, EventStore, StoreChange, StoredEvent, ACTIVE_EVENT_TTL, HISTORY_LIMIT};
pub use transport::spawn_event_stream;
