//! Client side of Flow: the API adapter the screens call, plus the two
//! background loops they run (chat polling and the focus countdown).

pub mod api;
pub mod backend;
pub mod focus;
pub mod http;
pub mod mock;
pub mod poller;

pub use api::{ApiClient, CHAT_ERROR_REPLY};
pub use backend::Backend;
pub use focus::FocusSession;
pub use http::HttpBackend;
pub use mock::MockBackend;
pub use poller::{ChatPoller, CHAT_POLL_INTERVAL};
