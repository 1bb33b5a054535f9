mod order_store;
mod session_store;

pub use order_store::OrderStore;
pub use session_store::SessionStore;
