// webrelay API Library
//
// HTTP surface of the relay: subscription management and publication

pub mod http;

// Re-export commonly used types
pub use http::{create_router, AppState};
