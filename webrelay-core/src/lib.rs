pub mod config;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod registry;
pub mod validation;

pub use config::Config;
pub use delivery::{DeliveryReport, FanOut, CONTENT_TYPE_JSON};
pub use error::{Error, Result};
pub use registry::{AddOutcome, RemoveOutcome, SubscriberRegistry};
pub use validation::{is_valid_subscriber_url, validate_subscriber_url, ValidationError};
