pub(crate) mod rows;
pub mod schema;
pub mod store;

pub use store::{RegisterOutcome, Store};

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
