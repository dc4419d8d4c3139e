//! Mapping of HTTP outcomes onto the fetch error taxonomy.

mod conversions;

pub use conversions::{classify_status, IntoFetchError};
