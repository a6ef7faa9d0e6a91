//! Typed answers and the s-expression wire format
//!
//! Resolvers produce [`LispType`] values through [`lispify`], which picks the
//! highest-priority encoder willing to take a scraped [`Value`]. The reader in
//! [`sexp`] parses incoming queries and, for round trips, outgoing answers.

mod encoder;
pub mod sexp;
mod types;

pub use encoder::{encoders, lispify, EncoderEntry};
pub use sexp::{parse, Sexp, SyntaxError};
pub use types::{LispBody, LispType, Number, Value};
