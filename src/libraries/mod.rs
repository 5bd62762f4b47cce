pub mod sanitize;

pub use sanitize::{strip_ansi, strip_ansi_bytes};
