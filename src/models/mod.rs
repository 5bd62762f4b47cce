pub mod output;
pub mod requests;

// Re-export commonly used types
pub use output::{OutputLine, OutputStream, ValidatorEvent};
pub use requests::ValidationRequest;
