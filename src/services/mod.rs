pub mod artifact;
pub mod validator;

pub use artifact::PayloadArtifact;
pub use validator::ValidatorCli;
