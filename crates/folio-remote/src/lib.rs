//! Everything the terminal reaches outside its own process state: sandbox
//! sessions, the advice service, and the GitHub-backed profile source.

pub mod advice;
pub mod error;
pub mod profile;
pub mod sandbox;

pub use advice::AdviceClient;
pub use error::RemoteError;
pub use error::RemoteResult;
