pub mod actions;
pub mod config;
pub mod history;
pub mod interpreter;
pub mod profile;
pub mod reducer;
pub mod state;
pub mod style;
pub mod tokenizer;
pub mod transcript;

pub use actions::*;
pub use config::*;
pub use history::*;
pub use profile::*;
pub use reducer::*;
pub use state::*;
pub use style::*;
pub use tokenizer::*;
pub use transcript::*;
