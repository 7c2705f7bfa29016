mod case;
mod document;
mod metadata;
mod progress;

pub use case::*;
pub use document::*;
pub use metadata::*;
pub use progress::*;
