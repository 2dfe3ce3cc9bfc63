pub mod error;
pub mod fs_ops;
pub mod parser;
pub mod serializer;
pub mod session;
pub mod types;

pub use error::{Error, Result};
pub use parser::parse;
pub use serializer::render;
pub use session::Session;
pub use types::{PatchFile, PatchOption, PatchStatus, StatusSpan};
