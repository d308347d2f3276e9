//! GoPro Metadata Format (GPMF) parser.
//!
//! See <https://github.com/gopro/gpmf-parser> for the format.

mod key;
mod node;
mod stream;
mod types;
mod value;

pub use key::Key;
pub use node::{Node, NodeHeader};
pub use stream::{Recurse, ScaledType, Stream};
pub use types::BaseType;
pub use value::Value;
