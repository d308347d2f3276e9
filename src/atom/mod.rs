//! MP4 atom headers, atoms, and the in-memory atom tree.

mod atom;
mod atom_header;
mod tree;

pub use atom::Atom;
pub use atom_header::AtomHeader;
pub use tree::AtomNode;
