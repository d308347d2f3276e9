//! In-memory atom tree for the `moov` atom.

use std::io::Cursor;

use crate::{FourCC, GpmfError};

use super::{Atom, AtomHeader};

/// Hard limit for atom nesting depth.
const MAX_ATOM_DEPTH: usize = 16;

/// Atom with child atoms if it is a container.
#[derive(Debug, Clone, Default)]
pub struct AtomNode {
    pub(crate) header: AtomHeader,
    pub(crate) children: Vec<AtomNode>,
}

impl AtomNode {
    /// Parses all sibling atoms in `data`,
    /// where `data[0]` is located at absolute file position `base`.
    /// Container atoms are walked depth-first.
    pub(crate) fn parse_all(
        data: &[u8],
        base: u64,
        depth: usize,
    ) -> Result<Vec<AtomNode>, GpmfError> {
        if depth > MAX_ATOM_DEPTH {
            return Err(GpmfError::CorruptBox {
                name: String::from("?"),
                offset: base,
                reason: "atoms nested too deep",
            })
        }

        let limit = base + data.len() as u64;
        let mut cursor = Cursor::new(data);
        let mut pos = base;
        let mut nodes = Vec::new();

        while pos < limit {
            let rel = usize::try_from(pos - base)?;

            // Some devices pad e.g. `udta` with null bytes
            if data[rel ..].iter().all(|b| *b == 0) {
                tracing::trace!("{} null bytes of padding @ {pos}", limit - pos);
                break
            }

            cursor.set_position(pos - base);
            let header = AtomHeader::read(&mut cursor, pos, limit, false)?;
            tracing::trace!("{}atom '{}' @ {} size {}", "  ".repeat(depth), header.name, header.offset, header.atom_size);

            let children = match header.is_container() {
                true => {
                    let start = usize::try_from(header.data_offset() - base)?;
                    let end = usize::try_from(header.end() - base)?;
                    Self::parse_all(&data[start .. end], header.data_offset(), depth + 1)?
                },
                false => Vec::new(),
            };

            pos = header.end();
            nodes.push(AtomNode{header, children});
        }

        Ok(nodes)
    }

    pub fn header(&self) -> &AtomHeader {
        &self.header
    }

    pub fn name(&self) -> FourCC {
        self.header.name
    }

    pub fn children(&self) -> &[AtomNode] {
        &self.children
    }

    /// First child atom with specified name.
    pub fn child(&self, name: FourCC) -> Option<&AtomNode> {
        self.children.iter().find(|c| c.header.name == name)
    }

    /// All child atoms with specified name,
    /// e.g. `trak` atoms in `moov`.
    pub fn children_named(&self, name: FourCC) -> impl Iterator<Item = &AtomNode> {
        self.children.iter().filter(move |c| c.header.name == name)
    }

    /// Follows `path` of child atom names,
    /// e.g. `[Mdia, Minf, Stbl]` from a `trak` atom.
    pub fn path(&self, path: &[FourCC]) -> Option<&AtomNode> {
        path.iter()
            .try_fold(self, |node, name| node.child(*name))
    }

    /// Depth-first list of all atoms in this tree,
    /// including `self`, as `(DEPTH, NODE)`.
    pub fn walk(&self) -> Vec<(usize, &AtomNode)> {
        let mut nodes = Vec::new();
        self.walk_into(0, &mut nodes);
        nodes
    }

    fn walk_into<'a>(&'a self, depth: usize, nodes: &mut Vec<(usize, &'a AtomNode)>) {
        nodes.push((depth, self));
        for child in self.children.iter() {
            child.walk_into(depth + 1, nodes);
        }
    }

    /// Returns the atom with its data load
    /// from `moov`, the in-memory `moov` data load
    /// starting at absolute position `moov_data_offset`.
    pub(crate) fn atom<'a>(
        &self,
        moov: &'a [u8],
        moov_data_offset: u64,
    ) -> Result<Atom<'a>, GpmfError> {
        let start = self.header.data_offset()
            .checked_sub(moov_data_offset)
            .map(usize::try_from)
            .transpose()?;
        let end = self.header.end()
            .checked_sub(moov_data_offset)
            .map(usize::try_from)
            .transpose()?;
        match (start, end) {
            (Some(s), Some(e)) if s <= e && e <= moov.len() => Ok(Atom::new(self.header, &moov[s .. e])),
            _ => Err(GpmfError::CorruptBox {
                name: self.header.name.to_string(),
                offset: self.header.offset,
                reason: "outside moov",
            })
        }
    }
}
