//! Cursor over a GPMF payload buffer.
//!
//! A payload is a sequence of nodes, where nested nodes
//! (type code `0`) contain further nodes. Typically:
//!
//! ```ignore
//! DEVC
//!     DVID
//!     DVNM
//!     STRM
//!         STNM
//!         SCAL
//!         SIUN
//!         GPS5 <- samples
//!     STRM
//!         ...
//! ```
//!
//! All reads are bounds checked against the enclosing node,
//! malformed sizes never read outside the buffer.

use crate::{
    consts::{GPMF_HEADER_SIZE, MAX_NEST_DEPTH},
    support::string_from_bytes,
    GpmfError,
};

use super::{BaseType, Key, Node, Value};

/// Recursion budget for [`Stream::next`] and [`Stream::find_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurse {
    /// Siblings in the current scope only.
    /// Never enters nor leaves nested nodes.
    Current,
    /// Enters at most `n` levels below the starting level.
    /// Leaves exhausted nested nodes.
    Levels(u8),
    /// Enters any nested node, up to `MAX_NEST_DEPTH` levels.
    Unlimited,
}

/// Target types for scaled output.
pub trait ScaledType: Copy + Default {
    fn from_f64(value: f64) -> Self;
}

impl ScaledType for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }
}

impl ScaledType for f32 {
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

/// An entered nested node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Level {
    /// Offset of the nested node's header.
    offset: usize,
    /// Offset of its first child.
    start: usize,
    /// End of its data load. Children must end at or before this.
    end: usize,
    /// End of the nested node including padding.
    next: usize,
}

impl From<&Node<'_>> for Level {
    fn from(node: &Node<'_>) -> Self {
        Self {
            offset: node.offset(),
            start: node.data_offset(),
            end: node.data_end(),
            next: node.end(),
        }
    }
}

/// Cursor over a GPMF payload.
///
/// ```rs
/// let mut stream = Stream::new(&payload)?;
/// stream.find_next(Key::GPS5, Recurse::Unlimited)?;
/// let gps: Vec<f64> = stream.scaled(0, stream.repeat()?)?;
/// ```
#[derive(Debug, Clone)]
pub struct Stream<'a> {
    buffer: &'a [u8],
    /// Offset of the current node.
    pos: usize,
    /// Entered nested nodes, outermost first.
    levels: Vec<Level>,
    /// `true` until the cursor has moved.
    /// The first node is then a search candidate.
    fresh: bool,
}

impl<'a> Stream<'a> {
    /// Initializes a stream positioned on the first node.
    pub fn new(buffer: &'a [u8]) -> Result<Self, GpmfError> {
        if buffer.len() < GPMF_HEADER_SIZE {
            return Err(GpmfError::BufferTooSmall {
                got: buffer.len(),
                required: GPMF_HEADER_SIZE,
            })
        }

        Ok(Self {
            buffer,
            pos: 0,
            levels: Vec::new(),
            fresh: true,
        })
    }

    /// Returns to the first node in the buffer.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.levels.clear();
        self.fresh = true;
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Number of entered nested nodes.
    pub fn nest_level(&self) -> usize {
        self.levels.len()
    }

    fn scope_start(&self) -> usize {
        self.levels.last().map(|l| l.start).unwrap_or(0)
    }

    fn scope_end(&self) -> usize {
        self.levels.last().map(|l| l.end).unwrap_or(self.buffer.len())
    }

    /// Node at `offset`, or `None` at the end of the scope.
    /// A null key is padding and ends the scope.
    fn node_at(&self, offset: usize, scope_end: usize) -> Result<Option<Node<'a>>, GpmfError> {
        if offset >= scope_end {
            return Ok(None)
        }
        match self.buffer.get(offset .. offset + 4) {
            Some(key) if key == [0; 4] => return Ok(None),
            _ => (),
        }
        Node::parse(self.buffer, offset, scope_end).map(Some)
    }

    fn children_in(&self, start: usize, end: usize) -> Result<Vec<Node<'a>>, GpmfError> {
        let mut nodes = Vec::new();
        let mut offset = start;
        while let Some(node) = self.node_at(offset, end)? {
            offset = node.end();
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Siblings preceding the current node, nearest first.
    fn preceding(&self) -> Result<Vec<Node<'a>>, GpmfError> {
        let end = self.scope_end();
        let mut nodes = Vec::new();
        let mut offset = self.scope_start();
        while offset < self.pos {
            match self.node_at(offset, end)? {
                Some(node) => {
                    offset = node.end();
                    nodes.push(node);
                },
                None => break,
            }
        }
        nodes.reverse();
        Ok(nodes)
    }

    /// Decodes the node at the cursor.
    pub fn node(&self) -> Result<Node<'a>, GpmfError> {
        self.node_at(self.pos, self.scope_end())?
            .ok_or(GpmfError::NoNode)
    }

    /// Whether a nested node at the current depth may be entered,
    /// with `base` the depth at which the walk started.
    fn may_enter(&self, recurse: Recurse, base: usize) -> Result<bool, GpmfError> {
        let depth = self.levels.len();
        let allowed = match recurse {
            Recurse::Current => false,
            Recurse::Levels(n) => depth < base + n as usize,
            Recurse::Unlimited => true,
        };
        if allowed && depth >= MAX_NEST_DEPTH {
            return Err(GpmfError::RecurseDepthExceeded((depth + 1, MAX_NEST_DEPTH)))
        }
        Ok(allowed)
    }

    /// Moves to the next node in depth-first order.
    /// Leaves the cursor in an undefined position on error.
    fn advance(&mut self, recurse: Recurse, base: usize) -> Result<(), GpmfError> {
        let node = self.node()?;

        let mut next = node.end();
        if node.is_nested() && self.may_enter(recurse, base)? {
            self.levels.push(Level::from(&node));
            next = node.data_offset();
        }

        loop {
            if let Some(node) = self.node_at(next, self.scope_end())? {
                self.pos = node.offset();
                return Ok(())
            }
            if recurse == Recurse::Current {
                return Err(GpmfError::NoNode)
            }
            match self.levels.pop() {
                Some(level) => next = level.next,
                None => return Err(GpmfError::NoNode),
            }
        }
    }

    fn state(&self) -> (usize, Vec<Level>, bool) {
        (self.pos, self.levels.clone(), self.fresh)
    }

    fn restore(&mut self, state: (usize, Vec<Level>, bool)) {
        (self.pos, self.levels, self.fresh) = state;
    }

    /// Moves to the next node. On a fresh stream
    /// this is the first node.
    /// On error the cursor is left unchanged.
    pub fn next(&mut self, recurse: Recurse) -> Result<(), GpmfError> {
        if self.fresh {
            self.node()?;
            self.fresh = false;
            return Ok(())
        }

        let state = self.state();
        let base = self.levels.len();
        self.advance(recurse, base).map_err(|err| {
            self.restore(state);
            err
        })
    }

    /// Searches forward for `key`, depth-first.
    /// On a fresh stream the first node is a candidate,
    /// otherwise the search starts after the current node.
    ///
    /// Returns `GpmfError::KeyNotFound` on a miss,
    /// with the cursor unchanged.
    pub fn find_next(&mut self, key: Key, recurse: Recurse) -> Result<(), GpmfError> {
        let state = self.state();
        match self.seek_key(key, recurse) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.restore(state);
                match err {
                    GpmfError::NoNode => Err(GpmfError::KeyNotFound(key.to_string())),
                    err => Err(err),
                }
            }
        }
    }

    fn seek_key(&mut self, key: Key, recurse: Recurse) -> Result<(), GpmfError> {
        let base = self.levels.len();
        if self.fresh {
            self.fresh = false;
            if self.node()?.key() == key {
                return Ok(())
            }
        }
        loop {
            self.advance(recurse, base)?;
            if self.node()?.key() == key {
                return Ok(())
            }
        }
    }

    /// Searches the siblings preceding the current node for `key`.
    /// The nearest match wins.
    pub fn find_prev(&mut self, key: Key) -> Result<(), GpmfError> {
        let node = self.preceding()?
            .into_iter()
            .find(|n| n.key() == key)
            .ok_or_else(|| GpmfError::KeyNotFound(key.to_string()))?;
        self.pos = node.offset();
        self.fresh = false;
        Ok(())
    }

    /// Positions the cursor on the sample data for a stream.
    ///
    /// From a nested node (typically `STRM`) its children are searched,
    /// otherwise the siblings of the current node. The last node that is
    /// neither nested nor a known metadata key (`SCAL`, `SIUN`, etc)
    /// is selected, falling back on the last non-nested node.
    pub fn seek_to_samples(&mut self) -> Result<(), GpmfError> {
        let node = self.node()?;

        let mut levels = self.levels.clone();
        if node.is_nested() {
            if levels.len() >= MAX_NEST_DEPTH {
                return Err(GpmfError::RecurseDepthExceeded((levels.len() + 1, MAX_NEST_DEPTH)))
            }
            levels.push(Level::from(&node));
        }

        let (start, end) = levels.last()
            .map(|l| (l.start, l.end))
            .unwrap_or((0, self.buffer.len()));
        let children = self.children_in(start, end)?;

        let target = children.iter()
            .rev()
            .find(|n| !n.is_nested() && !n.key().is_metadata())
            .or_else(|| children.iter().rev().find(|n| !n.is_nested()))
            .ok_or_else(|| GpmfError::KeyNotFound(format!("samples in '{}'", node.key())))?;

        self.pos = target.offset();
        self.levels = levels;
        self.fresh = false;

        Ok(())
    }

    pub fn key(&self) -> Result<Key, GpmfError> {
        self.node().map(|n| n.key())
    }

    pub fn type_code(&self) -> Result<u8, GpmfError> {
        self.node().map(|n| n.type_code())
    }

    pub fn base_type(&self) -> Result<BaseType, GpmfError> {
        self.node()?.base_type()
    }

    /// Size in bytes of a single sample.
    pub fn struct_size(&self) -> Result<usize, GpmfError> {
        self.node().map(|n| n.struct_size())
    }

    /// Number of samples.
    pub fn repeat(&self) -> Result<usize, GpmfError> {
        self.node().map(|n| n.repeat())
    }

    /// Data load without padding, in stored byte order.
    pub fn raw_data(&self) -> Result<&'a [u8], GpmfError> {
        self.node().map(|n| n.data())
    }

    pub fn raw_data_size(&self) -> Result<usize, GpmfError> {
        self.node().map(|n| n.data().len())
    }

    /// Number of values per sample. For complex types the
    /// number of fields in `TYPE`, for nested nodes 1.
    pub fn elements_in_struct(&self) -> Result<usize, GpmfError> {
        let node = self.node()?;
        match node.base_type()? {
            BaseType::Nested => Ok(1),
            _ => self.field_types(&node).map(|f| f.len()),
        }
    }

    /// Expanded `TYPE` definition for the complex node at the cursor.
    pub fn complex_type(&self) -> Result<Vec<BaseType>, GpmfError> {
        let node = self.node()?;
        let definition = self.preceding()?
            .into_iter()
            .find(|n| n.key() == Key::TYPE)
            .ok_or(GpmfError::MissingComplexType)?;
        let fields = BaseType::expand_complex(definition.data())?;

        let size: usize = fields.iter().map(|f| f.size()).sum();
        if size != node.struct_size() {
            return Err(GpmfError::InvalidComplexType(format!(
                "{} ({size} bytes, struct size {})",
                string_from_bytes(definition.data(), true),
                node.struct_size()
            )))
        }

        Ok(fields)
    }

    /// Base type per value in a sample.
    fn field_types(&self, node: &Node<'a>) -> Result<Vec<BaseType>, GpmfError> {
        match node.base_type()? {
            BaseType::Complex => self.complex_type(),
            BaseType::Nested => Err(GpmfError::UnsupportedConversion {
                key: node.key().to_string(),
                base_type: 0,
            }),
            base_type => {
                let size = base_type.size();
                if node.struct_size() % size != 0 {
                    return Err(GpmfError::CorruptNode {
                        key: node.key().to_string(),
                        offset: node.offset(),
                    })
                }
                Ok(vec![base_type; node.struct_size() / size])
            }
        }
    }

    /// `DVID` of the enclosing `DEVC`.
    pub fn device_id(&self) -> Result<u32, GpmfError> {
        let dvid = self.device_child(Key::DVID)?;
        dvid.data()
            .get(.. 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_be_bytes)
            .ok_or(GpmfError::BufferTooSmall { got: dvid.data().len(), required: 4 })
    }

    /// `DVNM` of the enclosing `DEVC`, e.g. `"Camera"`.
    pub fn device_name(&self) -> Result<String, GpmfError> {
        let dvnm = self.device_child(Key::DVNM)?;
        Ok(string_from_bytes(dvnm.data(), true))
    }

    fn device_child(&self, key: Key) -> Result<Node<'a>, GpmfError> {
        let mut devc = self.levels.iter()
            .rev()
            .filter_map(|l| Node::parse(self.buffer, l.offset, self.buffer.len()).ok())
            .find(|n| n.key() == Key::DEVC);
        if devc.is_none() {
            devc = self.node().ok().filter(|n| n.key() == Key::DEVC);
        }
        let devc = devc.ok_or_else(|| GpmfError::KeyNotFound(Key::DEVC.to_string()))?;

        self.children_in(devc.data_offset(), devc.data_end())?
            .into_iter()
            .find(|n| n.key() == key)
            .ok_or_else(|| GpmfError::KeyNotFound(key.to_string()))
    }

    /// `SCAL` values preceding the current node, if any.
    fn scale_factors(&self) -> Result<Option<Vec<f64>>, GpmfError> {
        let scal = match self.preceding()?.into_iter().find(|n| n.key() == Key::SCAL) {
            Some(n) => n,
            None => return Ok(None),
        };
        let base_type = scal.base_type()?;
        let size = base_type.size();
        if !base_type.is_numeric() {
            return Err(GpmfError::UnsupportedConversion {
                key: Key::SCAL.to_string(),
                base_type: base_type.to_u8(),
            })
        }
        let scales = scal.data()
            .chunks_exact(size)
            .filter_map(|b| Value::numeric(base_type, b))
            .collect();
        Ok(Some(scales))
    }

    /// One divisor per element.
    fn scales(&self, key: Key, elements: usize) -> Result<Vec<f64>, GpmfError> {
        let scales = match self.scale_factors()? {
            Some(s) => s,
            None => return Ok(vec![1.0; elements]),
        };
        if scales.iter().any(|s| *s == 0.0) {
            return Err(GpmfError::ZeroScale(key.to_string()))
        }
        match scales.len() {
            1 => Ok(vec![scales[0]; elements]),
            n if n == elements => Ok(scales),
            n => Err(GpmfError::ScaleMismatch { scales: n, elements }),
        }
    }

    fn check_range(node: &Node<'_>, start: usize, count: usize) -> Result<(), GpmfError> {
        match start.checked_add(count) {
            Some(end) if end <= node.repeat() => Ok(()),
            _ => Err(GpmfError::IndexOutOfRange(start.saturating_add(count), node.repeat())),
        }
    }

    /// Field byte ranges within a sample.
    fn field_ranges(fields: &[BaseType]) -> Vec<std::ops::Range<usize>> {
        let mut offset = 0;
        fields.iter()
            .map(|f| {
                let range = offset .. offset + f.size();
                offset = range.end;
                range
            })
            .collect()
    }

    /// Writes `count` samples from sample `start` to `out`,
    /// each value divided by its `SCAL` divisor.
    /// Returns the number of values written,
    /// `count * elements_in_struct()`.
    pub fn scaled_data<T: ScaledType>(
        &self,
        out: &mut [T],
        start: usize,
        count: usize,
    ) -> Result<usize, GpmfError> {
        let node = self.node()?;
        let key = node.key();
        let fields = self.field_types(&node)?;

        if let Some(field) = fields.iter().find(|f| !f.is_numeric()) {
            return Err(GpmfError::UnsupportedConversion {
                key: key.to_string(),
                base_type: match node.base_type()? {
                    BaseType::Complex => field.to_u8(),
                    t => t.to_u8(),
                },
            })
        }

        Self::check_range(&node, start, count)?;

        let elements = fields.len();
        let required = count * elements;
        if out.len() < required {
            return Err(GpmfError::BufferTooSmall { got: out.len(), required })
        }

        let scales = self.scales(key, elements)?;
        let ranges = Self::field_ranges(&fields);
        let struct_size = node.struct_size();

        for (s, values) in out[.. required].chunks_exact_mut(elements.max(1)).enumerate() {
            let sample_offset = (start + s) * struct_size;
            for (e, value) in values.iter_mut().enumerate() {
                let range = &ranges[e];
                let raw = node.data()
                    .get(sample_offset + range.start .. sample_offset + range.end)
                    .and_then(|b| Value::numeric(fields[e], b))
                    .ok_or_else(|| GpmfError::CorruptNode {
                        key: key.to_string(),
                        offset: node.offset(),
                    })?;
                *value = T::from_f64(raw / scales[e]);
            }
        }

        Ok(required)
    }

    /// Allocating variant of [`Stream::scaled_data`].
    pub fn scaled<T: ScaledType>(&self, start: usize, count: usize) -> Result<Vec<T>, GpmfError> {
        // count <= repeat before allocating
        Self::check_range(&self.node()?, start, count)?;
        let elements = self.elements_in_struct()?;
        let mut out = vec![T::default(); count * elements];
        self.scaled_data(&mut out, start, count)?;
        Ok(out)
    }

    /// Decodes `count` samples from sample `start`,
    /// without scaling. `c` values are grouped
    /// into a single string per sample (or per run of `c` fields
    /// in complex types).
    pub fn formatted_data(&self, start: usize, count: usize) -> Result<Vec<Value>, GpmfError> {
        let node = self.node()?;
        let key = node.key();
        let fields = self.field_types(&node)?;
        Self::check_range(&node, start, count)?;

        let ranges = Self::field_ranges(&fields);
        let struct_size = node.struct_size();
        let mut values = Vec::with_capacity(count * fields.len());

        for s in start .. start + count {
            let sample = node.data()
                .get(s * struct_size .. (s + 1) * struct_size)
                .ok_or_else(|| GpmfError::CorruptNode { key: key.to_string(), offset: node.offset() })?;

            let mut e = 0;
            while e < fields.len() {
                if fields[e] == BaseType::Char {
                    // run of chars as one string
                    let run_end = fields[e ..].iter()
                        .position(|f| *f != BaseType::Char)
                        .map(|p| e + p)
                        .unwrap_or(fields.len());
                    let bytes = &sample[ranges[e].start .. ranges[run_end - 1].end];
                    values.push(Value::decode(key, BaseType::Char, bytes)?);
                    e = run_end;
                } else {
                    values.push(Value::decode(key, fields[e], &sample[ranges[e].clone()])?);
                    e += 1;
                }
            }
        }

        Ok(values)
    }

    /// Writes `count` samples from sample `start` to `out`,
    /// with numeric values in host byte order.
    /// Returns the number of bytes written.
    pub fn formatted_bytes(&self, out: &mut [u8], start: usize, count: usize) -> Result<usize, GpmfError> {
        let node = self.node()?;
        let fields = self.field_types(&node)?;
        Self::check_range(&node, start, count)?;

        let struct_size = node.struct_size();
        let required = count * struct_size;
        if out.len() < required {
            return Err(GpmfError::BufferTooSmall { got: out.len(), required })
        }

        let ranges = Self::field_ranges(&fields);
        let data = &node.data()[start * struct_size .. (start + count) * struct_size];

        for (sample, dest) in data.chunks_exact(struct_size.max(1)).zip(out.chunks_exact_mut(struct_size.max(1))) {
            for (field, range) in fields.iter().zip(ranges.iter()) {
                let src = &sample[range.clone()];
                match field.is_numeric() {
                    true => {
                        let mut bytes = src.to_vec();
                        if cfg!(target_endian = "little") {
                            bytes.reverse();
                        }
                        dest[range.clone()].copy_from_slice(&bytes)
                    },
                    false => dest[range.clone()].copy_from_slice(src),
                }
            }
        }

        Ok(required)
    }

    /// Walks all nodes depth-first from the start of the buffer,
    /// returning `(NEST_LEVEL, NODE)`.
    /// Fails on the first corrupt node.
    pub fn nodes(&self) -> Result<Vec<(usize, Node<'a>)>, GpmfError> {
        let mut walker = self.clone();
        walker.reset();

        let mut nodes = Vec::new();
        match walker.node_at(0, self.buffer.len())? {
            Some(node) => nodes.push((0, node)),
            None => return Ok(nodes),
        }
        walker.fresh = false;

        loop {
            match walker.advance(Recurse::Unlimited, 0) {
                Ok(()) => nodes.push((walker.levels.len(), walker.node()?)),
                Err(GpmfError::NoNode) => return Ok(nodes),
                Err(err) => return Err(err),
            }
        }
    }

    /// Checks the structure of the entire buffer,
    /// returning the number of nodes.
    pub fn validate(&self) -> Result<usize, GpmfError> {
        let count = self.nodes()?.len();
        tracing::trace!("validated {count} GPMF nodes");
        Ok(count)
    }

    /// Renders the node tree, one node per line,
    /// indented by nest level. Strings are printed.
    pub fn dump(&self) -> Result<String, GpmfError> {
        let mut out = String::new();
        for (level, node) in self.nodes()? {
            out.push_str(&format!("{}{node}", "  ".repeat(level)));
            if node.type_code() == b'c' || node.type_code() == b'U' {
                out.push_str(&format!(" \"{}\"", string_from_bytes(node.data(), true)));
            }
            out.push('\n');
        }
        Ok(out)
    }
}
