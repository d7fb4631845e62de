use log::{debug, warn};
use thiserror::Error;

use crate::ir::{Category, LayoutNode, LayoutTree, Location, NodeId};
use crate::normalize::normalize;

/// Version tag written by the extraction tool.
pub const DATA_VERSION: u32 = 1;

const MAX_DEPTH: usize = 1024;
// type + name (1 byte each when empty), offset/size/align, category,
// two absent locations and the child count.
const MIN_NODE_BYTES: usize = 1 + 1 + 8 * 3 + 1 + 4 + 4 + 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("unexpected end of data at byte {offset}")]
    Truncated { offset: usize },
    #[error("empty layout data")]
    Empty,
    #[error("layout nesting deeper than {limit} levels")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Found(LayoutTree),
    /// The tool found no structure at the queried location.
    NotFound,
}

impl ParseOutcome {
    pub fn tree(&self) -> Option<&LayoutTree> {
        match self {
            Self::Found(tree) => Some(tree),
            Self::NotFound => None,
        }
    }

    pub fn into_tree(self) -> Option<LayoutTree> {
        match self {
            Self::Found(tree) => Some(tree),
            Self::NotFound => None,
        }
    }
}

/// Decodes and normalizes a result blob.
pub fn parse_layout(bytes: &[u8]) -> Result<ParseOutcome, DecodeError> {
    let outcome = decode(bytes)?;
    Ok(match outcome {
        ParseOutcome::Found(mut tree) => {
            normalize(&mut tree);
            let root = tree.node(tree.root());
            log::info!("Found structure {}.", root.label());
            ParseOutcome::Found(tree)
        }
        ParseOutcome::NotFound => {
            log::info!("No structure found at the given location.");
            ParseOutcome::NotFound
        }
    })
}

/// Decodes a result blob into a raw (parent-relative, un-normalized) tree.
pub fn decode(bytes: &[u8]) -> Result<ParseOutcome, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut reader = Reader::new(bytes);
    let version = reader.u32()?;
    if version != DATA_VERSION {
        warn!("Version mismatch! Expected {DATA_VERSION} - Found {version}");
        return Err(DecodeError::VersionMismatch {
            expected: DATA_VERSION,
            found: version,
        });
    }
    if reader.is_at_end() {
        return Ok(ParseOutcome::NotFound);
    }

    let files = read_files(&mut reader)?;
    let root = read_node(&mut reader, &files, 0)?;
    let mut tree = LayoutTree::new(root.node, files);
    let root_id = tree.root();
    attach_children(&mut tree, root_id, root.children);
    debug!(
        "decoded {} nodes, {} files, {} trailing bytes",
        tree.arena_len(),
        tree.files().len(),
        reader.remaining()
    );
    Ok(ParseOutcome::Found(tree))
}

struct RawNode {
    node: LayoutNode,
    children: Vec<RawNode>,
}

fn attach_children(tree: &mut LayoutTree, parent: NodeId, children: Vec<RawNode>) {
    for raw in children {
        let id = tree.append_child(parent, raw.node);
        attach_children(tree, id, raw.children);
    }
}

fn read_files(reader: &mut Reader<'_>) -> Result<Vec<String>, DecodeError> {
    let count = reader.u32()? as usize;
    // every string carries at least its one-byte size prefix
    if count > reader.remaining() {
        return Err(reader.truncated());
    }
    let mut files = Vec::with_capacity(count);
    for _ in 0..count {
        files.push(reader.string()?);
    }
    Ok(files)
}

fn read_location(
    reader: &mut Reader<'_>,
    files: &[String],
) -> Result<Option<Location>, DecodeError> {
    let file = reader.i32()?;
    if file < 0 {
        return Ok(None);
    }
    let line = reader.u32()?;
    let column = reader.u32()?;
    let file = file as usize;
    if file >= files.len() {
        return Ok(None);
    }
    Ok(Some(Location { file, line, column }))
}

fn read_node(
    reader: &mut Reader<'_>,
    files: &[String],
    depth: usize,
) -> Result<RawNode, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::TooDeep { limit: MAX_DEPTH });
    }
    let type_name = reader.string()?;
    let field_name = reader.string()?;
    // 64-bit amounts are narrowed: structures beyond 4 GiB are not representable.
    let offset = reader.i64()? as u32;
    let size = reader.i64()? as u32;
    let align = reader.i64()? as u32;
    let category_byte = reader.u8()?;
    let category = Category::from_byte(category_byte).unwrap_or_else(|| {
        warn!("unknown layout category {category_byte} for '{field_name}', using SimpleField");
        Category::SimpleField
    });

    let mut node = LayoutNode::new(category);
    node.type_name = type_name;
    node.field_name = field_name;
    node.offset = offset;
    node.size = size;
    node.align = align;
    node.type_location = read_location(reader, files)?;
    node.field_location = read_location(reader, files)?;

    let child_count = reader.u32()? as usize;
    if child_count.saturating_mul(MIN_NODE_BYTES) > reader.remaining() {
        return Err(reader.truncated());
    }
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(read_node(reader, files, depth + 1)?);
    }
    Ok(RawNode { node, children })
}

/// Little-endian cursor over the result blob.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn truncated(&self) -> DecodeError {
        DecodeError::Truncated { offset: self.pos }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos.checked_add(N).ok_or_else(|| self.truncated())?;
        let slice = self.data.get(self.pos..end).ok_or_else(|| self.truncated())?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    /// 7-bit encoded length prefix, low group first.
    fn string_len(&mut self) -> Result<usize, DecodeError> {
        let mut len = 0usize;
        for group in 0..5 {
            let byte = self.u8()?;
            len |= ((byte & 0x7F) as usize) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(len);
            }
        }
        Err(self.truncated())
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.string_len()?;
        let end = self.pos.checked_add(len).ok_or_else(|| self.truncated())?;
        let bytes = self.data.get(self.pos..end).ok_or_else(|| self.truncated())?;
        self.pos = end;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
