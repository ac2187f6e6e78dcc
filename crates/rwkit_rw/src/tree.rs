//! Recursive walking of the section tree.

use std::ops::Range;

use bon::Builder;
use tracing::{debug, instrument, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkHeader, ChunkType, HEADER_SIZE};
use crate::error::Result;

/// Depth used when the caller does not pick one
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Deepest `max_depth` a walker accepts, larger values are clamped to it
pub const MAX_DEPTH_LIMIT: usize = 256;

/// How much of a section could be walked
///
/// A section that overruns its parent and sits at the depth limit is `Truncated`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeStatus {
    /// The section and all of its direct children fit their declared sizes
    Complete,
    /// The declared sizes do not fit, the children are what could be recovered
    Truncated,
    /// The section is nested deeper than allowed, its children were not read
    MaxDepthExceeded,
}

/// A section and the sections nested inside it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChunkNode {
    pub header: ChunkHeader,
    pub status: NodeStatus,
    pub children: Vec<ChunkNode>,
}

impl ChunkNode {
    pub fn kind(&self) -> ChunkType {
        self.header.kind
    }

    /// Byte range of the data region, clamped to what was actually available
    pub fn data_range(&self, data: &[u8]) -> Range<usize> {
        let start = self.header.data_start().min(data.len());
        let end = self.header.data_end().min(data.len());
        start..end
    }

    /// The data region of this section inside `data`
    pub fn payload<'d>(&self, data: &'d [u8]) -> &'d [u8] {
        &data[self.data_range(data)]
    }

    /// Whether this section and every section below it walked cleanly
    pub fn is_complete(&self) -> bool {
        self.status == NodeStatus::Complete && self.children.iter().all(ChunkNode::is_complete)
    }

    /// Number of sections in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ChunkNode::node_count).sum::<usize>()
    }

    /// Number of levels in this subtree, a leaf counts as one
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(ChunkNode::depth).max().unwrap_or(0)
    }

    /// Pre-order iterator over the subtree, yielding each node with its nesting level
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![(0, self)],
        }
    }

    /// First node of the given type in pre-order
    pub fn find(&self, kind: ChunkType) -> Option<&ChunkNode> {
        self.iter()
            .map(|(_, node)| node)
            .find(|node| node.kind() == kind)
    }
}

/// Pre-order iterator over a [`ChunkNode`] tree
pub struct Iter<'a> {
    stack: Vec<(usize, &'a ChunkNode)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, &'a ChunkNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (level, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (level + 1, child)));
        Some((level, node))
    }
}

/// Options for how the section tree should be walked
#[derive(Debug, Clone, Copy, Builder)]
pub struct WalkOptions {
    /// Offset of the root section header
    #[builder(default)]
    pub offset: usize,

    /// Deepest nesting level whose children are still read
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions::builder().build()
    }
}

/// Section tree walker
///
/// ```
/// # fn doit() -> rwkit_rw::error::Result<()>
/// # {
/// use rwkit_rw::tree::{ChunkWalker, WalkOptions};
///
/// #[rustfmt::skip]
/// let data = [
///     0x16, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x18,
/// ];
///
/// let walker = ChunkWalker::new(WalkOptions::builder().max_depth(4).build());
/// let root = walker.walk(&data)?;
/// assert!(root.children.is_empty());
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChunkWalker {
    options: WalkOptions,
}

impl ChunkWalker {
    pub fn new(mut options: WalkOptions) -> Self {
        if options.max_depth > MAX_DEPTH_LIMIT {
            debug!(requested = options.max_depth, limit = MAX_DEPTH_LIMIT, "clamping maximum depth");
            options.max_depth = MAX_DEPTH_LIMIT;
        }
        ChunkWalker { options }
    }

    /// Walk the tree rooted at the configured offset.
    ///
    /// Only fails when the root header itself cannot be read. Corruption below
    /// the root is reported through [`NodeStatus`] instead.
    #[instrument(skip(self, data), fields(len = data.len()), err)]
    pub fn walk(&self, data: &[u8]) -> Result<ChunkNode> {
        self.walk_node(data, self.options.offset, data.len(), 0)
    }

    fn walk_node(&self, data: &[u8], offset: usize, limit: usize, depth: usize) -> Result<ChunkNode> {
        let header = ChunkHeader::read(&data[..limit], offset)?;
        let mut node = ChunkNode {
            header,
            status: NodeStatus::Complete,
            children: Vec::new(),
        };

        let end = if header.data_end() > limit {
            warn!(
                kind = %header.kind,
                offset = header.offset,
                declared_end = header.data_end(),
                limit,
                "section overruns its parent"
            );
            node.status = NodeStatus::Truncated;
            limit
        } else {
            header.data_end()
        };

        if !header.kind.is_container() || header.data_start() >= end {
            return Ok(node);
        }

        if depth >= self.options.max_depth {
            warn!(kind = %header.kind, offset = header.offset, depth, "maximum depth reached");
            if node.status == NodeStatus::Complete {
                node.status = NodeStatus::MaxDepthExceeded;
            }
            return Ok(node);
        }

        let mut cursor = header.data_start();
        while cursor < end {
            if end - cursor < HEADER_SIZE {
                warn!(offset = cursor, left = end - cursor, "trailing bytes too short for a section");
                node.status = NodeStatus::Truncated;
                break;
            }

            let child = self.walk_node(data, cursor, end, depth + 1)?;
            let overran = child.header.data_end() > end;
            cursor = child.header.data_end().min(end);
            node.children.push(child);

            if overran {
                node.status = NodeStatus::Truncated;
                break;
            }
        }

        Ok(node)
    }
}

/// Walk the section tree at the start of `data`, descending at most `max_depth` levels.
pub fn walk_chunks(data: &[u8], max_depth: usize) -> Result<ChunkNode> {
    ChunkWalker::new(WalkOptions::builder().max_depth(max_depth).build()).walk(data)
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::chunk::ChunkType;
    use crate::error::{Error, Result};
    use crate::tree::{walk_chunks, ChunkWalker, NodeStatus, WalkOptions, MAX_DEPTH_LIMIT};

    /// Serialize a section with the given body
    pub(crate) fn chunk(kind: ChunkType, library_id: u32, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + body.len());
        out.extend_from_slice(&kind.0.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&library_id.to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn walk_single_child() -> Result<()> {
        let child = chunk(ChunkType::STRUCT, 0x36003, &[1, 0, 0, 0]);
        let data = chunk(ChunkType::CLUMP, 0x36003, &child);

        let root = walk_chunks(&data, 8)?;

        assert_eq!(root.kind(), ChunkType::CLUMP);
        assert_eq!(root.status, NodeStatus::Complete);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].kind(), ChunkType::STRUCT);
        assert_eq!(root.children[0].header.offset, 12);
        assert_eq!(root.children[0].payload(&data), &[1, 0, 0, 0]);
        assert!(root.is_complete());

        Ok(())
    }

    #[test]
    fn walk_nested_siblings() -> Result<()> {
        let frame_list = chunk(
            ChunkType::FRAME_LIST,
            0x1803FFFF,
            &[
                chunk(ChunkType::STRUCT, 0x1803FFFF, &[0; 8]),
                chunk(
                    ChunkType::EXTENSION,
                    0x1803FFFF,
                    &chunk(ChunkType::NODE_NAME, 0x1803FFFF, b"body"),
                ),
            ]
            .concat(),
        );
        let geometry_list = chunk(
            ChunkType::GEOMETRY_LIST,
            0x1803FFFF,
            &chunk(ChunkType::STRUCT, 0x1803FFFF, &[0; 4]),
        );
        let data = chunk(
            ChunkType::CLUMP,
            0x1803FFFF,
            &[
                chunk(ChunkType::STRUCT, 0x1803FFFF, &[0; 12]),
                frame_list,
                geometry_list,
            ]
            .concat(),
        );

        let root = walk_chunks(&data, 8)?;

        assert_eq!(root.children.len(), 3);
        assert_eq!(root.node_count(), 8);
        assert_eq!(root.depth(), 4);
        assert!(root.is_complete());

        let kinds = root
            .iter()
            .map(|(level, node)| (level, node.kind()))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                (0, ChunkType::CLUMP),
                (1, ChunkType::STRUCT),
                (1, ChunkType::FRAME_LIST),
                (2, ChunkType::STRUCT),
                (2, ChunkType::EXTENSION),
                (3, ChunkType::NODE_NAME),
                (1, ChunkType::GEOMETRY_LIST),
                (2, ChunkType::STRUCT),
            ]
        );

        let name = root.find(ChunkType::NODE_NAME).map(|node| node.payload(&data));
        assert_eq!(name, Some(&b"body"[..]));

        Ok(())
    }

    #[test]
    fn unknown_types_are_leaves() -> Result<()> {
        // Looks like a nested header but must not be descended into
        let inner = chunk(ChunkType::STRUCT, 0x36003, &[]);
        let data = chunk(ChunkType(0xBEEF), 0x36003, &inner);

        let root = walk_chunks(&data, 8)?;

        assert!(root.children.is_empty());
        assert_eq!(root.status, NodeStatus::Complete);

        Ok(())
    }

    #[test]
    fn walk_truncated_root_header() {
        let data = [0x10, 0x00, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00];

        assert!(matches!(
            walk_chunks(&data, 8),
            Err(Error::TruncatedHeader {
                offset: 0,
                available: 8
            })
        ));
    }

    #[traced_test]
    #[test]
    fn child_overrunning_parent() -> Result<()> {
        let mut body = chunk(ChunkType::STRUCT, 0x36003, &[0; 4]);
        // A second child claiming far more than the parent holds
        body.extend(chunk(ChunkType::STRING, 0x36003, &[0; 4]));
        let len = body.len();
        body[len - 12..len - 8].copy_from_slice(&0x1000u32.to_le_bytes());

        let data = chunk(ChunkType::CLUMP, 0x36003, &body);
        let root = walk_chunks(&data, 8)?;

        assert_eq!(root.status, NodeStatus::Truncated);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].status, NodeStatus::Complete);
        assert_eq!(root.children[1].status, NodeStatus::Truncated);
        assert!(!root.is_complete());
        assert!(logs_contain("section overruns its parent"));

        Ok(())
    }

    #[test]
    fn root_overrunning_buffer() -> Result<()> {
        let mut data = chunk(
            ChunkType::TEX_DICTIONARY,
            0x36003,
            &chunk(ChunkType::STRUCT, 0x36003, &[2, 0, 2, 0]),
        );
        data[4..8].copy_from_slice(&0x8000u32.to_le_bytes());

        let root = walk_chunks(&data, 8)?;

        assert_eq!(root.status, NodeStatus::Truncated);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].status, NodeStatus::Complete);
        assert_eq!(root.data_range(&data), 12..data.len());

        Ok(())
    }

    #[test]
    fn trailing_bytes_in_container() -> Result<()> {
        let mut body = chunk(ChunkType::STRUCT, 0x36003, &[]);
        body.extend_from_slice(&[0xAA; 5]);
        let data = chunk(ChunkType::CLUMP, 0x36003, &body);

        let root = walk_chunks(&data, 8)?;

        assert_eq!(root.status, NodeStatus::Truncated);
        assert_eq!(root.children.len(), 1);

        Ok(())
    }

    #[test]
    fn depth_limit_marks_node() -> Result<()> {
        let data = chunk(
            ChunkType::CLUMP,
            0x36003,
            &chunk(
                ChunkType::FRAME_LIST,
                0x36003,
                &chunk(ChunkType::STRUCT, 0x36003, &[0; 4]),
            ),
        );

        let root = walk_chunks(&data, 1)?;
        assert_eq!(root.status, NodeStatus::Complete);
        assert_eq!(root.children[0].status, NodeStatus::MaxDepthExceeded);
        assert!(root.children[0].children.is_empty());

        let root = walk_chunks(&data, 0)?;
        assert_eq!(root.status, NodeStatus::MaxDepthExceeded);
        assert!(root.children.is_empty());

        Ok(())
    }

    #[test]
    fn self_similar_input_is_bounded() -> Result<()> {
        let mut data = chunk(ChunkType::STRUCT, 0x36003, &[]);
        for _ in 0..100 {
            data = chunk(ChunkType::EXTENSION, 0x36003, &data);
        }

        let root = walk_chunks(&data, 16)?;

        assert_eq!(root.depth(), 17);
        assert!(root
            .iter()
            .any(|(_, node)| node.status == NodeStatus::MaxDepthExceeded));

        Ok(())
    }

    #[test]
    fn max_depth_is_clamped() -> Result<()> {
        let mut data = chunk(ChunkType::STRUCT, 0x36003, &[]);
        for _ in 0..(MAX_DEPTH_LIMIT + 40) {
            data = chunk(ChunkType::EXTENSION, 0x36003, &data);
        }

        let root = walk_chunks(&data, usize::MAX)?;

        assert_eq!(root.depth(), MAX_DEPTH_LIMIT + 1);
        assert!(root
            .iter()
            .any(|(_, node)| node.status == NodeStatus::MaxDepthExceeded));

        Ok(())
    }

    #[test]
    fn truncation_wins_over_depth_limit() -> Result<()> {
        let mut data = chunk(
            ChunkType::CLUMP,
            0x36003,
            &chunk(ChunkType::FRAME_LIST, 0x36003, &[0; 16]),
        );
        // The frame list now claims more than the clump holds
        data[16..20].copy_from_slice(&64u32.to_le_bytes());

        let root = walk_chunks(&data, 1)?;

        assert_eq!(root.status, NodeStatus::Truncated);
        assert_eq!(root.children[0].status, NodeStatus::Truncated);
        assert!(root.children[0].children.is_empty());

        Ok(())
    }

    #[test]
    fn walk_from_offset() -> Result<()> {
        let mut data = vec![0xFF; 4];
        data.extend(chunk(ChunkType::TEX_DICTIONARY, 0x36003, &[]));

        let walker = ChunkWalker::new(WalkOptions::builder().offset(4).build());
        let root = walker.walk(&data)?;

        assert_eq!(root.kind(), ChunkType::TEX_DICTIONARY);
        assert_eq!(root.header.offset, 4);

        Ok(())
    }

    #[test]
    fn zero_sized_container() -> Result<()> {
        let data = chunk(ChunkType::CLUMP, 0x36003, &[]);

        let root = walk_chunks(&data, 0)?;

        assert_eq!(root.status, NodeStatus::Complete);
        assert!(root.children.is_empty());

        Ok(())
    }
}
