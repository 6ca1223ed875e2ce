//! The bump arena backing every tree.
//!
//! Two independent pools live here:
//!
//! - the node pool, a chain of fixed-capacity blocks of [`Node`] slots. The
//!   first block holds [`ArenaOptions::initial_node_block`] slots and each new
//!   block doubles that, up to [`ArenaOptions::max_node_block`].
//! - the string pool, a chain of byte blocks of at least
//!   [`ArenaOptions::min_string_block`] bytes. Only the newest
//!   [`ArenaOptions::string_search_depth`] blocks are searched for room, so
//!   allocation stays O(1) at the cost of some slack in older blocks.
//!
//! Nothing is ever freed individually. [`Arena::reset`] drops every block and
//! advances the arena epoch, which turns all outstanding [`NodeId`]s and
//! pooled [`Span`]s into stale handles.

use alloc::vec::Vec;

use bstr::BStr;

use crate::{
    error::{AllocError, Pool},
    node::{Node, NodeBody, NodeId},
    options::ArenaOptions,
    span::{PoolRange, Span, bytes_eq},
};

#[derive(Debug)]
struct NodeBlock<'src> {
    slots: Vec<Node<'src>>,
    capacity: usize,
}

#[derive(Debug)]
struct NodePool<'src> {
    blocks: Vec<NodeBlock<'src>>,
    next_capacity: usize,
}

impl<'src> NodePool<'src> {
    fn new(options: &ArenaOptions) -> Self {
        Self {
            blocks: Vec::new(),
            next_capacity: options.initial_node_block.max(1),
        }
    }

    fn grow(&mut self, options: &ArenaOptions) -> Result<(), AllocError> {
        let capacity = self.next_capacity;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| AllocError { pool: Pool::Nodes })?;
        self.blocks
            .try_reserve(1)
            .map_err(|_| AllocError { pool: Pool::Nodes })?;
        self.blocks.push(NodeBlock { slots, capacity });

        log::trace!(
            "node pool grew to {} blocks (new block holds {capacity} nodes)",
            self.blocks.len()
        );

        if self.next_capacity < options.max_node_block {
            self.next_capacity = (self.next_capacity * 2).min(options.max_node_block);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.slots.len()).sum()
    }
}

#[derive(Debug)]
struct StringBlock {
    bytes: Vec<u8>,
    capacity: usize,
}

impl StringBlock {
    fn remaining(&self) -> usize {
        self.capacity - self.bytes.len()
    }
}

#[derive(Debug, Default)]
struct StringPool {
    blocks: Vec<StringBlock>,
}

impl StringPool {
    /// Picks a block with `len` free bytes, reserving a new one if none of the
    /// newest `search_depth` blocks has room.
    fn block_for(&mut self, len: usize, options: &ArenaOptions) -> Result<usize, AllocError> {
        let found = self
            .blocks
            .iter()
            .enumerate()
            .rev()
            .take(options.string_search_depth)
            .find(|(_, block)| block.remaining() >= len)
            .map(|(index, _)| index);

        if let Some(index) = found {
            return Ok(index);
        }

        let capacity = len.max(options.min_string_block);
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| AllocError {
                pool: Pool::Strings,
            })?;
        self.blocks.try_reserve(1).map_err(|_| AllocError {
            pool: Pool::Strings,
        })?;
        self.blocks.push(StringBlock { bytes, capacity });

        log::trace!(
            "string pool grew to {} blocks (new block holds {capacity} bytes)",
            self.blocks.len()
        );

        Ok(self.blocks.len() - 1)
    }

    fn get(&self, range: PoolRange) -> Option<&[u8]> {
        self.blocks
            .get(range.block as usize)?
            .bytes
            .get(range.start..range.end)
    }

    fn get_mut(&mut self, range: PoolRange) -> Option<&mut [u8]> {
        self.blocks
            .get_mut(range.block as usize)?
            .bytes
            .get_mut(range.start..range.end)
    }
}

/// Usage counters for an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaStats {
    /// Node blocks currently reserved.
    pub node_blocks: usize,
    /// Node slots handed out.
    pub nodes: usize,
    /// String blocks currently reserved.
    pub string_blocks: usize,
    /// Bytes handed out from the string pool.
    pub string_bytes_used: usize,
    /// Bytes reserved by the string pool.
    pub string_bytes_reserved: usize,
}

/// Owner of every node and pooled string of one or more JSON trees.
///
/// `'src` is the lifetime of the input buffers the trees borrow from.
///
/// # Examples
///
/// ```rust
/// use spanjson::{Arena, Kind};
///
/// let mut arena = Arena::new();
/// let root = arena.create_node().unwrap();
/// root.parse_body(br#"{"hello": "world"}"#, &mut arena).unwrap();
///
/// let value = root.find_child_element("hello", &arena).unwrap();
/// assert_eq!(value.kind(&arena), Some(Kind::String));
/// assert_eq!(value.get_string(&mut arena).unwrap(), "world");
/// ```
#[derive(Debug)]
pub struct Arena<'src> {
    options: ArenaOptions,
    epoch: u32,
    nodes: NodePool<'src>,
    strings: StringPool,
    /// Reused by the escape codec and number formatting.
    pub(crate) scratch: Vec<u8>,
}

impl Default for Arena<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'src> Arena<'src> {
    /// Creates an empty arena with [`ArenaOptions::default`]. No memory is
    /// reserved until the first allocation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ArenaOptions::default())
    }

    #[must_use]
    pub fn with_options(options: ArenaOptions) -> Self {
        Self {
            options,
            epoch: 0,
            nodes: NodePool::new(&options),
            strings: StringPool::default(),
            scratch: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ArenaOptions {
        &self.options
    }

    /// Returns a fresh node of [`Kind::Error`](crate::Kind::Error) with an
    /// empty message, ready to be parsed into or built up.
    ///
    /// # Errors
    ///
    /// Fails only if a new node block cannot be reserved.
    pub fn create_node(&mut self) -> Result<NodeId, AllocError> {
        let needs_block = self
            .nodes
            .blocks
            .last()
            .is_none_or(|block| block.slots.len() == block.capacity);
        if needs_block {
            self.nodes.grow(&self.options)?;
        }

        let block_index = self.nodes.blocks.len() - 1;
        let block = &mut self.nodes.blocks[block_index];
        let slot = block.slots.len();
        block.slots.push(Node::empty());

        Ok(NodeId::new(self.epoch, block_index, slot))
    }

    /// Reserves `size` zero-filled bytes in the string pool. Write to them with
    /// [`Arena::string_bytes_mut`].
    ///
    /// # Errors
    ///
    /// Fails only if a new string block cannot be reserved.
    pub fn allocate_string_bytes(&mut self, size: usize) -> Result<Span<'src>, AllocError> {
        if size == 0 {
            return Ok(Span::EMPTY);
        }
        let index = self.strings.block_for(size, &self.options)?;
        let block = &mut self.strings.blocks[index];
        let start = block.bytes.len();
        block.bytes.resize(start + size, 0);

        Ok(self.pooled(index, start, start + size))
    }

    /// Mutable access to bytes previously returned by
    /// [`Arena::allocate_string_bytes`]. Returns `None` for borrowed or stale
    /// spans.
    pub fn string_bytes_mut(&mut self, span: Span<'src>) -> Option<&mut [u8]> {
        match span {
            Span::Pooled(range) if range.epoch == self.epoch => self.strings.get_mut(range),
            _ => None,
        }
    }

    /// Copies `bytes` into the string pool and returns a span over the copy,
    /// which stays put until the arena is reset.
    ///
    /// # Errors
    ///
    /// Fails only if a new string block cannot be reserved.
    pub fn push_span(&mut self, bytes: &[u8]) -> Result<Span<'src>, AllocError> {
        if bytes.is_empty() {
            return Ok(Span::EMPTY);
        }
        let index = self.strings.block_for(bytes.len(), &self.options)?;
        let block = &mut self.strings.blocks[index];
        let start = block.bytes.len();
        block.bytes.extend_from_slice(bytes);

        Ok(self.pooled(index, start, start + bytes.len()))
    }

    /// Copies the scratch buffer into the pool.
    pub(crate) fn push_scratch(&mut self) -> Result<Span<'src>, AllocError> {
        let scratch = core::mem::take(&mut self.scratch);
        let span = self.push_span(&scratch);
        self.scratch = scratch;
        span
    }

    fn pooled(&self, block: usize, start: usize, end: usize) -> Span<'src> {
        Span::Pooled(PoolRange {
            epoch: self.epoch,
            // Block indices stay far below u32::MAX: each block is at least one byte.
            block: u32::try_from(block).unwrap_or(u32::MAX),
            start,
            end,
        })
    }

    /// The bytes behind `span`. Stale pooled spans resolve to the empty string.
    #[must_use]
    pub fn resolve(&self, span: Span<'src>) -> &BStr {
        BStr::new(self.bytes(span))
    }

    pub(crate) fn bytes(&self, span: Span<'src>) -> &[u8] {
        match span {
            Span::Borrowed(bytes) => bytes,
            Span::Pooled(range) if range.epoch == self.epoch => {
                self.strings.get(range).unwrap_or_default()
            }
            Span::Pooled(_) => &[],
        }
    }

    /// Content equality of two spans.
    #[must_use]
    pub fn span_eq(&self, a: Span<'src>, b: Span<'src>) -> bool {
        if let (Span::Pooled(a), Span::Pooled(b)) = (a, b) {
            if a == b {
                return true;
            }
        }
        bytes_eq(self.bytes(a), self.bytes(b))
    }

    /// Releases every block of both pools and restores the initial block
    /// sizes. All node handles and pooled spans issued so far become stale.
    pub fn reset(&mut self) {
        log::debug!(
            "resetting arena: {} node blocks, {} string blocks",
            self.nodes.blocks.len(),
            self.strings.blocks.len()
        );
        self.nodes = NodePool::new(&self.options);
        self.strings = StringPool::default();
        self.scratch = Vec::new();
        self.epoch = self.epoch.wrapping_add(1);
    }

    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            node_blocks: self.nodes.blocks.len(),
            nodes: self.nodes.len(),
            string_blocks: self.strings.blocks.len(),
            string_bytes_used: self.strings.blocks.iter().map(|b| b.bytes.len()).sum(),
            string_bytes_reserved: self.strings.blocks.iter().map(|b| b.capacity).sum(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node<'src>> {
        if id.epoch != self.epoch {
            return None;
        }
        self.nodes
            .blocks
            .get(id.block as usize)?
            .slots
            .get(id.slot as usize)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<'src>> {
        if id.epoch != self.epoch {
            return None;
        }
        self.nodes
            .blocks
            .get_mut(id.block as usize)?
            .slots
            .get_mut(id.slot as usize)
    }

    /// Overwrites the payload of `id`, keeping its sibling link.
    pub(crate) fn set_body(&mut self, id: NodeId, body: NodeBody<'src>) -> Option<()> {
        self.node_mut(id)?.body = body;
        Some(())
    }
}
