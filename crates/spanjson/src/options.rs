/// Sizing policy for the two pools owned by an [`Arena`](crate::Arena).
///
/// The defaults suit documents from a few bytes up to tens of megabytes.
///
/// # Examples
///
/// ```rust
/// use spanjson::{Arena, ArenaOptions};
///
/// let arena = Arena::with_options(ArenaOptions {
///     initial_node_block: 16,
///     ..Default::default()
/// });
/// assert_eq!(arena.stats().node_blocks, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaOptions {
    /// Number of node slots in the first node block. Each following block
    /// doubles in size until it reaches [`max_node_block`].
    ///
    /// [`max_node_block`]: ArenaOptions::max_node_block
    ///
    /// # Default
    ///
    /// `64`
    pub initial_node_block: usize,

    /// Largest node block the arena will reserve.
    ///
    /// # Default
    ///
    /// `65_536`
    pub max_node_block: usize,

    /// Smallest string block, in bytes. A string longer than this gets a block
    /// of exactly its own size.
    ///
    /// # Default
    ///
    /// `1024`
    pub min_string_block: usize,

    /// How many of the most recently created string blocks are searched for
    /// free room before a new block is reserved. Larger values pack strings
    /// tighter at the cost of a longer search per allocation.
    ///
    /// # Default
    ///
    /// `3`
    pub string_search_depth: usize,
}

impl Default for ArenaOptions {
    fn default() -> Self {
        Self {
            initial_node_block: 64,
            max_node_block: 1 << 16,
            min_string_block: 1024,
            string_search_depth: 3,
        }
    }
}

/// Configuration options for the recursive-descent parser.
///
/// # Examples
///
/// ```rust
/// use spanjson::{Arena, ParserOptions, SyntaxError};
///
/// let mut arena = Arena::new();
/// let root = arena.create_node().unwrap();
/// let options = ParserOptions { max_depth: 2 };
/// let err = root
///     .parse_body_with(b"[[[1]]]", &mut arena, &options)
///     .unwrap_err();
/// assert_eq!(err.syntax_error(), SyntaxError::DepthLimitExceeded);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Deepest container nesting accepted before parsing fails with
    /// [`SyntaxError::DepthLimitExceeded`](crate::SyntaxError::DepthLimitExceeded).
    ///
    /// Every level of nesting costs one native stack frame, so this bounds
    /// stack usage on hostile input.
    ///
    /// # Default
    ///
    /// `1024`
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { max_depth: 1024 }
    }
}
