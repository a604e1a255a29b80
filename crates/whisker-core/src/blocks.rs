//! Block helper signatures.
//!
//! The parser only needs to know which `{{#name}}` helpers exist and whether
//! they take an argument; what a helper does is up to the renderer. A
//! [`BlockTable`] carries that first half, so the parser and renderer crates
//! can agree on a helper set without depending on each other.

use rustc_hash::FxHashMap;

/// The helpers [`BlockTable::builtin`] starts with.
pub const BUILTIN_BLOCKS: [&str; 4] = ["if", "unless", "each", "with"];

/// Whether `{{#name}}` must be given an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockArgument {
    /// `{{#name}}` alone is a syntax error.
    #[default]
    Required,
    /// A missing argument means the current context.
    Optional,
}

/// The block helpers a parser accepts, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTable {
    helpers: FxHashMap<String, BlockArgument>,
}

impl BlockTable {
    /// A table with no helpers at all.
    pub fn empty() -> Self {
        Self {
            helpers: FxHashMap::default(),
        }
    }

    /// `if`, `unless`, `each` and `with`, each requiring an argument.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for name in BUILTIN_BLOCKS {
            table.insert(name, BlockArgument::Required);
        }
        table
    }

    /// Add `name`, or change its argument rule if already present.
    pub fn insert(&mut self, name: impl Into<String>, argument: BlockArgument) {
        self.helpers.insert(name.into(), argument);
    }

    /// The argument rule for `name`, or `None` for an unknown helper.
    pub fn argument(&self, name: &str) -> Option<BlockArgument> {
        self.helpers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Helper names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }
}

impl Default for BlockTable {
    fn default() -> Self {
        Self::builtin()
    }
}
