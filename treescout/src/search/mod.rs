//! Bounded, permission-aware tree search.
//!
//! [`search`] is the streaming core: it parses the query once, walks the
//! scope depth first and hands every match to a callback as soon as it is
//! found. For each entry the phases run in a fixed order:
//!
//! 1. depth guard (per frame)
//! 2. permission check; a hidden directory is skipped with its whole subtree
//! 3. symlinks are followed into their target as a new frame, one level deeper
//! 4. conditions against the full path
//! 5. terms against the base name
//! 6. report
//!
//! [`collect`] and [`search_many`] buffer matches for callers that want a
//! [`SearchOutput`](crate::results::SearchOutput) instead of a stream.
//!
//! ```
//! use treescout::fs::MemoryFs;
//! use treescout::permissions::AllowAll;
//! use treescout::search::{collect, SearchOptions};
//!
//! let mut fs = MemoryFs::new();
//! fs.add_file("/docs/readme.txt", 10)
//!     .add_file("/docs/notes/readme.md", 20)
//!     .add_file("/docs/img/photo.png", 30);
//!
//! let output = collect(&fs, "/docs", "readme", &AllowAll, &SearchOptions::default()).unwrap();
//! assert_eq!(output.relative_paths(), vec!["notes/readme.md", "readme.txt"]);
//! ```
mod collect;
mod options;
mod walker;

pub use collect::{collect, search_many};
pub use options::{CancelFlag, CyclePolicy, SearchOptions, DEFAULT_MAX_DEPTH};
pub use walker::{search, search_with};
