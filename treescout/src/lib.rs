pub mod config;
pub mod errors;
pub mod fs;
pub mod metrics;
pub mod paths;
pub mod permissions;
pub mod query;
pub mod results;
pub mod search;

pub use config::SearchConfig;
pub use errors::{SearchError, SearchResult};
pub use fs::{EntryInfo, EntryKind, FileSystem, MemoryFs, OsFs};
pub use permissions::{AllowAll, PermissionChecker, RuleChecker};
pub use query::{parse, SearchSpec};
pub use results::{SearchMatch, SearchOutput};
pub use search::{collect, search, search_many, search_with, SearchOptions};
