mod cache;
mod incremental;
mod reader;
mod source;

pub use cache::FlatMemberCache;
pub use incremental::{IncrementalMemberCache, MemberCacheWriter};
pub use reader::MemberReader;
pub use source::{InMemoryMemberSource, MemberData, MemberSource};
