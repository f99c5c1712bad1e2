use crate::error::OlapResult;
use crate::member::incremental::MemberCacheWriter;
use crate::schema::{Hierarchy, MemberKey};
use std::fmt;
use std::sync::Arc;

/// A member as delivered by a [`MemberSource`], before the cache has resolved its parent and
/// assigned its ordinal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberData {
    pub key: MemberKey,
    pub name: String,
    /// Depth of the level the member belongs to.
    pub depth: usize,
}

impl MemberData {
    pub fn new(key: MemberKey, name: impl Into<String>, depth: usize) -> Self {
        Self {
            key,
            name: name.into(),
            depth,
        }
    }
}

/// Bulk supplier of hierarchy members.
///
/// `get_members` must return every member of the hierarchy in pre-order (each parent followed by its
/// subtree, siblings in source order).
pub trait MemberSource {
    fn get_hierarchy(&self) -> &Hierarchy;

    fn get_members(&self) -> OlapResult<Vec<MemberData>>;

    /// Offers the source a cache to populate. Returns whether the source accepted it.
    fn set_cache(&mut self, cache: Arc<dyn MemberCacheWriter>) -> bool;
}

/// Member source backed by a vector, used for tests and for hierarchies defined inline.
pub struct InMemoryMemberSource {
    hierarchy: Hierarchy,
    members: Vec<MemberData>,
    cache: Option<Arc<dyn MemberCacheWriter>>,
}

impl fmt::Debug for InMemoryMemberSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryMemberSource")
            .field("hierarchy", &self.hierarchy.name())
            .field("members", &self.members.len())
            .field("has_cache", &self.cache.is_some())
            .finish()
    }
}

impl InMemoryMemberSource {
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self {
            hierarchy,
            members: Vec::new(),
            cache: None,
        }
    }

    pub fn push(&mut self, member: MemberData) {
        self.members.push(member);
    }

    /// Appends a member whose depth is implied by its key path.
    pub fn with_member(mut self, key: MemberKey, name: impl Into<String>) -> Self {
        let depth = key.depth();
        self.members.push(MemberData::new(key, name, depth));
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn MemberCacheWriter>> {
        self.cache.as_ref()
    }
}

impl MemberSource for InMemoryMemberSource {
    fn get_hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn get_members(&self) -> OlapResult<Vec<MemberData>> {
        Ok(self.members.clone())
    }

    fn set_cache(&mut self, cache: Arc<dyn MemberCacheWriter>) -> bool {
        self.cache = Some(cache);
        true
    }
}
