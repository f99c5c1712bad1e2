//! Mutable member cache, filled piecemeal as members are read from a source.
//!
//! This is a separate variant from [`FlatMemberCache`](crate::FlatMemberCache): the flat cache only
//! implements [`MemberReader`](crate::MemberReader), so mutation through it does not type-check.
use crate::schema::{Member, MemberKey};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub trait MemberCacheWriter: Send + Sync {
    fn get_member(&self, key: &MemberKey) -> Option<Arc<Member>>;

    /// Inserts `member`, returning the member previously cached under the same key.
    fn put_member(&self, member: Arc<Member>) -> Option<Arc<Member>>;

    /// Cached children of `parent`; `None` when they were never loaded.
    fn get_children(&self, parent: &Member) -> Option<Vec<Arc<Member>>>;

    /// Records the complete child list of `parent` and caches each child.
    fn put_children(&self, parent: &Member, children: Vec<Arc<Member>>);

    /// Drops `key` and its cached child list.
    fn remove_member(&self, key: &MemberKey) -> Option<Arc<Member>>;
}

#[derive(Debug, Default)]
struct State {
    members: HashMap<MemberKey, Arc<Member>>,
    children: HashMap<MemberKey, Vec<Arc<Member>>>,
}

#[derive(Debug, Default)]
pub struct IncrementalMemberCache {
    state: RwLock<State>,
}

impl IncrementalMemberCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the maps half-updated, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl MemberCacheWriter for IncrementalMemberCache {
    fn get_member(&self, key: &MemberKey) -> Option<Arc<Member>> {
        self.read().members.get(key).cloned()
    }

    fn put_member(&self, member: Arc<Member>) -> Option<Arc<Member>> {
        self.write().members.insert(member.key().clone(), member)
    }

    fn get_children(&self, parent: &Member) -> Option<Vec<Arc<Member>>> {
        self.read().children.get(parent.key()).cloned()
    }

    fn put_children(&self, parent: &Member, children: Vec<Arc<Member>>) {
        let mut state = self.write();
        for child in &children {
            state.members.insert(child.key().clone(), child.clone());
        }
        state.children.insert(parent.key().clone(), children);
    }

    fn remove_member(&self, key: &MemberKey) -> Option<Arc<Member>> {
        let mut state = self.write();
        state.children.remove(key);
        let removed = state.members.remove(key)?;
        if let Some(parent) = key.parent() {
            if let Some(siblings) = state.children.get_mut(parent) {
                siblings.retain(|m| m.key() != key);
            }
        }
        Some(removed)
    }
}
