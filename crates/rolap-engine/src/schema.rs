//! Hierarchy metadata and the member types shared by the caches and the compiled nodes.
//!
//! Members are immutable once built. The flat cache assigns each member a dense ordinal during its
//! single load pass; that ordinal is the only ordering the rest of the engine relies on.
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Ordinal reported by the null member. It sorts after every loaded member.
pub const NULL_ORDINAL: usize = usize::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    name: String,
    depth: usize,
}

impl Level {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[derive(Clone, Debug)]
pub struct Hierarchy {
    name: Arc<str>,
    levels: Vec<Level>,
    has_all: bool,
    default_member: Option<MemberKey>,
}

impl Hierarchy {
    /// Levels are listed root-first; a level's depth is its position in `levels`.
    pub fn new(name: impl Into<String>, levels: Vec<impl Into<String>>) -> Self {
        let levels = levels
            .into_iter()
            .enumerate()
            .map(|(depth, name)| Level {
                name: name.into(),
                depth,
            })
            .collect();
        Self {
            name: Arc::from(name.into()),
            levels,
            has_all: false,
            default_member: None,
        }
    }

    /// Marks depth 0 as an `All` level; its members are built as [`MemberKind::All`].
    pub fn with_all_level(mut self) -> Self {
        self.has_all = true;
        self
    }

    pub fn with_default_member(mut self, key: MemberKey) -> Self {
        self.default_member = Some(key);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.name.clone()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, depth: usize) -> Option<&Level> {
        self.levels.get(depth)
    }

    pub fn level_by_name(&self, name: &str) -> Option<&Level> {
        self.levels
            .iter()
            .find(|level| level.name.eq_ignore_ascii_case(name))
    }

    pub fn has_all(&self) -> bool {
        self.has_all
    }

    pub fn default_member_key(&self) -> Option<&MemberKey> {
        self.default_member.as_ref()
    }
}

/// Composite identity of a member: the parent's key plus a local discriminating value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberKey {
    parent: Option<Arc<MemberKey>>,
    value: Value,
}

impl MemberKey {
    pub fn root(value: impl Into<Value>) -> Self {
        Self {
            parent: None,
            value: value.into(),
        }
    }

    pub fn child(&self, value: impl Into<Value>) -> Self {
        Self {
            parent: Some(Arc::new(self.clone())),
            value: value.into(),
        }
    }

    /// Builds a key from a root-first path of local values.
    pub fn from_path<I, V>(path: I) -> Option<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut key: Option<MemberKey> = None;
        for value in path {
            key = Some(match key {
                None => MemberKey::root(value),
                Some(parent) => parent.child(value),
            });
        }
        key
    }

    pub fn parent(&self) -> Option<&MemberKey> {
        self.parent.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Number of ancestors in the key path (0 for a root key).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cur = self.parent();
        while let Some(parent) = cur {
            depth += 1;
            cur = parent.parent();
        }
        depth
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent() {
            write!(f, "{parent}.")?;
        }
        write!(f, "[{}]", self.value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Regular,
    All,
    Null,
}

/// One node of a dimension hierarchy.
///
/// Equality and hashing use the hierarchy name, the kind and the key; two members with the same key
/// in the same hierarchy are the same member.
#[derive(Debug)]
pub struct Member {
    hierarchy: Arc<str>,
    key: MemberKey,
    name: String,
    unique_name: String,
    depth: usize,
    ordinal: usize,
    parent: Option<Arc<Member>>,
    kind: MemberKind,
}

impl Member {
    pub(crate) fn new(
        hierarchy: Arc<str>,
        key: MemberKey,
        name: String,
        depth: usize,
        ordinal: usize,
        parent: Option<Arc<Member>>,
        kind: MemberKind,
    ) -> Self {
        let unique_name = match &parent {
            Some(parent) => format!("{}.[{}]", parent.unique_name, name),
            None => format!("[{}].[{}]", hierarchy, name),
        };
        Self {
            hierarchy,
            key,
            name,
            unique_name,
            depth,
            ordinal,
            parent,
            kind,
        }
    }

    pub(crate) fn null(hierarchy: Arc<str>) -> Self {
        Self::new(
            hierarchy,
            MemberKey::root(Value::Null),
            "#null".to_string(),
            0,
            NULL_ORDINAL,
            None,
            MemberKind::Null,
        )
    }

    pub fn hierarchy(&self) -> &str {
        &self.hierarchy
    }

    pub fn key(&self) -> &MemberKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Depth of the member's level (0 for root members).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn parent(&self) -> Option<&Arc<Member>> {
        self.parent.as_ref()
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.kind == MemberKind::Null
    }

    pub fn is_all(&self) -> bool {
        self.kind == MemberKind::All
    }

    /// Whether `self` and `other` have the same parent (roots are siblings of each other). The
    /// null member is nobody's sibling.
    pub fn is_sibling_of(&self, other: &Member) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        match (self.parent(), other.parent()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.hierarchy == other.hierarchy,
            _ => false,
        }
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.hierarchy == other.hierarchy && self.key == other.key
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hierarchy.hash(state);
        self.kind.hash(state);
        self.key.hash(state);
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unique_name)
    }
}
