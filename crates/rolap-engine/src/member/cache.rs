//! Flat, pre-populated member cache.
//!
//! The whole hierarchy is pulled from a [`MemberSource`] in one call and stored as a vector whose
//! index is the member ordinal. Navigation queries scan that vector; the source is never consulted
//! again and the cache cannot be mutated after [`FlatMemberCache::load`] returns.
//!
//! # Ragged hierarchies
//!
//! Lead/lag, ranges and level scans assume every child sits exactly one level below its parent.
//! Ragged hierarchies (branches that skip levels) break that assumption, so `load` rejects them with
//! [`OlapError::RaggedHierarchy`] instead of answering navigation queries incorrectly.
use crate::error::{OlapError, OlapResult};
use crate::member::incremental::MemberCacheWriter;
use crate::member::reader::MemberReader;
use crate::member::source::{MemberData, MemberSource};
use crate::schema::{Hierarchy, Level, Member, MemberKey, MemberKind};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

pub struct FlatMemberCache {
    hierarchy: Hierarchy,
    members: Arc<[Arc<Member>]>,
    key_index: HashMap<MemberKey, usize>,
    unique_name_index: HashMap<String, usize>,
    default_member: Option<usize>,
    null_member: Arc<Member>,
}

impl fmt::Debug for FlatMemberCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMemberCache")
            .field("hierarchy", &self.hierarchy.name())
            .field("members", &self.members.len())
            .finish()
    }
}

impl FlatMemberCache {
    /// Loads every member from `source` and assigns ordinals in delivery order.
    pub fn load(source: &dyn MemberSource) -> OlapResult<Self> {
        let hierarchy = source.get_hierarchy().clone();
        let data = source.get_members()?;
        let hierarchy_name = hierarchy.name_arc();

        let mut members: Vec<Arc<Member>> = Vec::with_capacity(data.len());
        let mut key_index: HashMap<MemberKey, usize> = HashMap::with_capacity(data.len());
        let mut unique_name_index = HashMap::with_capacity(data.len());
        // Ordinals of the ancestors of the most recently loaded member, root first.
        let mut ancestors: Vec<usize> = Vec::new();

        for MemberData { key, name, depth } in data {
            let ordinal = members.len();
            if key_index.contains_key(&key) {
                return Err(OlapError::DuplicateMemberKey {
                    hierarchy: hierarchy.name().to_string(),
                    key: key.value().clone(),
                });
            }
            if hierarchy.level(depth).is_none() {
                return Err(OlapError::UnknownLevel {
                    hierarchy: hierarchy.name().to_string(),
                    depth,
                });
            }

            let parent = match key.parent() {
                None => {
                    ancestors.clear();
                    None
                }
                Some(parent_key) => {
                    let parent_ordinal = key_index.get(parent_key).copied().ok_or_else(|| {
                        OlapError::UnknownParent {
                            hierarchy: hierarchy.name().to_string(),
                            member: key.to_string(),
                        }
                    })?;
                    while ancestors.last().is_some_and(|&a| a != parent_ordinal) {
                        ancestors.pop();
                    }
                    if ancestors.is_empty() {
                        return Err(OlapError::contract(format!(
                            "members of hierarchy {} are not in pre-order: {key} follows a different subtree than its parent",
                            hierarchy.name()
                        )));
                    }
                    Some(members[parent_ordinal].clone())
                }
            };

            let expected = parent.as_ref().map_or(0, |p| p.depth() + 1);
            if depth != expected {
                return Err(OlapError::RaggedHierarchy {
                    hierarchy: hierarchy.name().to_string(),
                    member: key.to_string(),
                    depth,
                    expected,
                });
            }

            let kind = if hierarchy.has_all() && depth == 0 {
                MemberKind::All
            } else {
                MemberKind::Regular
            };
            let member = Arc::new(Member::new(
                hierarchy_name.clone(),
                key.clone(),
                name,
                depth,
                ordinal,
                parent,
                kind,
            ));
            key_index.insert(key, ordinal);
            unique_name_index.insert(member.unique_name().to_string(), ordinal);
            ancestors.push(ordinal);
            members.push(member);
        }

        let default_member = match hierarchy.default_member_key() {
            None => None,
            Some(key) => Some(key_index.get(key).copied().ok_or_else(|| {
                OlapError::Config(format!(
                    "default member {key} of hierarchy {} is not a loaded member",
                    hierarchy.name()
                ))
            })?),
        };

        log::debug!(
            "loaded {} members for hierarchy {}",
            members.len(),
            hierarchy.name()
        );

        Ok(Self {
            null_member: Arc::new(Member::null(hierarchy_name)),
            hierarchy,
            members: members.into(),
            key_index,
            unique_name_index,
            default_member,
        })
    }

    /// Members in ordinal order, without cloning.
    pub fn members(&self) -> &[Arc<Member>] {
        &self.members
    }

    /// Descendants of `root` in pre-order: the contiguous run of deeper members after it.
    fn subtree<'a>(&'a self, root: &Member) -> impl Iterator<Item = &'a Arc<Member>> + 'a {
        let depth = root.depth();
        self.members[root.ordinal() + 1..]
            .iter()
            .take_while(move |m| m.depth() > depth)
    }

    fn same_level<'a>(&'a self, depth: usize) -> impl Iterator<Item = &'a Arc<Member>> + 'a {
        self.members.iter().filter(move |m| m.depth() == depth)
    }

    /// Whether `member` is the member stored at its ordinal in this cache.
    fn owns(&self, member: &Member) -> bool {
        self.members
            .get(member.ordinal())
            .is_some_and(|m| m.as_ref() == member)
    }

    fn foreign_member(&self, member: &Member) -> OlapError {
        OlapError::contract(format!(
            "member {member} does not belong to the cache of hierarchy {}",
            self.hierarchy.name()
        ))
    }
}

impl MemberReader for FlatMemberCache {
    fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn get_member(&self, key: &MemberKey) -> Option<Arc<Member>> {
        let ordinal = self.key_index.get(key)?;
        Some(self.members[*ordinal].clone())
    }

    fn get_member_by_unique_name(&self, unique_name: &str) -> Option<Arc<Member>> {
        let ordinal = self.unique_name_index.get(unique_name)?;
        Some(self.members[*ordinal].clone())
    }

    fn get_member_count(&self) -> usize {
        self.members.len()
    }

    fn all_members(&self) -> Arc<[Arc<Member>]> {
        Arc::clone(&self.members)
    }

    fn get_root_members(&self) -> Vec<Arc<Member>> {
        self.members
            .iter()
            .filter(|m| m.parent().is_none())
            .cloned()
            .collect()
    }

    fn get_members_in_level(&self, level: &Level) -> Vec<Arc<Member>> {
        self.same_level(level.depth()).cloned().collect()
    }

    fn get_member_children(&self, parent: &Member) -> Vec<Arc<Member>> {
        self.members
            .iter()
            .filter(|m| m.parent().is_some_and(|p| p.as_ref() == parent))
            .cloned()
            .collect()
    }

    fn get_member_children_batch(&self, parents: &[Arc<Member>]) -> Vec<Arc<Member>> {
        let parents: HashSet<&Member> = parents.iter().map(|p| p.as_ref()).collect();
        self.members
            .iter()
            .filter(|m| m.parent().is_some_and(|p| parents.contains(p.as_ref())))
            .cloned()
            .collect()
    }

    fn get_member_parent(&self, member: &Member) -> Arc<Member> {
        member
            .parent()
            .cloned()
            .unwrap_or_else(|| self.null_member.clone())
    }

    fn get_lead_member(&self, member: &Member, n: i64) -> Arc<Member> {
        if member.is_null() {
            return self.null_member.clone();
        }
        if !self.owns(member) {
            log::warn!("{}", self.foreign_member(member));
            return self.null_member.clone();
        }
        let depth = member.depth();
        let steps = n.unsigned_abs() as usize;
        let found = if n >= 0 {
            self.members[member.ordinal()..]
                .iter()
                .filter(|m| m.depth() == depth)
                .nth(steps)
        } else {
            self.members[..=member.ordinal()]
                .iter()
                .rev()
                .filter(|m| m.depth() == depth)
                .nth(steps)
        };
        found.cloned().unwrap_or_else(|| self.null_member.clone())
    }

    fn get_member_range(
        &self,
        level: &Level,
        start: &Member,
        end: &Member,
    ) -> OlapResult<Vec<Arc<Member>>> {
        if start.is_null() || end.is_null() {
            return Ok(Vec::new());
        }
        if start.depth() != level.depth() || end.depth() != level.depth() {
            return Err(OlapError::contract(format!(
                "range {start}:{end} does not lie on level {}",
                level.name()
            )));
        }
        if !self.owns(start) {
            return Err(self.foreign_member(start));
        }
        if !self.owns(end) {
            return Err(self.foreign_member(end));
        }
        if start.ordinal() > end.ordinal() {
            return Ok(Vec::new());
        }
        Ok(self.members[start.ordinal()..=end.ordinal()]
            .iter()
            .filter(|m| m.depth() == level.depth())
            .cloned()
            .collect())
    }

    fn get_member_descendants_at_depth(&self, member: &Member, depth: usize) -> Vec<Arc<Member>> {
        if member.is_null() || depth < member.depth() {
            return Vec::new();
        }
        if depth == member.depth() {
            return self.get_member(member.key()).into_iter().collect();
        }
        if !self.owns(member) {
            log::warn!("{}", self.foreign_member(member));
            return Vec::new();
        }
        self.subtree(member)
            .filter(|m| m.depth() == depth)
            .cloned()
            .collect()
    }

    fn is_descendant(&self, ancestor: &Member, member: &Member) -> bool {
        if ancestor.is_null() || !self.owns(ancestor) || !self.owns(member) {
            return false;
        }
        member.ordinal() > ancestor.ordinal()
            && self
                .subtree(ancestor)
                .last()
                .is_some_and(|m| m.ordinal() >= member.ordinal())
    }

    fn compare(&self, m1: &Member, m2: &Member, siblings_are_equal: bool) -> Ordering {
        if m1 == m2 {
            return Ordering::Equal;
        }
        if siblings_are_equal && m1.is_sibling_of(m2) {
            return Ordering::Equal;
        }
        debug_assert!(m1.is_null() || self.owns(m1), "{}", self.foreign_member(m1));
        debug_assert!(m2.is_null() || self.owns(m2), "{}", self.foreign_member(m2));
        m1.ordinal().cmp(&m2.ordinal())
    }

    fn get_default_member(&self) -> OlapResult<Arc<Member>> {
        if let Some(ordinal) = self.default_member {
            return Ok(self.members[ordinal].clone());
        }
        self.members
            .iter()
            .find(|m| m.parent().is_none())
            .cloned()
            .ok_or_else(|| OlapError::EmptyHierarchy {
                hierarchy: self.hierarchy.name().to_string(),
            })
    }

    fn null_member(&self) -> Arc<Member> {
        self.null_member.clone()
    }
}

/// A loaded cache can feed another cache; it never accepts one itself since it owns its data.
impl MemberSource for FlatMemberCache {
    fn get_hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn get_members(&self) -> OlapResult<Vec<MemberData>> {
        Ok(self
            .members
            .iter()
            .map(|m| MemberData::new(m.key().clone(), m.name(), m.depth()))
            .collect())
    }

    fn set_cache(&mut self, _cache: Arc<dyn MemberCacheWriter>) -> bool {
        log::warn!(
            "flat member cache for {} declined an external cache",
            self.hierarchy.name()
        );
        false
    }
}
