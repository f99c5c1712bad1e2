use crate::error::OlapResult;
use crate::schema::{Hierarchy, Level, Member, MemberKey};
use std::cmp::Ordering;
use std::sync::Arc;

/// Read-only hierarchy navigation.
///
/// This is the contract the MDX function layer consumes (ancestor/descendant/lag/lead functions
/// and set ordering). Implementations never write back to their source and are safe to share
/// across threads once built.
///
/// Every result that is a list of members is in ordinal order.
pub trait MemberReader: Send + Sync {
    fn hierarchy(&self) -> &Hierarchy;

    /// Point lookup. `None` when the key is not part of the hierarchy.
    fn get_member(&self, key: &MemberKey) -> Option<Arc<Member>>;

    fn get_member_by_unique_name(&self, unique_name: &str) -> Option<Arc<Member>>;

    fn get_member_count(&self) -> usize;

    /// Every member of the hierarchy in ordinal order, as a shared view.
    fn all_members(&self) -> Arc<[Arc<Member>]>;

    fn get_root_members(&self) -> Vec<Arc<Member>>;

    fn get_members_in_level(&self, level: &Level) -> Vec<Arc<Member>>;

    fn get_member_children(&self, parent: &Member) -> Vec<Arc<Member>>;

    /// Children of every member in `parents`, computed in a single pass.
    fn get_member_children_batch(&self, parents: &[Arc<Member>]) -> Vec<Arc<Member>>;

    /// The member's parent, or the null member for roots.
    fn get_member_parent(&self, member: &Member) -> Arc<Member>;

    /// The member `n` positions after (`n >= 0`) or before (`n < 0`) `member` on the same level,
    /// or the null member when the scan runs off either end.
    fn get_lead_member(&self, member: &Member, n: i64) -> Arc<Member>;

    /// Members of `level` with ordinals in `[start.ordinal, end.ordinal]`.
    ///
    /// `start` and `end` must both belong to `level`; anything else is a contract violation.
    fn get_member_range(
        &self,
        level: &Level,
        start: &Member,
        end: &Member,
    ) -> OlapResult<Vec<Arc<Member>>>;

    /// Descendants of `member` whose level depth is exactly `depth`.
    fn get_member_descendants_at_depth(&self, member: &Member, depth: usize) -> Vec<Arc<Member>>;

    fn is_descendant(&self, ancestor: &Member, member: &Member) -> bool;

    /// Orders two members by ordinal. When `siblings_are_equal` is set, members with the same
    /// parent compare equal.
    fn compare(&self, m1: &Member, m2: &Member, siblings_are_equal: bool) -> Ordering;

    /// The configured default member, else the first root member.
    fn get_default_member(&self) -> OlapResult<Arc<Member>>;

    fn null_member(&self) -> Arc<Member>;
}
