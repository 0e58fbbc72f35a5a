//! Routing path group gate.
//!
//! Paths can be enabled and disabled in configured groups. A path may
//! belong to several independently toggled groups, so its enabled state is
//! a reference count rather than a boolean: the path is active as long as
//! *any* covering group is enabled. A path that belongs to no group at all
//! is always active.
//!
//! The gate holds only the counters and group flags. Group transitions,
//! their idempotence guard and the teardown of buffers and arbitration
//! state are driven by the routing core, which owns that state.

use crate::{config::GroupConfig, types::PathId};

use heapless::Vec;

#[derive(Debug, Clone)]
pub(crate) struct GroupGate<const G: usize, const P: usize> {
    enabled: Vec<bool, G>,
    /// Enabled reference count per path; `None` for paths without any
    /// group membership.
    refs: Vec<Option<u8>, P>,
}

impl<const G: usize, const P: usize> GroupGate<G, P> {
    /// Derives the init state from the group tables: each path's count is
    /// the number of initially enabled groups covering it.
    pub(crate) fn new(groups: &[GroupConfig<P>], path_count: usize) -> Self {
        let mut refs: Vec<Option<u8>, P> = Vec::new();
        let _ = refs.resize(path_count, None);
        let mut enabled: Vec<bool, G> = Vec::new();
        for group in groups {
            let _ = enabled.push(group.enabled_at_init);
            for member in &group.members {
                let r = &mut refs[member.0 as usize];
                let count = r.unwrap_or(0);
                *r = Some(if group.enabled_at_init {
                    count.saturating_add(1)
                } else {
                    count
                });
            }
        }
        Self { enabled, refs }
    }

    pub(crate) fn group_enabled(&self, group: usize) -> bool {
        self.enabled.get(group).copied().unwrap_or(false)
    }

    pub(crate) fn set_group(&mut self, group: usize, state: bool) {
        if let Some(g) = self.enabled.get_mut(group) {
            *g = state;
        }
    }

    pub(crate) fn increment(&mut self, path: PathId) {
        if let Some(Some(count)) = self.refs.get_mut(path.0 as usize) {
            *count = count.saturating_add(1);
        }
    }

    pub(crate) fn decrement(&mut self, path: PathId) {
        if let Some(Some(count)) = self.refs.get_mut(path.0 as usize) {
            *count = count.saturating_sub(1);
        }
    }

    /// A path is enabled if it is ungrouped or its count is nonzero.
    pub(crate) fn is_enabled(&self, path: PathId) -> bool {
        match self.refs.get(path.0 as usize) {
            Some(Some(count)) => *count > 0,
            _ => true,
        }
    }
}
