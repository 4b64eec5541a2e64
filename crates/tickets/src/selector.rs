//! Least-loaded staff selection.

use helpdesk_platform::StaffMember;

use crate::types::StaffLoad;

/// Pick the available member with the lowest cumulative load.
///
/// Members keep the pool's order; on equal load the earliest one wins.
/// Unknown members count as zero. Returns `None` when nobody is available.
pub fn select_staff<'a>(pool: &'a [StaffMember], load: &StaffLoad) -> Option<&'a StaffMember> {
    pool.iter()
        .filter(|member| member.presence.is_available())
        .min_by_key(|member| load.get(&member.id).copied().unwrap_or(0))
}
