use crate::messaging::types::{Invoker, Origin};

// ============== Role allow-list ==============

/// Result of checking an invoker against the role allow-list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleCheck {
    Allowed,
    Denied,
    /// The platform gave us no member/role data (e.g. a DM).
    Unknown,
}

/// True when any of the invoker's roles is on the allow-list (exact name match).
pub fn has_any_role(role_names: &[String], allowed_roles: &[String]) -> bool {
    if allowed_roles.is_empty() {
        return false;
    }
    role_names.iter().any(|r| allowed_roles.contains(r))
}

pub fn check_roles(invoker: &Invoker, allowed_roles: &[String]) -> RoleCheck {
    let Some(roles) = invoker.role_names.as_deref() else {
        return RoleCheck::Unknown;
    };
    if has_any_role(roles, allowed_roles) {
        RoleCheck::Allowed
    } else {
        RoleCheck::Denied
    }
}

// ============== Channel gate ==============

/// True when the event happened in a guild channel with exactly this name.
pub fn in_named_channel(origin: &Origin, channel_name: &str) -> bool {
    origin.in_guild() && origin.channel_name.as_deref() == Some(channel_name)
}
