use core_types::{DisplayInfo, ValidatedEntry};

pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous Trader";

/// Picks the name shown for a trader: username, then name, then the local
/// part of the email, then a fixed placeholder. Never empty.
pub fn resolve_display_name(entry: &ValidatedEntry) -> String {
    non_empty(entry.username.as_deref())
        .or_else(|| non_empty(entry.name.as_deref()))
        .or_else(|| non_empty(entry.email.split('@').next()))
        .unwrap_or(ANONYMOUS_DISPLAY_NAME)
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The projection used by avatar and name widgets.
pub fn display_info(entry: &ValidatedEntry) -> DisplayInfo {
    let display_name = resolve_display_name(entry);
    let avatar_initial = display_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_default();

    DisplayInfo {
        display_name,
        email: entry.email.clone(),
        username: entry.username.clone(),
        avatar_initial,
    }
}
