//! Service flag names seeded in the registry database.

pub const SEARCH_CATEGORY: &str = "Search & Category Filter";
pub const USER_LIBRARY: &str = "User Library";
pub const GAME_CATALOG: &str = "Game & Experience Catalog";
pub const ANALYTICS: &str = "Analytics & Visualization";
pub const FEEDBACK: &str = "User Feedback & Rating Service";

/// Find the canonical spelling of `name` in `known`, ignoring case.
pub fn resolve<'a>(known: &'a [String], name: &str) -> Option<&'a str> {
    let wanted = name.trim().to_lowercase();
    known
        .iter()
        .find(|candidate| candidate.to_lowercase() == wanted)
        .map(String::as_str)
}
