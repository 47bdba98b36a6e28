//! Canonical key chord strings.
//!
//! The hotkey recorder names every held key, folds right-side variants onto
//! their left-side name, and renders the held set as one canonical string:
//! modifiers first (`ctrl`, `alt`, `shift`, `windows`), then every other key
//! in case-insensitive lexical order, joined with `+`.
//!
//! ```rust
//! use deck_core::domain::chord::canonical_combination;
//!
//! let held = ["a", "shift", "ctrl"];
//! assert_eq!(canonical_combination(held), "ctrl+shift+a");
//! ```

/// Key names that sort ahead of everything else in a combination.
pub const MODIFIER_NAMES: [&str; 4] = ["ctrl", "alt", "shift", "windows"];

/// Right-side and layout-specific variants folded onto a canonical name.
const ALIASES: &[(&str, &str)] = &[
    ("alt gr", "alt"),
    ("right shift", "shift"),
    ("right alt", "alt"),
    ("right ctrl", "ctrl"),
];

/// Lowercases `name` and folds modifier aliases onto their canonical name.
pub fn normalize_key_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(lowered)
}

/// Returns `true` if `name` (already normalised) sorts in the modifier group.
pub fn is_modifier_name(name: &str) -> bool {
    MODIFIER_NAMES.contains(&name)
}

/// Renders a set of held key names as the canonical combination string.
///
/// Names are sorted by `(modifier group first, lowercase name)`.  The input
/// order does not matter; duplicates are kept as given, so callers pass a set.
pub fn canonical_combination<I, S>(keys: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
    names.sort_by_cached_key(|name| {
        let lowered = name.to_lowercase();
        (!is_modifier_name(&lowered), lowered)
    });
    names.join("+")
}
