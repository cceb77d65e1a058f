//! Path and payload normalization.
//!
//! Hosts disagree on two things: path separators (Windows hosts answer with
//! backslashes) and option spelling (the native shell historically accepted
//! both `respectGitignore` and `respect_gitignore`). Everything crossing the
//! bridge is normalized here so the rest of the code sees one convention.

use bridge_traits::{CapabilityKind, Payload};

/// Search limit applied when the caller does not set one.
pub const DEFAULT_SEARCH_LIMIT: usize = 60;
/// Largest search limit forwarded to a host.
pub const MAX_SEARCH_LIMIT: usize = 400;

/// Replace every backslash with a forward slash. Idempotent.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Last non-empty segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

pub fn clamp_search_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT)
}

/// One option that travels under several names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionAlias {
    pub canonical: &'static str,
    pub spellings: &'static [&'static str],
}

const RESPECT_GITIGNORE: OptionAlias = OptionAlias {
    canonical: "respectGitignore",
    spellings: &["respectGitignore", "respect_gitignore"],
};
const INCLUDE_HIDDEN: OptionAlias = OptionAlias {
    canonical: "includeHidden",
    spellings: &["includeHidden", "include_hidden"],
};
const MAX_RESULTS: OptionAlias = OptionAlias {
    canonical: "maxResults",
    spellings: &["maxResults", "max_results"],
};
const OLD_PATH: OptionAlias = OptionAlias {
    canonical: "oldPath",
    spellings: &["oldPath", "old_path"],
};
const NEW_PATH: OptionAlias = OptionAlias {
    canonical: "newPath",
    spellings: &["newPath", "new_path"],
};
const DEVICE_CODE: OptionAlias = OptionAlias {
    canonical: "deviceCode",
    spellings: &["deviceCode", "device_code"],
};

/// Alias table for `kind`. Empty for kinds without aliased options.
pub fn aliases(kind: CapabilityKind) -> &'static [OptionAlias] {
    match kind {
        CapabilityKind::ListDirectory => &[RESPECT_GITIGNORE],
        CapabilityKind::SearchFiles => &[RESPECT_GITIGNORE, INCLUDE_HIDDEN, MAX_RESULTS],
        CapabilityKind::RenamePath => &[OLD_PATH, NEW_PATH],
        CapabilityKind::GitHubAuthComplete => &[DEVICE_CODE],
        _ => &[],
    }
}

/// Copy each aliased option to every spelling.
///
/// The canonical value wins when spellings disagree. When only a
/// non-canonical spelling is present, its value is used instead.
pub fn apply_aliases(kind: CapabilityKind, payload: &mut Payload) {
    for alias in aliases(kind) {
        let value = payload.get(alias.canonical).cloned().or_else(|| {
            alias
                .spellings
                .iter()
                .find_map(|spelling| payload.get(*spelling).cloned())
        });

        let Some(value) = value else {
            continue;
        };

        for spelling in alias.spellings {
            payload.insert((*spelling).to_string(), value.clone());
        }
    }
}
