//! Fuzzy matching for misspelled attribute and resource names

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// A candidate name and its distance to the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

/// Find closest matches from a list of candidates
pub fn find_closest_matches<S: AsRef<str>>(
    input: &str,
    candidates: &[S],
    max_results: usize,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let distance = strsim::levenshtein(input, candidate);
            (distance <= MAX_SUGGESTION_DISTANCE && distance > 0).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    // Stable sort keeps candidate order between equal distances
    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

/// Hint for an attribute name the schema does not declare
pub fn suggest_attribute<S: AsRef<str>>(attempted: &str, available: &[S]) -> Option<String> {
    if available.is_empty() {
        return None;
    }

    let matches = find_closest_matches(attempted, available, 1);
    let listing = available
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");

    Some(match matches.first() {
        Some(best) => format!("Did you mean `{}`? Available: {}", best.text, listing),
        None => format!("Available attributes: {}", listing),
    })
}

/// Hint for an unknown resource type name
pub fn suggest_resource<S: AsRef<str>>(attempted: &str, registered: &[S]) -> Option<String> {
    // Type names are long, so also accept a unique suffix match (`certificate_v1`)
    let suffix_matches: Vec<&str> = registered
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.ends_with(attempted))
        .collect();
    if let [only] = suffix_matches.as_slice() {
        return Some(format!("Did you mean `{}`?", only));
    }

    find_closest_matches(attempted, registered, 1)
        .first()
        .map(|best| format!("Did you mean `{}`?", best.text))
}
