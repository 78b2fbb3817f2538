//! Answer matching and validation

use super::normalize::normalize;

/// Decide whether `attempt` matches one accepted answer.
///
/// Strict mode compares the normalized forms exactly. Inclusive mode accepts
/// any attempt in which the accepted answer appears as a contiguous run of
/// whole words, so "louis XII le pieux" matches "Louis XII" while
/// "louis xiii" does not.
pub fn matches(attempt: &str, accepted: &str, strict: bool) -> bool {
    matches_normalized(&normalize(attempt), accepted, strict)
}

fn matches_normalized(attempt: &str, accepted: &str, strict: bool) -> bool {
    let accepted = normalize(accepted);
    if accepted.is_empty() {
        return false;
    }

    if strict {
        attempt == accepted
    } else {
        contains_words(attempt, &accepted)
    }
}

/// True if `needle`'s words occur as a contiguous join of `haystack`'s words.
fn contains_words(haystack: &str, needle: &str) -> bool {
    let haystack: Vec<&str> = haystack.split(' ').collect();
    let needle: Vec<&str> = needle.split(' ').collect();
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

/// Validate a raw attempt against every accepted answer of a sub-step.
///
/// Fails closed: an empty attempt or an empty accepted list never passes.
pub fn validate<S: AsRef<str>>(attempt: &str, accepted: &[S], strict: bool) -> bool {
    if attempt.trim().is_empty() || accepted.is_empty() {
        return false;
    }

    let attempt = normalize(attempt);
    accepted
        .iter()
        .any(|answer| matches_normalized(&attempt, answer.as_ref(), strict))
}
