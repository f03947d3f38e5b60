//! Nearest-name suggestions for failed lookups.

use strsim::jaro_winkler;

/// Minimum similarity for a candidate to be suggested at all.
const SIMILARITY_FLOOR: f64 = 0.7;

/// Returns the candidate most similar to `input`, if any clears the
/// similarity floor.
///
/// Comparison is case-insensitive.
#[must_use]
pub fn closest_match<'a, I>(candidates: I, input: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = input.to_lowercase();
    candidates
        .into_iter()
        .map(|candidate| (candidate, jaro_winkler(&candidate.to_lowercase(), &needle)))
        .filter(|(_, score)| *score >= SIMILARITY_FLOOR)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(candidate, _)| candidate.to_owned())
}

/// Builds a lookup-failure hint that always names at least one candidate.
///
/// Prefers the nearest match; when nothing is close, enumerates the full
/// candidate set instead.
#[must_use]
pub fn suggestion_for<'a, I>(candidates: I, input: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates: Vec<&str> = candidates.into_iter().collect();
    match closest_match(candidates.iter().copied(), input) {
        Some(near) => format!("did you mean `{near}`?"),
        None => format!("available: {}", candidates.join(", ")),
    }
}
