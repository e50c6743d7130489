use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};

/// Resolves free-text input to one of the window's food options.
///
/// A case-insensitive exact match always wins. Otherwise the input is treated as a fuzzy subsequence pattern and the
/// best-scoring option is returned; on equal scores the option listed first wins. Empty input never matches.
pub fn match_option<'a, S: AsRef<str>>(input: &str, options: &'a [S]) -> Option<&'a str> {
    let needle = input.trim();
    if needle.is_empty() {
        return None;
    }
    let folded = needle.to_lowercase();
    if let Some(exact) = options.iter().map(AsRef::as_ref).find(|o| o.to_lowercase() == folded) {
        return Some(exact);
    }
    let matcher = SkimMatcherV2::default().ignore_case();
    let mut best: Option<(i64, &str)> = None;
    for option in options.iter().map(AsRef::as_ref) {
        let Some(score) = matcher.fuzzy_match(option, needle) else {
            continue;
        };
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, option));
        }
    }
    best.map(|(_, option)| option)
}
