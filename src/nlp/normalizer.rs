//! Query text cleanup

/// Separators whose repeated runs collapse to a single character
const SEPARATORS: [char; 3] = [',', ';', '|'];

/// Trim, case-fold and collapse whitespace and repeated separators
///
/// Always succeeds. Whitespace-only input yields an empty string.
pub fn normalize(raw: &str) -> String {
    let folded = raw.to_lowercase();
    let spaced = folded.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(spaced.len());
    let mut prev: Option<char> = None;
    for c in spaced.chars() {
        if SEPARATORS.contains(&c) && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}
