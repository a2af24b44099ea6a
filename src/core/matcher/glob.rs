//! Wildcard pattern matching for policy fields
//!
//! Supports:
//! - `*` - Matches any run of characters, including none (e.g., `users:*`)
//! - `?` - Matches exactly one character (e.g., `v?`)
//!
//! Unlike path globs, `*` is not bounded by separators: `db:*` matches
//! `db:orders:eu` as well as `db:`.

/// Check if a candidate string matches a wildcard pattern
///
/// # Examples
/// ```
/// use warden_rs::core::matcher::wildcard;
///
/// assert!(wildcard("svc-*", "svc-billing"));
/// assert!(wildcard("v?", "v2"));
/// assert!(!wildcard("svc-*", "app-billing"));
/// ```
pub fn wildcard(pattern: &str, candidate: &str) -> bool {
    if pattern.is_empty() {
        return candidate.is_empty();
    }

    if pattern == "*" {
        return true;
    }

    // Literal fast path
    if !pattern.contains(['*', '?']) {
        return pattern == candidate;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    match_chars(&pattern, &candidate)
}

/// Greedy match with single-star backtracking
fn match_chars(pattern: &[char], candidate: &[char]) -> bool {
    let mut pat_idx = 0;
    let mut cand_idx = 0;
    // Last `*` seen and the candidate position it is currently absorbing up to
    let mut star: Option<(usize, usize)> = None;

    while cand_idx < candidate.len() {
        match pattern.get(pat_idx) {
            Some('*') => {
                star = Some((pat_idx, cand_idx));
                pat_idx += 1;
            }
            Some('?') => {
                pat_idx += 1;
                cand_idx += 1;
            }
            Some(&c) if c == candidate[cand_idx] => {
                pat_idx += 1;
                cand_idx += 1;
            }
            _ => match star {
                // Let the last star swallow one more character and retry
                Some((star_idx, absorbed)) => {
                    pat_idx = star_idx + 1;
                    cand_idx = absorbed + 1;
                    star = Some((star_idx, absorbed + 1));
                }
                None => return false,
            },
        }
    }

    // Candidate exhausted - only trailing stars may remain
    pattern[pat_idx..].iter().all(|&c| c == '*')
}
