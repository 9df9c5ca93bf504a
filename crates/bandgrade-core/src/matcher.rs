//! Answer normalization and comparison.
//!
//! Strict by default: IELTS grading requires exact wording for most
//! blank-fill answers, so the only leniency is the single-word token rule,
//! which tolerates surrounding punctuation and extra words the student
//! typed. Everything here is deterministic and side-effect free.

/// Case-fold and trim an answer for comparison.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Returns `true` if `user` matches any of the accepted answers.
pub fn matches_any(user: &str, accepted: &[String]) -> bool {
    accepted.iter().any(|correct| matches(user, correct))
}

/// Compare a single student answer against one stored correct answer.
///
/// A correct answer containing commas is a set of acceptable literals.
/// Correct answers of two characters or fewer must match exactly, so short
/// words like "ox" cannot false-match inside "oxen". A single-word correct
/// answer also matches when it appears as a whole token of the user's
/// answer; multi-word answers require exact normalized equality.
pub fn matches(user: &str, correct: &str) -> bool {
    let user_norm = normalize(user);
    let correct_norm = normalize(correct);

    if user_norm.is_empty() || correct_norm.is_empty() {
        return false;
    }

    // Comma-separated correct answer: membership in the literal set.
    if correct_norm.contains(',') {
        return correct_norm
            .split(',')
            .map(|alt| alt.trim())
            .filter(|alt| !alt.is_empty())
            .any(|alt| alt == user_norm);
    }

    if user_norm == correct_norm {
        return true;
    }

    // Short answers get no flexibility at all.
    if correct_norm.chars().count() <= 2 {
        return false;
    }

    // Single-word answers may appear as a whole token of the user's answer.
    if !correct_norm.contains(char::is_whitespace) {
        return user_norm
            .split_whitespace()
            .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
            .any(|token| token == correct_norm);
    }

    false
}
