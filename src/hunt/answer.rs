/// Normalize an answer for lenient comparison.
///
/// Lower-cases, drops everything that is not an ASCII word character or
/// whitespace, then trims. Inner whitespace is left alone.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.trim().to_string()
}

/// Check a guess against the expected answer.
///
/// Matches when either normalized form contains the other, so "pizza"
/// is accepted for "Prime Pizza" and so is "prime pizza place".
/// A guess with nothing left after normalizing never matches.
pub fn answers_match(guess: &str, expected: &str) -> bool {
    let guess = normalize(guess);
    if guess.is_empty() {
        return false;
    }
    let expected = normalize(expected);
    guess.contains(&expected) || expected.contains(&guess)
}
