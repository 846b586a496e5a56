use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Only this block is stripped after decomposition; other marks become separators.
const COMBINING_DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Turns a raw header into a canonical column identifier.
///
/// `"código región"` becomes `CODIGO_REGION` and `"camelCaseField"` becomes
/// `CAMEL_CASE_FIELD`. Returns `None` for blank input or when nothing
/// alphanumeric is left.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unaccented: String = trimmed.nfd().filter(|c| !COMBINING_DIACRITICS.contains(c)).collect();
    let split = CAMEL_BOUNDARY.replace_all(&unaccented, "${1}_${2}");
    // Every run of separators (underscores included) collapses to one `_` here.
    let joined = NON_ALPHANUMERIC.replace_all(&split, "_");
    let identifier = joined.trim_matches('_').to_ascii_uppercase();

    if identifier.is_empty() {
        None
    } else {
        Some(identifier)
    }
}
