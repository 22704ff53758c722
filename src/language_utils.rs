use isolang::Language;

use crate::errors::ConfigError;

/// Language utilities for ISO language code handling
///
/// Accepts ISO 639-1 (2-letter) codes, ISO 639-2/3 (3-letter) codes and plain
/// English language names ("Spanish"), and normalizes them for track
/// matching and output filenames. Media containers commonly carry 639-2/B
/// tags ("fre", "ger"), which isolang does not parse directly, so those are
/// mapped to their 639-2/T equivalents first.
///
/// ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"), // French
    ("ger", "deu"), // German
    ("dut", "nld"), // Dutch
    ("gre", "ell"), // Greek
    ("chi", "zho"), // Chinese
    ("cze", "ces"), // Czech
    ("ice", "isl"), // Icelandic
    ("alb", "sqi"), // Albanian
    ("arm", "hye"), // Armenian
    ("baq", "eus"), // Basque
    ("bur", "mya"), // Burmese
    ("per", "fas"), // Persian
    ("geo", "kat"), // Georgian
    ("may", "msa"), // Malay
    ("mac", "mkd"), // Macedonian
    ("rum", "ron"), // Romanian
    ("slo", "slk"), // Slovak
    ("wel", "cym"), // Welsh
];

/// Resolve a language code or English language name to an isolang Language
pub fn resolve_language(input: &str) -> Result<Language, ConfigError> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(ConfigError::UnknownLanguage(input.to_string()));
    }

    if normalized.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized) {
            return Ok(lang);
        }
    }

    if normalized.len() == 3 {
        if let Some(lang) = Language::from_639_3(&normalized) {
            return Ok(lang);
        }
        if let Some((_, part2t)) = PART2B_TO_PART2T.iter().find(|(b, _)| *b == normalized) {
            if let Some(lang) = Language::from_639_3(part2t) {
                return Ok(lang);
            }
        }
    }

    // Full English name ("spanish", "Japanese")
    if let Some(lang) = Language::from_name(&capitalize(&normalized)) {
        return Ok(lang);
    }

    Err(ConfigError::UnknownLanguage(input.to_string()))
}

/// English name for a language code or name
pub fn language_name(input: &str) -> Result<String, ConfigError> {
    Ok(resolve_language(input)?.to_name().to_string())
}

/// Three-letter code used in subtitle filenames ("spanish" -> "spa")
///
/// Prefers the bibliographic (639-2/B) form when it exists, since that is
/// what media players and containers conventionally use.
pub fn subtitle_code(input: &str) -> Result<String, ConfigError> {
    let part2t = resolve_language(input)?.to_639_3().to_string();
    let code = PART2B_TO_PART2T
        .iter()
        .find(|(_, t)| *t == part2t)
        .map(|(b, _)| (*b).to_string())
        .unwrap_or(part2t);
    Ok(code)
}

/// Two-letter code used by Jellyfin naming ("spanish" -> "es"); falls back to
/// the 3-letter code for languages without a 639-1 assignment
pub fn jellyfin_code(input: &str) -> Result<String, ConfigError> {
    let lang = resolve_language(input)?;
    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Whether two language identifiers refer to the same language
pub fn language_codes_match(a: &str, b: &str) -> bool {
    match (resolve_language(a), resolve_language(b)) {
        (Ok(lang_a), Ok(lang_b)) => lang_a == lang_b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
