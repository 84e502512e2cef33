use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const NOVELTY_TAG: &str = "none";

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Lowercase ASCII alphanumerics only, so `Protein_A`, `protein a` and
/// `PROTEIN-A` compare equal.
pub fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Splits a multi-valued cell on `,`, `;` or `|`, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn is_novelty_tag(tag: &str) -> bool {
    tag.trim().eq_ignore_ascii_case(NOVELTY_TAG)
}

pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_strips_punctuation_and_case() {
        assert_eq!(normalize_key("Protein_A"), "proteina");
        assert_eq!(normalize_key(" PROTEIN-A "), "proteina");
    }

    #[test]
    fn split_list_accepts_all_separators() {
        assert_eq!(
            split_list("Nucleus; cytosol|Plasma membrane,, "),
            vec!["Nucleus", "cytosol", "Plasma membrane"]
        );
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn novelty_tag_is_case_insensitive() {
        assert!(is_novelty_tag("None"));
        assert!(is_novelty_tag(" none "));
        assert!(!is_novelty_tag("nonexistent"));
    }

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(7), "7");
        assert_eq!(format_count(1234), "1,234");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("P04637");
        assert_eq!((x, y), stable_pair("P04637"));
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }
}
