use serde::Serialize;
use std::fmt;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Canonical form of a free-text place name: lowercased, first letter of each
/// whitespace-separated word uppercased, words joined by a single space.
///
/// `"  sao   PAULO "` → `"Sao Paulo"`.
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    // Uppercase, not titlecase: 'ß' (multi-char uppercase) is kept as-is and
    // digraphs like 'ǆ' become 'Ǆ', where Python's str.capitalize gives "Ss" and 'ǅ'.
    let mut upper = first.to_uppercase();
    let head = match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => first,
    };
    std::iter::once(head).chain(chars).collect()
}

/// Join key shared by every source. Only constructible through [`normalize_text`],
/// so two names differing only by case or spacing always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MunicipalityKey(String);

impl MunicipalityKey {
    /// Normalizes `raw`. Returns `None` when nothing but whitespace is left.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = normalize_text(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MunicipalityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_examples() {
        assert_eq!(normalize_text("  sao paulo "), "Sao Paulo");
        assert_eq!(normalize_text("RIO DE JANEIRO"), "Rio De Janeiro");
        assert_eq!(normalize_text("belo\t horizonte\n"), "Belo Horizonte");
        assert_eq!(normalize_text("SÃO JOÃO DEL-REI"), "São João Del-rei");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_normalize_text_is_idempotent() {
        let inputs = [
            "  sao paulo ",
            "RIO   DE JANEIRO",
            "ítapecerica da serra",
            "x",
            "",
            "MOGI-MIRIM  ",
            "ßaa",
        ];
        for raw in inputs {
            let once = normalize_text(raw);
            let twice = normalize_text(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_equivalent_names_share_a_key() {
        let a = MunicipalityKey::new("  sao paulo ").unwrap();
        let b = MunicipalityKey::new("SAO PAULO").unwrap();
        let c = MunicipalityKey::new("Sao\tPaulo").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "Sao Paulo");
        assert!(MunicipalityKey::new(" \t ").is_none());
    }

    #[test]
    fn test_clean_str() {
        assert_eq!(clean_str("  1000 "), "1000");
        assert_eq!(clean_str("\" 1000\""), "1000");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str(""), "");
    }
}
