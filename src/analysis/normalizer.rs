use crate::config::DEFAULT_PREFIX_SEPARATOR;
use std::collections::HashMap;

/// Raw identifier -> canonical identifier, read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    mappings: HashMap<String, String>,
}

impl AliasTable {
    pub fn new(mappings: HashMap<String, String>) -> Self {
        AliasTable { mappings }
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.mappings.get(raw).map(String::as_str)
    }

    /// Every raw identifier mapping to `canonical`, plus `canonical` itself, sorted.
    pub fn aliases_of(&self, canonical: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .mappings
            .iter()
            .filter(|(_, target)| target.as_str() == canonical)
            .map(|(raw, _)| raw.clone())
            .collect();

        if !names.iter().any(|n| n == canonical) {
            names.push(canonical.to_string());
        }
        names.sort();
        names
    }
}

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    separator: String,
    aliases: AliasTable,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        NameNormalizer::new(DEFAULT_PREFIX_SEPARATOR, AliasTable::default())
    }
}

impl NameNormalizer {
    pub fn new(separator: &str, aliases: AliasTable) -> Self {
        NameNormalizer {
            separator: separator.to_string(),
            aliases,
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Map a raw player identifier to its canonical name.
    ///
    /// A team tag such as `"12 | Name"` is dropped first, keeping the text after
    /// the last separator. The remainder is then looked up in the alias table,
    /// as given and trimmed. Unknown names pass through trimmed.
    pub fn normalize(&self, raw: &str) -> String {
        let remainder = match raw.rfind(self.separator.as_str()) {
            Some(idx) => &raw[idx + self.separator.len()..],
            None => raw,
        };

        let trimmed = remainder.trim();
        if let Some(canonical) = self
            .aliases
            .get(remainder)
            .or_else(|| self.aliases.get(trimmed))
        {
            return canonical.to_string();
        }

        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> NameNormalizer {
        let mut map = HashMap::new();
        map.insert("Crabby".to_string(), "GetCrabby".to_string());
        map.insert("crabby2".to_string(), "GetCrabby".to_string());
        map.insert("W1zP".to_string(), "WizP".to_string());
        NameNormalizer::new("| ", AliasTable::new(map))
    }

    #[test]
    fn strips_prefix_after_last_separator() {
        let n = normalizer();
        assert_eq!(n.normalize("12 | John 34"), "John 34");
        assert_eq!(n.normalize("a bc | John 34 "), "John 34");
        assert_eq!(n.normalize("T1 | Sub | WizP"), "WizP");
    }

    #[test]
    fn prefixed_alias_resolves_to_canonical_name() {
        let n = normalizer();
        assert_eq!(n.normalize("Team | Crabby"), "GetCrabby");
        assert_eq!(n.normalize("Team | Crabby"), n.normalize("Crabby"));
        assert_eq!(n.normalize("7 | W1zP "), "WizP");
    }

    #[test]
    fn resolves_aliases_and_passes_unknown_through() {
        let n = normalizer();
        assert_eq!(n.normalize("Crabby"), "GetCrabby");
        assert_eq!(n.normalize("  W1zP "), "WizP");
        assert_eq!(n.normalize("  Stranger "), "Stranger");
        assert_eq!(n.normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let n = normalizer();
        for raw in [
            "Crabby",
            "crabby2",
            "GetCrabby",
            " W1zP",
            "12 | John 34",
            "T1 | Crabby",
            "Team | crabby2 ",
            "x | y | z",
            "Nobody",
            "  padded  ",
        ] {
            let once = n.normalize(raw);
            assert_eq!(n.normalize(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn alias_group_includes_canonical_name() {
        let n = normalizer();
        assert_eq!(
            n.aliases().aliases_of("GetCrabby"),
            vec!["Crabby".to_string(), "GetCrabby".to_string(), "crabby2".to_string()]
        );
        assert_eq!(n.aliases().aliases_of("Solo"), vec!["Solo".to_string()]);
    }
}
