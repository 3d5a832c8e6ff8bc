//! Station name resolution.
use crate::config::Catalog;

/// Normalizes a station or sheet name for matching.
///
/// Lowercases and drops whitespace, ASCII and full-width parentheses,
/// hyphens and underscores. Normalized names are never displayed.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '（' | '）' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves sheet names to canonical catalog stations.
pub struct StationResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> StationResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        StationResolver { catalog }
    }

    /// Returns the station a sheet belongs to, or `None` when the sheet is
    /// not an inspection log of any known station.
    ///
    /// The first catalog entry contained in the normalized sheet name wins;
    /// the first matching alias rule then overrides that result.
    pub fn resolve(&self, sheet_name: &str) -> Option<&'a str> {
        let normalized = normalize_name(sheet_name);
        let generic = self
            .catalog
            .entries()
            .find(|(key, _)| normalized.contains(key))
            .map(|(_, station)| station);
        let alias = self
            .catalog
            .aliases()
            .iter()
            .find(|rule| normalized.contains(rule.pattern.as_str()))
            .map(|rule| rule.station.as_str());
        alias.or(generic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_separators() {
        assert_eq!(normalize_name("PANEL PRECISION AA（LAA）"), "panelprecisionaalaa");
        assert_eq!(normalize_name("LED FLEX GRAPHITE-1"), "ledflexgraphite1");
        assert_eq!(normalize_name(" Top_cover (installation)\t"), "topcoverinstallation");
        assert_eq!(normalize_name("DE\u{3000}OQC"), "deoqc");
    }

    #[test]
    fn first_catalog_entry_wins() {
        let catalog = Catalog::new(["A", "AB"]).unwrap();
        let resolver = StationResolver::new(&catalog);
        assert_eq!(resolver.resolve("xx-ab-yy"), Some("A"));

        let catalog = Catalog::new(["AB", "A"]).unwrap();
        let resolver = StationResolver::new(&catalog);
        assert_eq!(resolver.resolve("xx-ab-yy"), Some("AB"));
    }

    #[test]
    fn unmatched_sheet_is_skipped() {
        let catalog = Catalog::default();
        let resolver = StationResolver::new(&catalog);
        assert_eq!(resolver.resolve("Summary"), None);
    }

    #[test]
    fn default_catalog_matches_decorated_sheet_names() {
        let catalog = Catalog::default();
        let resolver = StationResolver::new(&catalog);
        assert_eq!(resolver.resolve("IPQC_Mirror Attachment(SH2)"), Some("Mirror attachment"));
        assert_eq!(
            resolver.resolve("Panel Precision AA (LAA) log"),
            Some("PANEL PRECISION AA（LAA）")
        );
        assert_eq!(resolver.resolve("LED module attachment"), Some("LED Module  attachment"));
    }

    #[test]
    fn alias_rescues_and_overrides() {
        let catalog = Catalog::default();
        let resolver = StationResolver::new(&catalog);
        assert_eq!(resolver.resolve("Post-DAA"), Some("POST DAA INSPECTION"));

        let catalog = Catalog::new(["A", "B"]).unwrap().with_aliases([("special", "B")]).unwrap();
        let resolver = StationResolver::new(&catalog);
        assert_eq!(resolver.resolve("A special"), Some("B"));
        assert_eq!(resolver.resolve("A plain"), Some("A"));
    }
}
