use crate::catalog::NameCatalog;

pub const MAX_SUGGESTIONS: usize = 5;

/// Case-insensitive prefix matches in catalog order, capped at
/// [`MAX_SUGGESTIONS`]. An empty `partial` matches everything, so it yields
/// the head of the catalog.
pub fn filter_suggestions(catalog: &NameCatalog, partial: &str) -> Vec<String> {
    let needle = partial.to_lowercase();
    catalog
        .iter()
        .filter(|name| name.to_lowercase().starts_with(&needle))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}
