use crate::types::{FacetEntry, TaxonomyFacet};

/// Entries of the facet whose name equals `target` exactly.
///
/// The container's slot order differs between upstreams, so only the embedded
/// facet name is trusted. A missing facet is an empty result, not an error.
pub fn resolve_facet<'a>(container: &'a [TaxonomyFacet; 4], target: &str) -> &'a [FacetEntry] {
    container
        .iter()
        .find(|facet| facet.facet_name == target)
        .map(|facet| facet.entries.as_slice())
        .unwrap_or(&[])
}

/// Labels of a facet, in upstream order.
pub fn facet_labels(container: &[TaxonomyFacet; 4], target: &str) -> Vec<String> {
    resolve_facet(container, target)
        .iter()
        .map(|e| e.label.clone())
        .collect()
}

/// First entry of a year-like facet parsed as a number.
pub fn facet_year(container: &[TaxonomyFacet; 4], target: &str) -> Option<u32> {
    resolve_facet(container, target)
        .first()
        .and_then(|e| e.label.trim().parse().ok())
}
