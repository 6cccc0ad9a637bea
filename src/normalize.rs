/// Resolve a possibly-relative asset URL against a provider base.
///
/// Anything that already mentions "http" is taken as absolute and returned
/// untouched. No validation happens; odd input comes back as odd output.
pub fn normalize(candidate: &str, base: &str) -> String {
    if candidate.contains("http") {
        candidate.to_string()
    } else if candidate.starts_with('/') {
        format!("{base}{candidate}")
    } else {
        format!("{base}/{candidate}")
    }
}
