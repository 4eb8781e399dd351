/// The placeholder a URL template uses for the version of `library`.
pub fn version_placeholder(library: &str) -> String {
    format!("${{library.{library}.version}}")
}

/// Substitute `version` for every `${library.<library>.version}` in
/// `template`.
///
/// The library name is matched literally. Placeholders naming other
/// libraries are left as they are, and a template without any placeholder is
/// returned unchanged (a static URL).
pub fn resolve_url(template: &str, library: &str, version: &str) -> String {
    template.replace(&version_placeholder(library), version)
}
