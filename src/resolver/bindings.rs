//! Package-name extraction and the dual-indexed binding table.

use std::collections::HashMap;

use crate::ast::ImportKind;

/// Extracts the package identity from an import source string.
/// Relative/absolute sources return `None`. Scoped packages (`@org/pkg`)
/// keep their first two slash-delimited segments; everything else keeps
/// its first segment, discarding any subpath (`react-dom/client` ->
/// `react-dom`) — framework plug-ins canonicalize subpaths further
/// upstream of this call.
pub fn extract_package_name(source: &str) -> Option<String> {
    if source.starts_with('.') || source.starts_with('/') {
        return None;
    }
    let mut segments = source.split('/');
    let first = segments.next()?;
    if first.starts_with('@') {
        let second = segments.next();
        return Some(match second {
            Some(s) => format!("{first}/{s}"),
            None => first.to_string(),
        });
    }
    Some(first.to_string())
}

#[derive(Clone, Debug)]
pub struct Binding {
    pub package: String,
    pub export: String,
    pub kind: ImportKind,
}

/// Two maps: one for call-target-by-local-name, a
/// second for namespace-like receivers (default/namespace imports used as
/// `Receiver.member()`). A named alias (`useState as useMyState`) is
/// stored only under its canonical export name; the analyzer never sees
/// the local alias.
#[derive(Default)]
pub struct BindingTable {
    direct: HashMap<String, Binding>,
    namespace_like: HashMap<String, (String, ImportKind)>,
}

impl BindingTable {
    pub fn bind(&mut self, local: String, binding: Binding) {
        self.direct.insert(local, binding);
    }

    pub fn bind_namespace_like(&mut self, local: String, package: String, kind: ImportKind) {
        self.namespace_like.insert(local, (package, kind));
    }

    pub fn get(&self, local: &str) -> Option<&Binding> {
        self.direct.get(local)
    }

    pub fn get_namespace_like(&self, local: &str) -> Option<(&String, &ImportKind)> {
        self.namespace_like.get(local).map(|(pkg, kind)| (pkg, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_sources_are_nil() {
        assert_eq!(extract_package_name("./local"), None);
        assert_eq!(extract_package_name("/abs"), None);
    }

    #[test]
    fn scoped_package_keeps_two_segments() {
        assert_eq!(extract_package_name("@scope/pkg/sub"), Some("@scope/pkg".to_string()));
    }

    #[test]
    fn plain_package_drops_subpath() {
        assert_eq!(extract_package_name("react-dom/client"), Some("react-dom".to_string()));
    }
}
