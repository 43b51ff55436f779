use std::fmt;
use std::sync::Arc;

/// Identifier of an instrumented type: the key of a registry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetType(Arc<str>);

impl TargetType {
    /// Target named after a Rust type's path.
    pub fn of<T: ?Sized>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    pub fn named(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Path without generic arguments.
    fn path(&self) -> &str {
        match self.0.find('<') {
            Some(i) => &self.0[..i],
            None => &self.0,
        }
    }

    /// Last path segment, e.g. `Invoice` for `billing::model::Invoice<T>`.
    pub fn simple_name(&self) -> &str {
        let path = self.path();
        path.rsplit("::").next().unwrap_or(path)
    }

    /// Module path with `::` turned into `.`; `default` for a bare name.
    pub fn domain(&self) -> String {
        match self.path().rsplit_once("::") {
            Some((module, _)) if !module.is_empty() => module.replace("::", "."),
            _ => "default".to_string(),
        }
    }

    /// `<domain><suffix>:type=<SimpleName>`
    pub fn default_address(&self, suffix: &str) -> String {
        format!("{}{}:type={}", self.domain(), suffix, self.simple_name())
    }

    /// `<domain>.stats:type=<SimpleName>` for an explicit domain.
    pub fn address_in(&self, domain: &str) -> String {
        format!("{}.stats:type={}", domain, self.simple_name())
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetType {
    fn from(s: &str) -> Self {
        Self::named(s)
    }
}
