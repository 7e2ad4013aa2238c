//! # Method table.
//!
//! Two-level map `category -> name -> Method` owned by one [`Service`](super::Service).
//!
//! ## Rules
//! - Method names may carry a category prefix: `"sub/name"` lives under `/sub`,
//!   a plain `"name"` under `/`.
//! - Inserting an existing `(category, name)` replaces the entry.
//! - Iteration order is sorted (used by the `info` built-in).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::endpoints::Method;
use crate::error::ServiceError;

/// Root category.
pub(crate) const ROOT_CATEGORY: &str = "/";

/// Splits a method name into `(category, name)`.
pub(crate) fn split_name(full: &str) -> Result<(String, String), ServiceError> {
    let trimmed = full.trim_start_matches('/');
    let invalid = || ServiceError::InvalidMethodName {
        name: full.to_string(),
    };

    match trimmed.rsplit_once('/') {
        Some((_, "")) => Err(invalid()),
        Some((category, name)) => Ok((format!("/{category}"), name.to_string())),
        None if trimmed.is_empty() => Err(invalid()),
        None => Ok((ROOT_CATEGORY.to_string(), trimmed.to_string())),
    }
}

#[derive(Default)]
pub(crate) struct MethodTable {
    categories: BTreeMap<String, BTreeMap<String, Arc<Method>>>,
}

impl MethodTable {
    /// Inserts a method; returns the one it replaced, if any.
    pub(crate) fn insert(&mut self, method: Arc<Method>) -> Option<Arc<Method>> {
        self.categories
            .entry(method.category().to_string())
            .or_default()
            .insert(method.name().to_string(), method)
    }

    pub(crate) fn get(&self, category: &str, name: &str) -> Option<Arc<Method>> {
        self.categories.get(category)?.get(name).cloned()
    }

    /// Rendered routes, `category/name` (root methods render as `/name`).
    pub(crate) fn routes(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(category, names)| {
                names.keys().map(move |name| {
                    if category == ROOT_CATEGORY {
                        format!("/{name}")
                    } else {
                        format!("{category}/{name}")
                    }
                })
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn method(category: &str, name: &str) -> Arc<Method> {
        Arc::new(Method::new(category.into(), name.into(), Value::Null))
    }

    #[test]
    fn names_split_into_category_and_method() {
        assert_eq!(split_name("ping").expect("ok"), ("/".into(), "ping".into()));
        assert_eq!(split_name("sub/ping").expect("ok"), ("/sub".into(), "ping".into()));
        assert_eq!(split_name("/a/b/c").expect("ok"), ("/a/b".into(), "c".into()));
        assert!(split_name("").is_err());
        assert!(split_name("/").is_err());
        assert!(split_name("sub/").is_err());
    }

    #[test]
    fn reinsert_replaces() {
        let mut t = MethodTable::default();
        assert!(t.insert(method("/", "ping")).is_none());
        assert!(t.insert(method("/", "ping")).is_some());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn routes_are_sorted_and_rendered() {
        let mut t = MethodTable::default();
        t.insert(method("/sub", "b"));
        t.insert(method("/", "quit"));
        t.insert(method("/", "info"));
        assert_eq!(t.routes(), vec!["/info", "/quit", "/sub/b"]);
        assert!(t.get("/sub", "b").is_some());
        assert!(t.get("/", "b").is_none());
    }
}
