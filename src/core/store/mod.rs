//! Client-side state over the services: the cached list, loading flags and
//! the last error, kept consistent with the server after every mutation.

pub mod admin;
pub mod automation;
pub mod knowledge;

use serde::{Deserialize, Serialize};

pub use admin::AdminDataStore;
pub use automation::{AutomationTaskStore, Operator};
pub use knowledge::KnowledgeBaseStore;

/// How a store brings its local list back in line after a successful
/// mutation. Failed mutations never touch local data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reconcile {
    /// Merge the server's answer into the list.
    Local,
    /// Reload the whole list.
    #[default]
    Refetch,
}

impl Reconcile {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Reconcile::Local),
            "refetch" => Some(Reconcile::Refetch),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Reconcile::Local => "local",
            Reconcile::Refetch => "refetch",
        }
    }
}

/// Replaces the entry with the same id, or appends when there is none.
pub(crate) fn upsert_by<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &str) {
    let key = id(&item).to_string();
    match items.iter_mut().find(|existing| id(&**existing) == key) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_names() {
        assert_eq!(Reconcile::from_name("Refetch"), Some(Reconcile::Refetch));
        assert_eq!(Reconcile::from_name("local"), Some(Reconcile::Local));
        assert_eq!(Reconcile::from_name("optimistic"), None);
        assert_eq!(Reconcile::default().as_str(), "refetch");
    }

    #[test]
    fn upsert_replaces_or_appends() {
        let mut items = vec![("a", 1), ("b", 2)];
        upsert_by(&mut items, ("b", 5), |i| i.0);
        upsert_by(&mut items, ("c", 3), |i| i.0);
        assert_eq!(items, vec![("a", 1), ("b", 5), ("c", 3)]);
    }
}
