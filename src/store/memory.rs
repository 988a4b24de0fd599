use std::collections::BTreeMap;

use serde_json::Value;

use super::{Batch, KeyValueStore};
use crate::error::Result;

/// In-process store. Backs the server when no database is configured and
/// every test.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn apply(&mut self, batch: Batch) -> Result<()> {
        for (key, value) in batch {
            match value {
                Some(value) => {
                    self.entries.insert(key.to_string(), value);
                }
                None => {
                    self.entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_puts_and_deletes() {
        let mut store = MemoryStore::from_entries([("a", json!(1))]);
        store
            .apply(vec![("a", None), ("b", Some(json!("x")))])
            .unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), Some(json!("x")));
        assert_eq!(store.len(), 1);
    }
}
