use std::collections::HashMap;

use super::Handle;

/// Contiguous arena of named resources. Names are resolved to handles once, at
/// scene-build time; the render loop only indexes.
pub struct AssetCache<T> {
    items: Vec<T>,
    names: HashMap<String, Handle<T>>,
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Inserts `item` under `name`. A repeated name points at the newest item.
    pub fn insert(&mut self, name: impl Into<String>, item: T) -> Handle<T> {
        let handle = Handle::new(self.items.len());
        self.items.push(item);
        self.names.insert(name.into(), handle);
        handle
    }

    pub fn lookup(&self, name: &str) -> Option<Handle<T>> {
        self.names.get(name).copied()
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    /// Removes every item, newest first. Handles issued so far become dangling.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.names.clear();
        self.items.drain(..).rev()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_inserted_name() {
        let mut cache = AssetCache::new();
        let a = cache.insert("a", 1);
        let b = cache.insert("b", 2);

        assert_eq!(cache.lookup("a"), Some(a));
        assert_eq!(cache.get(b), Some(&2));
        assert_eq!(cache.lookup("missing"), None);
    }

    #[test]
    fn drain_yields_newest_first_and_empties() {
        let mut cache = AssetCache::new();
        cache.insert("first", 1);
        cache.insert("second", 2);

        let drained: Vec<_> = cache.drain().collect();
        assert_eq!(drained, vec![2, 1]);
        assert!(cache.is_empty());
        assert_eq!(cache.lookup("first"), None);
    }
}
