/// Name -> value mapping that keeps insertion order.
///
/// Result and timer sets hold a handful of entries, so lookups are linear scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedValues<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for NamedValues<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> NamedValues<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `name`, returning the previous value if there was one.
    /// An overwritten entry keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.position(name).map(|idx| &mut self.entries[idx].1)
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for NamedValues<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = NamedValues::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}
