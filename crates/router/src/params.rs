//! Path parameters captured during dispatch.
//!
//! Parameters keep their capture order: named captures use the parameter name as
//! the key, anonymous captures (wildcards, regex groups) use decimal index keys
//! `"0"`, `"1"`, ... The map is tiny in practice, so lookups are linear scans.

/// An ordered map of captured path parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    items: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Gets a parameter value by name.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.items.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Inserts or replaces a parameter, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.items.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.items.push((name, value)),
        }
    }

    /// Iterates parameters in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Merges a layer's captures over the params present when the router was
    /// entered. Child captures win on name collision. When both sides carry
    /// index-keyed captures, the child's indices are shifted past the parent's
    /// run so neither side's captures are lost.
    pub(crate) fn merge(child: &Params, parent: &Params) -> Params {
        if parent.is_empty() {
            return child.clone();
        }

        let mut merged = parent.clone();
        let child_run = child.indexed_run();
        let parent_run = parent.indexed_run();

        if child_run == 0 || parent_run == 0 {
            for (name, value) in child.iter() {
                merged.insert(name, value);
            }
            return merged;
        }

        for (name, value) in child.iter() {
            match name.parse::<usize>() {
                Ok(index) if index < child_run => merged.insert((index + parent_run).to_string(), value),
                _ => merged.insert(name, value),
            }
        }
        merged
    }

    /// Length of the consecutive run of index keys starting at `"0"`.
    fn indexed_run(&self) -> usize {
        let mut run = 0;
        while self.get(run.to_string()).is_some() {
            run += 1;
        }
        run
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}
