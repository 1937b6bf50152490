//! Ordered, case-insensitive header list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Header pairs in transmission order.
///
/// Lookups ignore ASCII case; the original casing of each name is kept for
/// sending. A lowercase-name index makes `contains` O(1), which the header
/// projector leans on when deciding what to strip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct HeaderList {
    entries: Vec<(String, String)>,
    /// Lowercased name -> number of entries carrying it.
    index: HashMap<String, usize>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header after all existing ones, keeping duplicates.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        *self.index.entry(name.to_ascii_lowercase()).or_insert(0) += 1;
        self.entries.push((name, value.into()));
    }

    /// Replace the first header called `name` in place and drop any later
    /// duplicates; append when absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(pos) => {
                self.entries[pos].1 = value;
                let mut seen = 0usize;
                self.entries.retain(|(n, _)| {
                    if n.eq_ignore_ascii_case(&name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
                self.index.insert(name.to_ascii_lowercase(), 1);
            }
            None => self.append(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        if !self.contains(name) {
            return None;
        }
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// Remove every header called `name`; returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let Some(count) = self.index.remove(&name.to_ascii_lowercase()) else {
            return 0;
        };
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderList::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

impl From<Vec<(String, String)>> for HeaderList {
    fn from(pairs: Vec<(String, String)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<HeaderList> for Vec<(String, String)> {
    fn from(headers: HeaderList) -> Self {
        headers.entries
    }
}
