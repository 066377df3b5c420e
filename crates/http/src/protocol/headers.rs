use std::borrow::Cow;
use std::collections::HashMap;

/// An ordered, case-insensitive header multimap.
///
/// Each logical header name is stored once, under the casing it was first given.
/// Lookups ignore case. Insertion order is kept, except that [`Headers::set_first`]
/// moves a header to the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
    // lower-cased name -> position in `entries`
    index: HashMap<String, usize>,
}

fn normalize(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(normalize(name).as_ref()).copied()
    }

    fn push(&mut self, name: &str, values: Vec<String>) {
        self.index.insert(name.to_ascii_lowercase(), self.entries.len());
        self.entries.push((name.to_string(), values));
    }

    fn reindex(&mut self) {
        self.index = self.entries.iter().enumerate().map(|(i, (name, _))| (name.to_ascii_lowercase(), i)).collect();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values of a header, empty when it is absent.
    pub fn get(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(index) => &self.entries[index].1,
            None => &[],
        }
    }

    /// All values of a header joined with `,`, empty when it is absent.
    pub fn get_line(&self, name: &str) -> String {
        self.get(name).join(",")
    }

    /// Replace the values of a header. An existing header keeps its casing and position.
    pub fn set<V: IntoHeaderValues>(&mut self, name: &str, values: V) {
        let values = values.into_header_values();
        match self.position(name) {
            Some(index) => self.entries[index].1 = values,
            None => self.push(name, values),
        }
    }

    /// Add values to a header, creating it when absent.
    pub fn append<V: IntoHeaderValues>(&mut self, name: &str, values: V) {
        let values = values.into_header_values();
        match self.position(name) {
            Some(index) => self.entries[index].1.extend(values),
            None => self.push(name, values),
        }
    }

    /// Remove a header, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                self.reindex();
                true
            }
            None => false,
        }
    }

    /// Remove any existing header with this name, then insert it at position 0.
    pub fn set_first<V: IntoHeaderValues>(&mut self, name: &str, values: V) {
        if let Some(index) = self.position(name) {
            self.entries.remove(index);
        }
        self.entries.insert(0, (name.to_string(), values.into_header_values()));
        self.reindex();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: IntoHeaderValues> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, values) in iter {
            headers.append(name.as_ref(), values);
        }
        headers
    }
}

/// A single header value or a list of them.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for &String {
    fn into_header_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoHeaderValues for Vec<String> {
    fn into_header_values(self) -> Vec<String> {
        self
    }
}

impl IntoHeaderValues for Vec<&str> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|value| (*value).to_string()).collect()
    }
}

impl IntoHeaderValues for &[String] {
    fn into_header_values(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoHeaderValues for [&str; N] {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}
