//! Ordered, case-insensitive, multi-value header collection.
//!
//! [`Headers`] keeps items in insertion order and allows the same name to
//! appear several times. Lookups ignore ASCII case.
//!
//! # Example
//!
//! ```
//! use haul_core::Headers;
//!
//! let mut headers = Headers::new();
//! headers.add_value("Accept", "application/json");
//! headers.add_value("accept", "text/plain");
//!
//! assert_eq!(headers.get("ACCEPT"), vec!["application/json", "text/plain"]);
//! assert_eq!(headers.len(), 2);
//! ```

/// A single header name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderItem {
    name: String,
    value: String,
}

impl HeaderItem {
    /// Creates a new header item.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Header name, as given.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` if this item has the given name, ignoring ASCII case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    fn same_as(&self, other: &Self) -> bool {
        self.has_name(&other.name) && self.value == other.value
    }
}

/// Ordered collection of header items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    items: Vec<HeaderItem>,
}

impl Headers {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    ///
    /// Repeated names are kept. An item equal to one already present
    /// (same name ignoring case, same value) is not added twice.
    pub fn add(&mut self, item: HeaderItem) {
        if !self.items.iter().any(|existing| existing.same_as(&item)) {
            self.items.push(item);
        }
    }

    /// Appends a name/value pair, see [`Headers::add`].
    pub fn add_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.add(HeaderItem::new(name, value));
    }

    /// Appends all items, see [`Headers::add`].
    pub fn add_all(&mut self, items: impl IntoIterator<Item = HeaderItem>) {
        for item in items {
            self.add(item);
        }
    }

    /// Values for `name` in insertion order, empty if absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| item.has_name(name))
            .map(HeaderItem::value)
            .collect()
    }

    /// First value for `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.has_name(name))
            .map(HeaderItem::value)
    }

    /// Returns `true` if at least one item has the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.has_name(name))
    }

    /// Appends every item of `other` after the existing ones.
    ///
    /// Nothing is overwritten or de-duplicated.
    pub fn merge(&mut self, other: &Self) {
        self.items.extend(other.items.iter().cloned());
    }

    /// Total number of items (not unique names).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the collection has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, HeaderItem> {
        self.items.iter()
    }
}

impl FromIterator<HeaderItem> for Headers {
    fn from_iter<I: IntoIterator<Item = HeaderItem>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.add_all(iter);
        headers
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, value)| HeaderItem::new(name, value))
            .collect()
    }
}

impl IntoIterator for Headers {
    type Item = HeaderItem;
    type IntoIter = std::vec::IntoIter<HeaderItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a HeaderItem;
    type IntoIter = std::slice::Iter<'a, HeaderItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
