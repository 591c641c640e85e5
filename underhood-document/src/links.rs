use std::collections::BTreeSet;

/// External links gathered over one document build. Insertion is
/// idempotent and there is no removal.
#[derive(Debug, Clone, Default)]
pub struct LinkCollector {
    links: BTreeSet<String>,
}

impl LinkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the link was already present.
    pub fn add(&mut self, url: impl Into<String>) -> bool {
        self.links.insert(url.into())
    }

    /// Links in ascending lexicographic order.
    pub fn snapshot(&self) -> Vec<String> {
        self.links.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Extend<String> for LinkCollector {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.links.extend(iter);
    }
}
