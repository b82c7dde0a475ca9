use super::Record;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Deduplicated rows of one table, ordered by natural key.
#[derive(Debug, Clone)]
pub struct ScrapeTable<R: Record> {
    rows: BTreeMap<R::Key, R>,
}

impl<R: Record> Default for ScrapeTable<R> {
    fn default() -> Self {
        Self { rows: BTreeMap::new() }
    }
}

impl<R: Record> ScrapeTable<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, or fold it into the row already stored under the same key.
    ///
    /// Returns `true` when the key was not present before.
    pub fn upsert(&mut self, record: R) -> bool {
        match self.rows.entry(record.key()) {
            Entry::Vacant(entry) => {
                let _ = entry.insert(record);
                true
            }
            Entry::Occupied(mut entry) => {
                entry.get_mut().absorb(record);
                false
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.rows.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }
}

impl<R: Record> FromIterator<R> for ScrapeTable<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            let _ = table.upsert(record);
        }
        table
    }
}

impl<'a, R: Record> IntoIterator for &'a ScrapeTable<R> {
    type Item = &'a R;
    type IntoIter = std::collections::btree_map::Values<'a, R::Key, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.values()
    }
}
