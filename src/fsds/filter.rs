use super::source::{RecordSource, Row};
use crate::core::errors::Result;
use std::collections::{HashMap, HashSet};
use std::io::Read;

/// Accession numbers (`adsh`) of the selected filings.
pub type FilingSet = HashSet<String>;

/// `(tag, version)` pairs referenced by presentation rows of the selected filings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagVersionSet {
    versions_by_tag: HashMap<String, HashSet<String>>,
    len: usize,
}

impl TagVersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: &str, version: &str) -> bool {
        let inserted = match self.versions_by_tag.get_mut(tag) {
            Some(versions) => versions.insert(version.to_string()),
            None => {
                self.versions_by_tag
                    .insert(tag.to_string(), HashSet::from([version.to_string()]));
                true
            }
        };
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn contains(&self, tag: &str, version: &str) -> bool {
        self.versions_by_tag
            .get(tag)
            .is_some_and(|versions| versions.contains(version))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: AsRef<str>, V: AsRef<str>> FromIterator<(T, V)> for TagVersionSet {
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        let mut set = TagVersionSet::new();
        for (tag, version) in iter {
            set.insert(tag.as_ref(), version.as_ref());
        }
        set
    }
}

/// Decides whether a row is kept.
pub trait RowPredicate {
    fn keep(&self, row: &Row) -> bool;
}

impl<F: Fn(&Row) -> bool> RowPredicate for F {
    fn keep(&self, row: &Row) -> bool {
        self(row)
    }
}

/// Membership filter described by column names; [`RowFilter::bind`] resolves
/// them against a source header.
#[derive(Debug, Clone, Copy)]
pub enum RowFilter<'a> {
    AcceptAll,
    FieldIn {
        column: &'a str,
        values: &'a FilingSet,
    },
    PairIn {
        columns: (&'a str, &'a str),
        values: &'a TagVersionSet,
    },
}

impl<'a> RowFilter<'a> {
    pub fn field_in(column: &'a str, values: &'a FilingSet) -> Self {
        RowFilter::FieldIn { column, values }
    }

    pub fn pair_in(first: &'a str, second: &'a str, values: &'a TagVersionSet) -> Self {
        RowFilter::PairIn {
            columns: (first, second),
            values,
        }
    }

    pub fn bind<R: Read>(&self, source: &RecordSource<R>) -> Result<BoundFilter<'a>> {
        Ok(match *self {
            RowFilter::AcceptAll => BoundFilter::AcceptAll,
            RowFilter::FieldIn { column, values } => BoundFilter::FieldIn {
                index: source.require_column(column)?,
                values,
            },
            RowFilter::PairIn { columns, values } => BoundFilter::PairIn {
                indices: (
                    source.require_column(columns.0)?,
                    source.require_column(columns.1)?,
                ),
                values,
            },
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum BoundFilter<'a> {
    AcceptAll,
    FieldIn {
        index: usize,
        values: &'a FilingSet,
    },
    PairIn {
        indices: (usize, usize),
        values: &'a TagVersionSet,
    },
}

impl RowPredicate for BoundFilter<'_> {
    fn keep(&self, row: &Row) -> bool {
        match *self {
            BoundFilter::AcceptAll => true,
            BoundFilter::FieldIn { index, values } => row
                .get(index)
                .is_some_and(|value| values.contains(&*value)),
            BoundFilter::PairIn { indices, values } => {
                match (row.get(indices.0), row.get(indices.1)) {
                    (Some(tag), Some(version)) => values.contains(&tag, &version),
                    _ => false,
                }
            }
        }
    }
}
