use super::filter::{FilingSet, RowFilter, RowPredicate, TagVersionSet};
use super::source::RecordSource;
use crate::core::errors::Result;
use std::collections::HashSet;
use std::io::Read;

/// Accession numbers of every `sub` row whose `name` equals `company`
/// (case-insensitive) and whose `form` is one of `forms` (exact).
///
/// An empty result is not an error here; the caller decides whether it is terminal.
pub fn resolve_filings<R: Read>(
    source: &mut RecordSource<R>,
    company: &str,
    forms: &HashSet<String>,
) -> Result<FilingSet> {
    let adsh = source.require_column("adsh")?;
    let name = source.require_column("name")?;
    let form = source.require_column("form")?;
    let company = company.trim().to_lowercase();

    let mut filings = FilingSet::new();
    while let Some(row) = source.next_row()? {
        let matches_form = row.get(form).is_some_and(|f| forms.contains(&*f));
        if !matches_form {
            continue;
        }
        let matches_name = row
            .get(name)
            .is_some_and(|n| n.to_lowercase() == company);
        if matches_name {
            if let Some(id) = row.get(adsh) {
                filings.insert(id.into_owned());
            }
        }
    }

    log::debug!(
        "Resolved {} filings for '{}' from {}",
        filings.len(),
        company,
        source.path().display()
    );
    Ok(filings)
}

/// `(tag, version)` pairs referenced by presentation rows of `filings`.
///
/// Must run over the `pre` file of the same quarter whose `tag` file is then filtered.
pub fn resolve_tag_versions<R: Read>(
    source: &mut RecordSource<R>,
    filings: &FilingSet,
) -> Result<TagVersionSet> {
    let keep = RowFilter::field_in("adsh", filings).bind(source)?;
    let tag = source.require_column("tag")?;
    let version = source.require_column("version")?;

    let mut pairs = TagVersionSet::new();
    while let Some(row) = source.next_row()? {
        if !keep.keep(&row) {
            continue;
        }
        if let (Some(tag), Some(version)) = (row.get(tag), row.get(version)) {
            pairs.insert(&tag, &version);
        }
    }

    log::debug!(
        "Resolved {} tag versions from {}",
        pairs.len(),
        source.path().display()
    );
    Ok(pairs)
}
