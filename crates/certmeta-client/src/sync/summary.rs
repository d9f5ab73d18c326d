//! Run summary and per-category accounting.

use std::fmt;

use certmeta_core::FlushBuffer;

use super::settings::SyncMode;

/// Counts reported at the end of a run.
///
/// Every certificate seen lands in exactly one of `updated`, `partial`,
/// `unmatched`, `skipped` or `failed`. `missing_custom_fields` counts
/// certificates carrying values for fields that could not be resolved and
/// overlaps the other categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub mode: SyncMode,
    pub pages: u32,
    pub certificates: usize,
    pub updated: usize,
    pub partial: usize,
    pub unmatched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub missing_custom_fields: usize,
    pub fields_created: usize,
}

impl SyncSummary {
    #[must_use]
    pub fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            pages: 0,
            certificates: 0,
            updated: 0,
            partial: 0,
            unmatched: 0,
            skipped: 0,
            failed: 0,
            missing_custom_fields: 0,
            fields_created: 0,
        }
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sync summary ({})", self.mode)?;
        writeln!(f, "  pages processed:        {}", self.pages)?;
        writeln!(f, "  certificates seen:      {}", self.certificates)?;
        writeln!(f, "  fully updated:          {}", self.updated)?;
        writeln!(f, "  partially processed:    {}", self.partial)?;
        writeln!(f, "  unmatched:              {}", self.unmatched)?;
        writeln!(f, "  skipped:                {}", self.skipped)?;
        writeln!(f, "  failed:                 {}", self.failed)?;
        writeln!(f, "  missing custom fields:  {}", self.missing_custom_fields)?;
        write!(f, "  fields created:         {}", self.fields_created)
    }
}

/// Summary counters plus one flush buffer per category.
pub(crate) struct Accounting {
    summary: SyncSummary,
    updated: FlushBuffer,
    partial: FlushBuffer,
    unmatched: FlushBuffer,
    skipped: FlushBuffer,
    failed: FlushBuffer,
    missing: FlushBuffer,
}

impl Accounting {
    pub(crate) fn new(mode: SyncMode) -> Self {
        Self {
            summary: SyncSummary::new(mode),
            updated: FlushBuffer::new("updated"),
            partial: FlushBuffer::new("partial"),
            unmatched: FlushBuffer::new("unmatched"),
            skipped: FlushBuffer::new("skipped"),
            failed: FlushBuffer::new("failed"),
            missing: FlushBuffer::new("missing_custom_fields"),
        }
    }

    pub(crate) fn field_created(&mut self) {
        self.summary.fields_created += 1;
    }

    pub(crate) fn page(&mut self, certificates: usize) {
        self.summary.pages += 1;
        self.summary.certificates += certificates;
    }

    pub(crate) fn updated(&mut self, entry: String) {
        self.summary.updated += 1;
        self.updated.push(entry);
    }

    pub(crate) fn partial(&mut self, entry: String) {
        self.summary.partial += 1;
        self.partial.push(entry);
    }

    pub(crate) fn unmatched(&mut self, entry: String) {
        self.summary.unmatched += 1;
        self.unmatched.push(entry);
    }

    pub(crate) fn skipped(&mut self, entry: String) {
        self.summary.skipped += 1;
        self.skipped.push(entry);
    }

    pub(crate) fn failed(&mut self, entry: String) {
        self.summary.failed += 1;
        self.failed.push(entry);
    }

    pub(crate) fn missing_fields(&mut self, entry: String) {
        self.summary.missing_custom_fields += 1;
        self.missing.push(entry);
    }

    /// Flush whatever is still buffered and return the counts.
    pub(crate) fn finish(mut self) -> SyncSummary {
        for buffer in [
            &mut self.updated,
            &mut self.partial,
            &mut self.unmatched,
            &mut self.skipped,
            &mut self.failed,
            &mut self.missing,
        ] {
            buffer.flush();
        }
        self.summary
    }
}
