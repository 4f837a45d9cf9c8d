//! Plain paged enumeration over the documents table.

use chrono::Utc;

use lattice_core::query::{
    DEFAULT_MAX_RESULTS, EnumerationQuery, EnumerationResult, TimestampRange, records_remaining,
};
use lattice_storage::repo::documents;

use crate::error::Result;
use crate::Lattice;

impl Lattice {
    /// Enumerates documents, globally or scoped to one collection. Applies
    /// LIMIT before hydration like search does.
    pub fn enumerate(&self, query: &EnumerationQuery) -> Result<EnumerationResult> {
        let start = Utc::now();

        let collection = match &query.collection_id {
            Some(id) => Some(self.require_collection(id)?),
            None => None,
        };

        let max_results = query.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let skip = query.skip.unwrap_or(0);
        let ordering = query.ordering.unwrap_or_default();
        let scope = collection.as_ref().map(|c| c.id.as_str());

        let total_records = documents::count(self.adapter.as_ref(), scope)?;
        let rows = documents::page(self.adapter.as_ref(), scope, ordering, max_results, skip)?;

        let mut objects = Vec::with_capacity(rows.len());
        for mut doc in rows {
            // Enumeration never attaches content, so no directory is needed.
            self.hydrate_document(&mut doc, "", false)?;
            objects.push(doc);
        }

        let remaining = records_remaining(total_records, skip, objects.len());
        Ok(EnumerationResult {
            success: true,
            timestamp: TimestampRange {
                start,
                end: Utc::now(),
            },
            max_results,
            end_of_results: remaining == 0,
            total_records,
            records_remaining: remaining,
            objects,
        })
    }
}
