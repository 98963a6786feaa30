//! Rename migration: a cache entry whose content
//! survived a move is relocated without re-analysis.

use std::path::Path;

use crate::cache::FileCacheEntry;

/// Copies `entry` to `to`, rewriting the entry's own path and every
/// finding's `file`/`longId` fields to reference the new location.
/// Callers are expected to have already verified the content hash match
/// and to delete the old entry themselves.
pub fn migrate_rename(entry: &FileCacheEntry, to: &Path) -> FileCacheEntry {
    let mut migrated = entry.clone();
    migrated.file_path = to.to_path_buf();
    for finding in &mut migrated.findings {
        finding.file = to.to_path_buf();
        finding.long_id = crate::analyzer::Finding::make_long_id(
            &finding.symbol.package,
            &finding.symbol.export,
            to,
            finding.location,
        );
        finding.id = crate::analyzer::Finding::short_id(&finding.long_id);
    }
    migrated
}
