//! Outline source port - interface for structural region extraction.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::errors::DomainResult;
use crate::domain::models::Region;

/// Trait for structural outline extractors.
///
/// Implementations turn a source file into its named regions (functions,
/// classes) plus the synthetic `<module>` region, sorted by start line and
/// non-overlapping. The adapter is re-invoked on every query and must not
/// cache across calls: the agent may edit the file between queries,
/// invalidating old region sets. Callers needing repeated region data for an
/// unmodified file cache at the call site.
#[async_trait]
pub trait OutlineSource: Send + Sync {
    /// Extract the regions of `file_abs`.
    ///
    /// Fails with [`crate::domain::errors::DomainError::OutlineUnavailable`]
    /// when the underlying extractor cannot run or cannot parse the file.
    async fn regions_of(&self, file_abs: &Path) -> DomainResult<Vec<Region>>;
}
