//! Chunk planning: from missing lines to region-scoped units of work.
//!
//! Combines the interval coalescer with the structural outline: each
//! missing-line range is mapped onto the first named region (in outline
//! order) that fully contains it, with the `<module>` region as the
//! fallback. One chunk per distinct region, ordered by source position.

use std::path::Path;

use tokio::fs;

use crate::domain::errors::DomainResult;
use crate::domain::models::{coalesce_lines, Chunk, LineRange, Region};
use crate::domain::ports::OutlineSource;

/// Plan the chunks for one production file.
///
/// The outline is fetched fresh on every call; the file may have been edited
/// by the agent since the last plan. Guarantee: every input missing line
/// appears in exactly one output chunk's ranges - chunks partition the
/// coalesced ranges, never dropping or duplicating a line.
pub async fn plan_chunks(
    outline: &dyn OutlineSource,
    file_abs: &Path,
    missing_lines: &[u32],
) -> DomainResult<Vec<Chunk>> {
    let ranges = coalesce_lines(missing_lines);
    if ranges.is_empty() {
        return Ok(vec![]);
    }

    let regions = outline.regions_of(file_abs).await?;
    let module_region = regions
        .iter()
        .find(|r| r.is_module())
        .cloned()
        .unwrap_or_else(|| {
            // Outline without a module entry: synthesize one spanning at
            // least every reported missing line.
            Region::module(ranges.last().map_or(1, |r| r.end))
        });
    let named: Vec<&Region> = regions.iter().filter(|r| !r.is_module()).collect();

    // Group ranges by their assigned region, preserving encounter order so
    // ranges inside a chunk stay ascending.
    let mut chunks: Vec<Chunk> = Vec::new();
    for range in ranges {
        let region = named
            .iter()
            .find(|r| r.contains(range.start, range.end))
            .map_or(&module_region, |r| *r);

        match chunks.iter_mut().find(|c| c.region.name == region.name) {
            Some(chunk) => chunk.ranges.push(range),
            None => chunks.push(Chunk::new(region.clone(), vec![range])),
        }
    }

    // Order chunks by where their work sits in the file. For named regions
    // this is the region start order; the fallback chunk sorts by its first
    // range, so stray lines before the first function still come first and
    // trailing module-level lines still come last.
    chunks.sort_by_key(|c| {
        if c.region.is_module() {
            c.ranges.first().map_or(u32::MAX, |r| r.start)
        } else {
            c.region.start
        }
    });

    Ok(chunks)
}

/// Render the source snippet for `[start, end]` (1-indexed, inclusive).
pub async fn read_snippet(file_abs: &Path, start: u32, end: u32) -> std::io::Result<String> {
    let text = fs::read_to_string(file_abs).await?;
    let snippet: Vec<&str> = text
        .lines()
        .skip(start.saturating_sub(1) as usize)
        .take((end.saturating_sub(start) + 1) as usize)
        .collect();
    Ok(snippet.join("\n"))
}

/// Total number of lines covered by a chunk list, for partition checks.
#[cfg(test)]
fn covered_lines(chunks: &[Chunk]) -> Vec<u32> {
    let mut lines: Vec<u32> = chunks
        .iter()
        .flat_map(|c| c.ranges.iter().flat_map(LineRange::lines))
        .collect();
    lines.sort_unstable();
    lines
}
