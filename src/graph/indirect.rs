//! Indirect ownership: chain direct `owns` stakes through intermediaries.
//!
//! For each owner/entity pair without a direct stake, every simple path of
//! at most `max_hops` edges contributes the product of its edge percentages
//! (as fractions of 100). Contributions are summed per pair. Paths that
//! share an intermediary are not deduplicated, so a shared edge can be
//! counted more than once. The sum is a modeling choice, not a probabilistic
//! combination of stakes.

use super::OwnershipGraph;
use crate::error::OwnergraphError;
use crate::model::{Entity, Relationship};

/// Longest chain, in edges, considered for indirect ownership.
pub const DEFAULT_MAX_HOPS: usize = 3;

/// Summed stakes must exceed this (exclusive) to be recorded.
pub const MATERIALITY_THRESHOLD: f64 = 1.0;

/// Tuning for [`compute_indirect_ownership`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndirectOptions {
    pub max_hops: usize,
    pub materiality_threshold: f64,
}

impl Default for IndirectOptions {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            materiality_threshold: MATERIALITY_THRESHOLD,
        }
    }
}

/// Result of one indirect ownership pass.
#[derive(Debug, Default)]
pub struct IndirectOutcome {
    /// New `indirect_owns` relationships, owners in input order then entities.
    pub relationships: Vec<Relationship>,
    /// Pairs skipped because their paths could not be evaluated.
    pub failures: Vec<OwnergraphError>,
    /// Pairs that had at least one path and were evaluated.
    pub pairs_evaluated: usize,
}

/// Compute indirect ownership for every owner/entity pair.
///
/// `ownership` must be frozen for the whole pass. Per-pair failures are
/// logged and collected; they never stop the batch.
pub fn compute_indirect_ownership<'a, O, E>(
    ownership: &OwnershipGraph,
    owners: O,
    entities: E,
    options: &IndirectOptions,
) -> IndirectOutcome
where
    O: IntoIterator<Item = &'a Entity>,
    E: IntoIterator<Item = &'a Entity>,
{
    let entities: Vec<&Entity> = entities.into_iter().collect();
    let mut outcome = IndirectOutcome::default();

    for owner in owners {
        if !ownership.contains(&owner.id) {
            continue;
        }

        for entity in &entities {
            if owner.id == entity.id {
                continue;
            }
            if ownership.has_edge(&owner.id, &entity.id) {
                continue;
            }
            if !ownership.has_path(&owner.id, &entity.id) {
                continue;
            }

            outcome.pairs_evaluated += 1;

            match pair_indirect_percentage(ownership, &owner.id, &entity.id, options.max_hops) {
                Ok(total) if total > options.materiality_threshold => {
                    log::debug!(
                        "{} indirectly owns {:.2}% of {}",
                        owner.id,
                        total,
                        entity.id
                    );
                    outcome
                        .relationships
                        .push(Relationship::indirect_owns(owner.id.clone(), entity, total));
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Skipping indirect ownership pair: {}", e);
                    outcome.failures.push(e);
                }
            }
        }
    }

    log::info!(
        "Indirect ownership: {} pairs evaluated, {} relationships, {} failures",
        outcome.pairs_evaluated,
        outcome.relationships.len(),
        outcome.failures.len()
    );

    outcome
}

/// Sum of path percentages over all simple paths of at most `max_hops` edges.
pub fn pair_indirect_percentage(
    ownership: &OwnershipGraph,
    source: &str,
    target: &str,
    max_hops: usize,
) -> Result<f64, OwnergraphError> {
    let mut total = 0.0;
    for path in ownership.simple_paths(source, target, max_hops) {
        total += path_percentage(ownership, &path).map_err(|reason| {
            OwnergraphError::PathEnumeration {
                source_id: source.to_string(),
                target_id: target.to_string(),
                reason,
            }
        })?;
    }
    Ok(total)
}

/// `100 * Π(edge / 100)` along `path`.
fn path_percentage(ownership: &OwnershipGraph, path: &[String]) -> Result<f64, String> {
    let mut percentage = 100.0;
    for hop in path.windows(2) {
        let edge = ownership
            .percentage(&hop[0], &hop[1])
            .ok_or_else(|| format!("missing ownership edge {} -> {}", hop[0], hop[1]))?;
        if !edge.is_finite() {
            return Err(format!("non-finite percentage on {} -> {}", hop[0], hop[1]));
        }
        percentage *= edge / 100.0;
    }
    Ok(percentage)
}
