pub mod affiliation;
pub mod html;
pub mod walker;

pub use affiliation::{Affiliation, AffiliationParser, KeywordAffiliationParser, Mention};
pub use html::{parse_owner_page, Holding, OwnerPage};
pub use walker::{discover_html_files, PageFile};

use std::path::Path;

use crate::error::{OwnergraphError, Result};
use crate::model::{Entity, Relationship};
use crate::network::Network;

/// What one page contributed to the network.
#[derive(Debug, Default)]
pub struct PageOutcome {
    pub relationships_added: usize,
    /// Records skipped or degraded; none of them stop the page.
    pub issues: Vec<OwnergraphError>,
}

/// Totals for a directory ingestion.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub files_seen: usize,
    pub files_ingested: usize,
    pub relationships_added: usize,
    /// Files that could not be read, with the reason.
    pub failed_files: Vec<(String, OwnergraphError)>,
    /// Per-record problems across all pages.
    pub issues: Vec<OwnergraphError>,
}

/// Feed one parsed owner page into the network.
///
/// The owner and every holding are upserted, each holding gets a direct
/// `owns` relationship, and affiliation texts become family relationships.
/// A relative not yet known under any kind is registered as an owner.
pub fn ingest_page(
    network: &mut Network,
    page: OwnerPage,
    parser: &dyn AffiliationParser,
) -> PageOutcome {
    let mut outcome = PageOutcome {
        issues: page.issues,
        ..PageOutcome::default()
    };

    let Some(owner) = page.owner else {
        return outcome;
    };
    let owner_id = owner.id.clone();
    network.upsert_entity(owner);

    for holding in page.holdings {
        let relationship = Relationship::owns(owner_id.clone(), &holding.entity, holding.percentage);
        network.upsert_entity(holding.entity);
        record(network, relationship, &mut outcome);
    }

    for text in &page.affiliations {
        let affiliation = parser.parse(text);
        let (Some(relation_type), Some(mention)) = (affiliation.relation_type(), affiliation.mention())
        else {
            log::debug!("Unrecognized affiliation text: {:?}", text);
            continue;
        };

        let relative = Entity::owner(mention.name.clone()).with_description(mention.description.clone());
        if relative.id == owner_id {
            continue;
        }
        if !network.contains(&relative.id) {
            network.upsert_entity(relative.clone());
        }

        let relationship = Relationship::new(
            owner_id.clone(),
            relative.id,
            relation_type,
            0.0,
            mention.description.clone(),
        );
        record(network, relationship, &mut outcome);
    }

    outcome
}

fn record(network: &mut Network, relationship: Relationship, outcome: &mut PageOutcome) {
    match network.add_relationship(relationship) {
        Ok(()) => outcome.relationships_added += 1,
        Err(e) => {
            log::warn!("Skipping relationship: {}", e);
            outcome.issues.push(e);
        }
    }
}

/// Discover, parse and ingest every owner page under `root`.
///
/// Unreadable files are logged and reported; they do not stop the run.
pub fn ingest_directory(
    network: &mut Network,
    root: &Path,
    parser: &dyn AffiliationParser,
) -> Result<IngestReport> {
    let files = discover_html_files(root)?;
    let mut report = IngestReport {
        files_seen: files.len(),
        ..IngestReport::default()
    };

    for (idx, file) in files.iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", idx + 1, files.len(), file.relative_path);

        let html = match std::fs::read_to_string(&file.absolute_path) {
            Ok(html) => html,
            Err(e) => {
                log::error!("✗ {}: {}", file.relative_path, e);
                report.failed_files.push((file.relative_path.clone(), OwnergraphError::Io(e)));
                continue;
            }
        };

        let page = parse_owner_page(&html);
        let owner_name = page.owner.as_ref().map(|o| o.name.clone()).unwrap_or_default();
        let outcome = ingest_page(network, page, parser);

        log::info!(
            "✓ {} ({}: {} relationships, {} issues)",
            file.relative_path,
            owner_name,
            outcome.relationships_added,
            outcome.issues.len()
        );

        report.files_ingested += 1;
        report.relationships_added += outcome.relationships_added;
        report.issues.extend(outcome.issues);
    }

    Ok(report)
}
