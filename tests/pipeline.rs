use ownergraph::config::OutputConfig;
use ownergraph::extract::{ingest_directory, KeywordAffiliationParser};
use ownergraph::graph::IndirectOptions;
use ownergraph::{export, Network, RelationType};
use std::fs;
use tempfile::TempDir;

const OWNER_A: &str = r#"<html><head><title>Owner A | MOM</title></head><body>
<div class="box"><h1 class="hl1">Owner A</h1><div class="text">Investor.</div></div>
<div class="subtitle box"><span class="hl2">Media Companies / Groups</span></div>
<div class="teaser company"><a href="/b"><strong class="hl4">Company B</strong><div class="percentage">60%</div></a></div>
<div class="accordeon"><div class="item"><h3 class="hl3">Family &amp; Friends</h3>
  <div class="item"><h4 class="hl4">Affiliated Interests</h4><div class="text">Jane A – wife of Owner A</div></div>
</div></div>
</body></html>"#;

const COMPANY_B: &str = r#"<html><body>
<h1 class="hl1">Company B</h1>
<div class="subtitle box"><span class="hl2">Media Outlets</span></div>
<div class="teaser company"><a href="/c"><strong class="hl4">Outlet C</strong><div class="mediatype">TV</div><div class="percentage">50</div></a></div>
</body></html>"#;

fn pages() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.html"), OWNER_A).unwrap();
    fs::write(dir.path().join("b.html"), COMPANY_B).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a page").unwrap();
    dir
}

#[test]
fn test_pages_to_export() {
    let input = pages();
    let mut network = Network::new();

    let report = ingest_directory(&mut network, input.path(), &KeywordAffiliationParser).unwrap();
    assert_eq!(report.files_seen, 2);
    assert_eq!(report.files_ingested, 2);
    assert_eq!(report.relationships_added, 3);
    assert!(report.issues.is_empty());

    let outcome = network.apply_indirect_ownership(&IndirectOptions::default());
    assert_eq!(outcome.relationships.len(), 1);
    let indirect = &outcome.relationships[0];
    assert_eq!(indirect.source_id, "owner_a");
    assert_eq!(indirect.target_id, "outlet_c");
    assert_eq!(indirect.description, "Indirectly owns 30.00% of Outlet C");

    let relationships = network.relationships();
    assert_eq!(relationships.count_of(RelationType::Owns), 2);
    assert_eq!(relationships.count_of(RelationType::Spouse), 1);
    assert_eq!(relationships.count_of(RelationType::IndirectOwns), 1);

    let output_dir = TempDir::new().unwrap();
    let output = OutputConfig {
        out_dir: output_dir.path().to_path_buf(),
        ..OutputConfig::default()
    };
    let assembled = network.assemble();
    let summary = export::write_all(&assembled, &output).unwrap();
    assert_eq!(summary.relationships, 4);
    assert_eq!(summary.nodes, 4);

    let read = |name: &str| fs::read_to_string(output_dir.path().join(name)).unwrap();

    let rels = read(&output.relationships_file);
    let rel_lines: Vec<_> = rels.lines().collect();
    assert_eq!(rel_lines.len(), 5);
    assert_eq!(rel_lines[1], "owner_a,company_b,owns,60.0,Owns 60.0% of Company B");
    assert_eq!(rel_lines[2], "owner_a,jane_a,spouse,0.0,wife of Owner A");
    assert!(rel_lines[4].starts_with("owner_a,outlet_c,indirect_owns,"));

    // Company B is both an owner (it has its own page) and a held company.
    let owners = read(&output.owners_file);
    assert_eq!(owners.lines().count(), 1 + 3);
    let entities = read(&output.entities_file);
    assert_eq!(entities.lines().count(), 1 + 2);
    assert!(entities.contains("outlet_c,Outlet C,media_outlet,,,tv"));

    let matrix = read(&output.adjacency_file);
    let matrix_lines: Vec<_> = matrix.lines().collect();
    assert_eq!(matrix_lines[0], ",company_b,jane_a,outlet_c,owner_a");
    assert_eq!(matrix_lines.len(), 5);
    assert!(matrix_lines
        .iter()
        .skip(1)
        .all(|row| row.split(',').count() == 5));

    let graphml = read(&output.graphml_file);
    assert_eq!(graphml.matches("<node ").count(), 4);
    assert_eq!(graphml.matches("<edge ").count(), 4);
}

#[test]
fn test_rerun_is_stable() {
    let input = pages();
    let mut network = Network::new();
    ingest_directory(&mut network, input.path(), &KeywordAffiliationParser).unwrap();
    network.apply_indirect_ownership(&IndirectOptions::default());
    let second = network.apply_indirect_ownership(&IndirectOptions::default());
    assert!(second.relationships.is_empty());
    assert_eq!(network.relationships().len(), 4);
}

#[test]
fn test_empty_input_directory() {
    let input = TempDir::new().unwrap();
    let mut network = Network::new();
    let report = ingest_directory(&mut network, input.path(), &KeywordAffiliationParser).unwrap();
    assert_eq!(report.files_seen, 0);
    let outcome = network.apply_indirect_ownership(&IndirectOptions::default());
    assert!(outcome.relationships.is_empty());
    assert!(network.assemble().relationships.is_empty());
}
