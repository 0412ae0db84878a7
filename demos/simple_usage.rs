/// Protree API Demo
///
/// Demonstrates the main operations:
/// - Importing a FASTA database into a file-backed protein tree
/// - Exact and ambiguity-aware peptide mapping
/// - Decoy mapping through reversed targets
/// - Walking every indexed peptide
/// - Statistics

use Protree::alphabet::{CleavageRule, MatchingPolicy, StandardAminoAcids};
use Protree::compression::CompressionType;
use Protree::core::config::Config;
use Protree::core::tree::ProteinTree;
use Protree::parallel::ProgressTracker;
use Protree::sequence::InMemorySequenceProvider;
use Protree::storage::FileStore;
use std::sync::Arc;

const FASTA: &str = "\
>sp|P69905|HBA_HUMAN Hemoglobin subunit alpha
MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSFPTTKTYFPHFDLSHGSAQVKGHGKKVADALTNAVAHV
DDMPNALSALSDLHAHKLRVDPVNFKLLSHCLLVTLAAHLPAEFTPAVHASLDKFLASVSTVLTSKYR
>sp|P68871|HBB_HUMAN Hemoglobin subunit beta
MVHLTPEEKSAVTALWGKVNVDEVGGEALGRLLVVYPWTQRFFESFGDLSTPDAVMGNPKVKAHGKKVLGAFSDGLAHL
DNLKGTFATLSELHCDKLHVDPENFRLLGNVLVCVLAHHFGKEFTPPVQAAYQKVVAGVANALAHKYH
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║        Protree - Protein Tree API Demo        ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    // Step 1: Load proteins and generate reversed decoys
    let mut provider = InMemorySequenceProvider::from_fasta(FASTA)?;
    provider.generate_decoys();
    println!("Loaded {} proteins ({} targets)\n", provider.len(), provider.target_count());

    // Step 2: Open the tree, importing on first use
    let dir = std::env::temp_dir().join("protree-demo");
    let mut config = Config::new(&dir);
    config.report_expected_import_time = true;
    config.compression = CompressionType::Zstd;
    let store = Arc::new(FileStore::from_config(&config)?);
    let progress = ProgressTracker::new();
    let trypsin = CleavageRule::trypsin();

    println!("Opening protein tree at {}...", dir.display());
    let tree = ProteinTree::open(
        config,
        store,
        Arc::new(provider),
        Arc::new(StandardAminoAcids::new()),
        Some(&trypsin),
        &progress,
    )?;
    if !progress.is_indeterminate() {
        println!("  Progress: {}/{}", progress.progress(), progress.max_progress());
    }
    for report in progress.reports() {
        println!("  {}", report);
    }
    println!("Done! {} tags indexed\n", tree.tags().len());

    // Step 3: Exact mapping
    for peptide in ["VGAHAGEYGAEALER", "VNVDEVGGEALGR", "LLVVYPWTQR"] {
        let mapping = tree.exact_protein_mapping(peptide)?;
        println!("{:<16} -> {:?}", peptide, mapping);
    }

    // Step 4: Ambiguity codes (B = D/N, J = I/L)
    let mapping = tree.protein_mapping("VBVDEVGGEAJGR", MatchingPolicy::Combinations)?;
    println!("\nCombinations for VBVDEVGGEAJGR:");
    for (sequence, proteins) in mapping.iter() {
        println!("  {} -> {:?}", sequence, proteins);
    }

    // Step 5: Decoys are answered from the targets
    let mapping = tree.protein_mapping("RQTWPYVVLL", MatchingPolicy::String)?;
    println!("\nDecoy hits for RQTWPYVVLL: {:?}", mapping);

    // Step 6: Walk the first indexed peptides
    println!("\nFirst indexed peptides:");
    for item in tree.peptide_iterator().take(5) {
        let (peptide, proteins) = item?;
        println!("  {} -> {:?}", peptide, proteins);
    }

    // Step 7: Statistics
    let stats = tree.stats();
    println!("\nStatistics:");
    println!("  Queries: {}", stats.query_count);
    println!("  Query cache hit rate: {:.1}%", stats.query_hit_rate() * 100.0);
    println!(
        "  Node cache: {} nodes, {}/{} occurrences",
        stats.node_cache.nodes, stats.node_cache.occupancy, stats.node_cache.capacity
    );

    tree.close()?;
    println!("\nDemo complete!");
    Ok(())
}
