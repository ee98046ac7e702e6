//! Terminal rendering for search results and artifact summaries

use colored::Colorize;
use janitor_core::{EnrichedResult, IdentityMap, Lookup, VectorIndexStats};

/// One human-readable line per ranked result
pub fn result_line(result: &EnrichedResult) -> String {
    let distance = format!("[Distance: {:.2}]", result.distance).dimmed();
    match &result.lookup {
        Lookup::Found { record } => format!(
            "{}. {}  (Tags: {}, Score: {}) {}",
            result.rank,
            record.title.white().bold(),
            record.tags,
            record.score,
            distance
        ),
        Lookup::MissingRecord { key } => format!(
            "{}. {} {}",
            result.rank,
            format!("Question with Id={} not found in dataset", key).red(),
            distance
        ),
        Lookup::UnmappedOrdinal => format!(
            "{}. {} {}",
            result.rank,
            format!("Ordinal {} has no identity map entry", result.ordinal).red(),
            distance
        ),
    }
}

/// Print the ranked results for a query
pub fn print_results(query: &str, results: &[EnrichedResult]) {
    println!();
    println!("{}: {}", "Query".cyan().bold(), query);
    println!();

    if results.is_empty() {
        println!("{}", "No results.".dimmed());
        return;
    }

    println!("{}", "Top Results:".white().bold());
    for result in results {
        println!("{}", result_line(result));
    }
}

/// Print provenance and index statistics for an artifact pair
pub fn print_inspection(map: &IdentityMap, stats: &VectorIndexStats) {
    println!("{}", "=== Janitor Artifacts ===".cyan().bold());
    println!();

    match map.provenance() {
        Some(provenance) => {
            println!("{}: {}", "Model".white().bold(), provenance.model);
            println!("{}: {}", "Dimensions".white().bold(), provenance.dimensions);
            println!(
                "{}: {}",
                "Built At".white().bold(),
                provenance.built_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => println!("{}", "No provenance recorded.".yellow()),
    }

    println!("{}: {}", "Identity Map Keys".white().bold(), map.len());
    println!("{}: {}", "Indexed Vectors".white().bold(), stats.total_vectors);
    println!("{}: {}", "Connectivity".white().bold(), stats.connectivity);
    println!(
        "{}: {:.1} KiB",
        "Index Size".white().bold(),
        stats.memory_bytes as f64 / 1024.0
    );

    println!();
    if map.len() == stats.total_vectors {
        println!("{}", "Index and identity map agree.".green());
    } else {
        println!(
            "  {} {}",
            "!".yellow().bold(),
            "Index and identity map sizes differ; rebuild both artifacts.".yellow()
        );
    }
}
