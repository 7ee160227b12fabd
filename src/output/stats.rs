//! Console summaries of a run and of the report

use crate::output::Report;
use crate::state::CrawlStats;

/// Items from the top list shown on the console
const CONSOLE_TOP: usize = 5;

/// Prints the tallies of one crawl run
pub fn print_crawl_stats(stats: &CrawlStats) {
    println!("=== Crawl Run ===\n");

    println!("Pages:");
    println!("  Scanned: {}", stats.pages_scanned);
    println!("  Unavailable: {}", stats.pages_unavailable);
    println!();

    println!("Topics:");
    println!("  Seen: {}", stats.topics_seen);
    println!("  Processed: {}", stats.processed);
    println!("  Promising: {}", stats.promising);
    println!("  Already known: {}", stats.skipped);
    println!("  Unavailable: {}", stats.unavailable);
    println!("  Store failures: {}", stats.store_failures);
    if stats.cancelled > 0 {
        println!("  Cancelled: {}", stats.cancelled);
    }
    println!();
}

/// Prints the report totals and the promising items at the top of the list
pub fn print_report(report: &Report) {
    println!("=== Analysis Report ===\n");

    println!("  Items analyzed: {}", report.total_items);
    println!("  Promising items: {}", report.promising_count);
    println!("  Average score: {:.1}/100", report.average_score);

    let promising: Vec<_> = report
        .top_items
        .iter()
        .take(CONSOLE_TOP)
        .filter(|item| item.is_promising)
        .collect();

    if promising.is_empty() {
        return;
    }

    println!("\nTop items:");
    for (rank, item) in promising.iter().enumerate() {
        println!("{}. {}", rank + 1, item.title);
        println!("   Author: {}", item.author);
        println!("   Score: {}/100", item.final_score);
        println!("   Algorithm: {}", display_or(&item.mining_algorithm, "unknown"));
        match &item.links.github {
            Some(github) => println!("   GitHub: {}", github),
            None => println!("   GitHub: not provided"),
        }
    }
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
