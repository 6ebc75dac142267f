//! Operator review: interactive claim sizing and the run summary

use tracing::warn;

use crate::core::units;
use crate::error::MigrateResult;
use crate::traits::Prompt;
use crate::types::ClaimRequest;

/// Walk the operator through sizing each claim. Empty input keeps the
/// declared size; input that fails the quantity grammar warns and keeps
/// the declared size as well.
pub fn interactive_set_sizes<P: Prompt>(claims: &mut [ClaimRequest], prompt: &P) -> MigrateResult<()> {
    println!("\n=== Claim Size Configuration ===");
    println!("For each claim, review the matched source volume and set the desired size.");
    println!("Use formats like: 1Gi, 500Mi, 2Ti, etc.\n");

    for claim in claims.iter_mut() {
        println!("Claim: {} (namespace: {})", claim.name, claim.namespace);
        println!("  Declared size: {}", claim.requested_size);

        match &claim.matched_volume {
            Some(volume) => {
                println!("  Matched source volume: {}", volume.name);
                println!("  Current volume size: {}", volume.size_human);
                println!("  Volume path: {}", volume.mountpoint.display());
            }
            None => println!("  No matching source volume!"),
        }

        let input = prompt.ask_text("  Enter desired claim size (or press Enter to keep declared): ")?;

        claim.new_size = if input.is_empty() {
            claim.requested_size.clone()
        } else if units::is_valid_quantity(&input) {
            input
        } else {
            warn!("invalid size format '{input}', keeping declared: {}", claim.requested_size);
            claim.requested_size.clone()
        };

        println!("  Claim size set to: {}\n", claim.new_size);
    }

    Ok(())
}

/// Print the pre-migration summary of all claims and their matches.
pub fn print_summary(claims: &[ClaimRequest]) {
    println!("\n=== Migration Summary ===");
    println!("Found {} claims to migrate:\n", claims.len());

    for claim in claims {
        println!("Claim: {}/{}", claim.namespace, claim.name);
        println!("  Size: {} -> {}", claim.requested_size, claim.new_size);

        match &claim.matched_volume {
            Some(volume) => println!("  Source: {} ({})", volume.name, volume.size_human),
            None => println!("  Source: no matching volume found"),
        }
        println!();
    }
}
