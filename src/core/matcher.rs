//! Volume-matching engine
//!
//! Maps each claim declaration to a source volume using lexical candidate
//! discovery plus optional compose-context hints, then asks the operator
//! to confirm. The engine never selects a volume on its own, even when a
//! single unambiguous candidate exists: volume identity mistakes are
//! irreversible.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::compose::{self, ComposeContext};
use crate::error::MigrateResult;
use crate::traits::Prompt;
use crate::types::{ClaimRequest, SourceVolume};

pub struct VolumeMatcher<P: Prompt> {
    /// Inventory snapshot, sorted by name for stable display
    volumes: Vec<SourceVolume>,

    /// Compose context, when a compose file was discoverable
    context: Option<ComposeContext>,

    prompt: P,
}

impl<P: Prompt> VolumeMatcher<P> {
    pub fn new(mut volumes: Vec<SourceVolume>, prompt: P) -> Self {
        volumes.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            volumes,
            context: None,
            prompt,
        }
    }

    /// Try to load a compose file from the manifest directory. Failure to
    /// find or parse one degrades to name-only matching, never errors.
    pub fn load_compose_context(&mut self, directory: &Path) {
        let Some(compose_file) = compose::find_compose_file(directory) else {
            warn!("no compose file found in {} - using basic matching", directory.display());
            return;
        };

        info!("found compose file: {}", compose_file.display());
        match ComposeContext::load(&compose_file) {
            Ok(context) => {
                info!("found {} volume mappings in compose file", context.mappings.len());
                for mapping in &context.mappings {
                    debug!(
                        "  {}:{} -> {} (expected store volume: {})",
                        mapping.service, mapping.alias, mapping.mount_path, mapping.store_volume
                    );
                }
                self.context = Some(context);
            }
            Err(e) => {
                warn!("failed to parse compose file: {e} - using basic matching");
            }
        }
    }

    /// Drive the interactive matching pass over all claims. Absence of a
    /// match is a valid outcome per claim; only prompt I/O failures error.
    pub fn match_volumes(&self, claims: &mut [ClaimRequest]) -> MigrateResult<()> {
        for claim in claims.iter_mut() {
            info!("matching claim: {}", claim.name);

            let mut candidates = self.candidates_for(claim);
            if candidates.is_empty() {
                info!("no source volumes resemble '{}', offering full inventory", claim.name);
                candidates = self.volumes.iter().collect();
            }

            let suggestion = self.compose_suggestion(claim);
            if let Some(suggested) = suggestion {
                // Bias only: the suggestion is listed first, never auto-picked
                candidates.retain(|v| v.name != suggested.name);
                candidates.insert(0, suggested);
            }

            let matched = self.select_volume(claim, &candidates, suggestion)?;
            claim.matched_volume = matched;
        }

        Ok(())
    }

    /// Lexical candidate discovery: a volume qualifies when its name
    /// contains any meaningful part of the claim name.
    fn candidates_for(&self, claim: &ClaimRequest) -> Vec<&SourceVolume> {
        let parts = claim_name_parts(&claim.name);
        self.volumes
            .iter()
            .filter(|volume| {
                let name = volume.name.to_lowercase();
                parts.iter().any(|part| name.contains(part))
            })
            .collect()
    }

    /// Compose-context resolution: find a mapping whose alias, service, or
    /// service-alias combination matches the claim name, then resolve it
    /// to an inventory volume.
    fn compose_suggestion(&self, claim: &ClaimRequest) -> Option<&SourceVolume> {
        let context = self.context.as_ref()?;

        for mapping in &context.mappings {
            let labels = [
                mapping.alias.clone(),
                format!("{}-{}", mapping.service, mapping.alias),
                mapping.service.clone(),
            ];

            if labels.iter().any(|label| claim_name_matches(&claim.name, label)) {
                if let Some(volume) = context.resolve_volume(mapping, &self.volumes) {
                    return Some(volume);
                }
            }
        }

        None
    }

    fn select_volume(
        &self,
        claim: &ClaimRequest,
        candidates: &[&SourceVolume],
        suggestion: Option<&SourceVolume>,
    ) -> MigrateResult<Option<SourceVolume>> {
        let mut options = vec!["Skip (no volume)".to_string()];
        options.extend(candidates.iter().map(|volume| {
            let suggested = suggestion.map(|s| s.name == volume.name).unwrap_or(false);
            if suggested {
                format!("{} ({}) [compose match]", volume.name, volume.size_human)
            } else {
                format!("{} ({})", volume.name, volume.size_human)
            }
        }));

        let title = format!("Select source volume for claim '{}'", claim.name);
        let choice = self.prompt.ask_choice(&title, &options)?;

        if choice == 0 {
            info!("no volume selected for claim {}", claim.name);
            return Ok(None);
        }

        let selected = candidates[choice - 1].clone();
        info!("selected volume {} for claim {}", selected.name, claim.name);
        Ok(Some(selected))
    }
}

/// Decompose a claim name into lexical parts: drop the first
/// hyphen-delimited segment (assumed namespace-like), split on `-`/`_`,
/// discard parts of length <= 1, and include the cleaned full name.
pub fn claim_name_parts(claim_name: &str) -> Vec<String> {
    let clean = strip_namespace_prefix(claim_name);

    let mut parts: Vec<String> = Vec::new();
    for separator in ['-', '_'] {
        for part in clean.split(separator) {
            if part.len() > 1 {
                parts.push(part.to_lowercase());
            }
        }
    }

    parts.push(clean.to_lowercase());
    parts
}

fn strip_namespace_prefix(claim_name: &str) -> &str {
    match claim_name.split_once('-') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => claim_name,
    }
}

/// Case-insensitive comparison between the claim name and a compose-side
/// label, with and without the namespace prefix and with `-`/`_`
/// normalized in both directions.
fn claim_name_matches(claim_name: &str, label: &str) -> bool {
    let clean = strip_namespace_prefix(claim_name);

    let comparisons = [
        clean.to_string(),
        claim_name.to_string(),
        clean.replace('-', "_"),
        claim_name.replace('-', "_"),
    ];

    let label_dashed = label.replace('_', "-");
    comparisons
        .iter()
        .any(|cmp| cmp.eq_ignore_ascii_case(label) || cmp.eq_ignore_ascii_case(&label_dashed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_drop_exactly_the_first_hyphen_segment() {
        let parts = claim_name_parts("svc-app-data");
        assert!(parts.contains(&"app".to_string()));
        assert!(parts.contains(&"data".to_string()));
        assert!(parts.contains(&"app-data".to_string()));
        assert!(!parts.contains(&"svc".to_string()));
    }

    #[test]
    fn parts_without_hyphen_keep_the_full_name() {
        let parts = claim_name_parts("postgres");
        assert!(parts.iter().all(|p| p == "postgres"));
        assert!(!parts.is_empty());
    }

    #[test]
    fn short_segments_are_discarded() {
        let parts = claim_name_parts("ns-a-db");
        assert!(!parts.contains(&"a".to_string()));
        assert!(parts.contains(&"db".to_string()));
    }

    #[test]
    fn claim_matches_separator_normalized_labels() {
        assert!(claim_name_matches("svc-app-data", "app_data"));
        assert!(claim_name_matches("svc-app-data", "APP-DATA"));
        assert!(!claim_name_matches("svc-app-data", "pgdata"));
    }
}
