//! Compose-context discovery and volume-name resolution
//!
//! A docker-compose manifest next to the claim declarations tells us which
//! named volumes the project declared and where they were mounted. That
//! context only biases candidate ordering during matching; it never picks
//! a volume on its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::MigrateResult;
use crate::types::{SourceVolume, VolumeMapping};

const COMPOSE_CANDIDATES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Deserialize)]
struct ComposeService {
    #[serde(default)]
    volumes: Vec<String>,
}

/// Parsed compose context: the project name derived from the directory and
/// the named-volume mounts declared by its services.
#[derive(Debug, Clone, Default)]
pub struct ComposeContext {
    pub project: String,
    pub mappings: Vec<VolumeMapping>,
}

/// Locate a compose file in `directory`, trying the conventional names.
pub fn find_compose_file(directory: &Path) -> Option<PathBuf> {
    COMPOSE_CANDIDATES
        .iter()
        .map(|candidate| directory.join(candidate))
        .find(|path| path.is_file())
}

impl ComposeContext {
    /// Parse a compose file. The project name is the lowercased basename
    /// of the directory holding the file, which is what compose itself
    /// uses when composing volume names.
    pub fn load(compose_file: &Path) -> MigrateResult<Self> {
        let project = compose_file
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let content = std::fs::read_to_string(compose_file)?;
        let compose: ComposeFile = serde_yaml::from_str(&content)?;

        let mut mappings = Vec::new();
        for (service, spec) in &compose.services {
            for volume_spec in &spec.volumes {
                if let Some(mapping) = parse_volume_spec(&project, service, volume_spec) {
                    mappings.push(mapping);
                }
            }
        }

        Ok(Self { project, mappings })
    }

    /// Store volume names the compose project may have created for an
    /// alias: the standard `{project}_{alias}`, the bare alias, and the
    /// hyphenated / uppercase-project variations seen in the wild.
    pub fn volume_variants(&self, alias: &str) -> Vec<String> {
        vec![
            format!("{}_{}", self.project, alias),
            alias.to_string(),
            format!("{}-{}", self.project, alias),
            format!("{}_{}", self.project.to_uppercase(), alias),
            format!("{}-{}", self.project.to_uppercase(), alias),
        ]
    }

    /// Resolve a mapping to an inventory volume: exact variant name first,
    /// then fuzzy substring scoring with a deterministic tie-break.
    pub fn resolve_volume<'a>(&self, mapping: &VolumeMapping, volumes: &'a [SourceVolume]) -> Option<&'a SourceVolume> {
        if let Some(volume) = volumes.iter().find(|v| v.name == mapping.store_volume) {
            return Some(volume);
        }

        for variant in self.volume_variants(&mapping.alias) {
            if let Some(volume) = volumes.iter().find(|v| v.name == variant) {
                return Some(volume);
            }
        }

        best_fuzzy_match(&mapping.alias, volumes)
    }
}

/// Substring-affinity score between a compose alias and a store volume
/// name: +3 contains, +2 suffix, +4 separator-prefixed contains.
pub fn match_score(alias: &str, volume_name: &str) -> i32 {
    let alias = alias.to_lowercase();
    let name = volume_name.to_lowercase();
    let mut score = 0;

    if name.contains(&alias) {
        score += 3;
    }
    if name.ends_with(&alias) {
        score += 2;
    }
    if name.contains(&format!("_{alias}")) || name.contains(&format!("-{alias}")) {
        score += 4;
    }

    score
}

/// Best-scoring volume for an alias, or none when nothing scores positive.
/// Candidates are ordered by (score desc, name asc) so ties resolve the
/// same way on every run.
pub fn best_fuzzy_match<'a>(alias: &str, volumes: &'a [SourceVolume]) -> Option<&'a SourceVolume> {
    let mut scored: Vec<(i32, &SourceVolume)> = volumes
        .iter()
        .map(|v| (match_score(alias, &v.name), v))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|(sa, va), (sb, vb)| sb.cmp(sa).then_with(|| va.name.cmp(&vb.name)));
    scored.first().map(|(_, v)| *v)
}

/// Parse a single service volume entry (`alias:/target[:opts]`).
/// Bind mounts (absolute or relative host paths) are not named volumes
/// and yield no mapping.
fn parse_volume_spec(project: &str, service: &str, volume_spec: &str) -> Option<VolumeMapping> {
    let mut parts = volume_spec.splitn(3, ':');
    let source = parts.next()?;
    let target = parts.next()?;

    if source.starts_with('/') || source.starts_with("./") || source.starts_with("../") {
        return None;
    }

    Some(VolumeMapping {
        service: service.to_string(),
        alias: source.to_string(),
        store_volume: format!("{project}_{source}"),
        mount_path: target.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(name: &str) -> SourceVolume {
        SourceVolume {
            name: name.to_string(),
            mountpoint: PathBuf::from(format!("/var/lib/docker/volumes/{name}/_data")),
            size_bytes: 0,
            size_human: "0 B".to_string(),
        }
    }

    #[test]
    fn bind_mounts_yield_no_mapping() {
        assert!(parse_volume_spec("proj", "db", "/host/path:/data").is_none());
        assert!(parse_volume_spec("proj", "db", "./rel:/data").is_none());
        assert!(parse_volume_spec("proj", "db", "garbage").is_none());
    }

    #[test]
    fn named_volume_spec_composes_project_prefix() {
        let mapping = parse_volume_spec("proj", "db", "pgdata:/var/lib/postgresql/data:ro").unwrap();
        assert_eq!(mapping.store_volume, "proj_pgdata");
        assert_eq!(mapping.mount_path, "/var/lib/postgresql/data");
    }

    #[test]
    fn separator_prefixed_contains_scores_highest() {
        // "myapp_pgdata" hits contains (+3), suffix (+2) and separator (+4)
        assert_eq!(match_score("pgdata", "myapp_pgdata"), 9);
        assert_eq!(match_score("pgdata", "pgdata-old"), 3);
        assert_eq!(match_score("pgdata", "unrelated"), 0);
    }

    #[test]
    fn fuzzy_tie_break_is_name_ordered() {
        let volumes = vec![volume("z_data"), volume("a_data")];
        let best = best_fuzzy_match("data", &volumes).unwrap();
        assert_eq!(best.name, "a_data");
    }
}
