//! Claim-declaration scanning and size rewriting
//!
//! The manifest directory holds multi-document YAML files produced by
//! kompose or written by hand. We scan every document for
//! `PersistentVolumeClaim` declarations, and later rewrite the requested
//! storage size in place. The rewrite is a line-level edit within the
//! claim's own document so every other byte in the file survives
//! untouched.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{MigrateError, MigrateResult};
use crate::types::ClaimRequest;

const DOC_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Deserialize)]
struct ManifestDoc {
    kind: Option<String>,
    metadata: Option<Metadata>,
    spec: Option<ClaimSpec>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: Option<String>,
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaimSpec {
    resources: Option<ClaimResources>,
}

#[derive(Debug, Deserialize)]
struct ClaimResources {
    requests: Option<ClaimRequests>,
}

#[derive(Debug, Deserialize)]
struct ClaimRequests {
    storage: Option<serde_yaml::Value>,
}

fn storage_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?m)^(\s*storage:\s*)["']?([^"'\s]+)["']?[ \t]*$"#).expect("static regex"))
}

fn yaml_files(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect()
}

fn parse_claim_doc(doc: &str) -> Option<ClaimRequest> {
    let parsed: ManifestDoc = serde_yaml::from_str(doc).ok()?;
    if parsed.kind.as_deref() != Some("PersistentVolumeClaim") {
        return None;
    }

    let metadata = parsed.metadata?;
    let name = metadata.name?;
    let namespace = metadata.namespace.unwrap_or_else(|| "default".to_string());

    let storage = parsed.spec?.resources?.requests?.storage?;
    let requested = match storage {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        _ => return None,
    };

    Some(ClaimRequest::new(name, namespace, requested))
}

/// Scan a directory tree for PersistentVolumeClaim declarations.
pub fn scan_claims(directory: &Path) -> MigrateResult<Vec<ClaimRequest>> {
    let mut claims = Vec::new();

    for path in yaml_files(directory) {
        let content = std::fs::read_to_string(&path)?;
        for doc in content.split(DOC_SEPARATOR) {
            if let Some(claim) = parse_claim_doc(doc) {
                debug!("found claim {}/{} in {}", claim.namespace, claim.name, path.display());
                claims.push(claim);
            }
        }
    }

    Ok(claims)
}

/// Locate the manifest file declaring a specific claim.
pub fn find_claim_file(directory: &Path, claim: &ClaimRequest) -> MigrateResult<PathBuf> {
    for path in yaml_files(directory) {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let declares_claim = content.split(DOC_SEPARATOR).any(|doc| {
            parse_claim_doc(doc)
                .map(|parsed| parsed.name == claim.name && parsed.namespace == claim.namespace)
                .unwrap_or(false)
        });
        if declares_claim {
            return Ok(path);
        }
    }

    Err(MigrateError::ManifestMissing {
        claim: claim.name.clone(),
    })
}

/// Rewrite the requested storage size of every matched claim in place.
///
/// Documents are split on the `---` separator; only the claim's own
/// document is edited, and only its `storage:` line. Files are written
/// back only when something actually changed.
pub fn update_claim_sizes(directory: &Path, claims: &[ClaimRequest]) -> MigrateResult<()> {
    for path in yaml_files(directory) {
        let content = std::fs::read_to_string(&path)?;
        let updated = rewrite_content(&content, claims);

        if updated != content {
            std::fs::write(&path, &updated)?;
            info!("updated claim sizes in {}", path.display());
        }
    }

    Ok(())
}

fn rewrite_content(content: &str, claims: &[ClaimRequest]) -> String {
    let docs: Vec<String> = content
        .split(DOC_SEPARATOR)
        .map(|doc| rewrite_document(doc, claims))
        .collect();

    docs.join(DOC_SEPARATOR)
}

fn rewrite_document(doc: &str, claims: &[ClaimRequest]) -> String {
    let Some(parsed) = parse_claim_doc(doc) else {
        return doc.to_string();
    };

    let Some(claim) = claims
        .iter()
        .find(|c| c.name == parsed.name && c.namespace == parsed.namespace && !c.new_size.is_empty())
    else {
        return doc.to_string();
    };

    storage_line_re()
        .replace(doc, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], claim.new_size)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PVC_DOC: &str = "apiVersion: v1\nkind: PersistentVolumeClaim\nmetadata:\n  name: svc-app-data\n  namespace: default\nspec:\n  accessModes:\n    - ReadWriteOnce\n  resources:\n    requests:\n      storage: 100Mi\n";

    #[test]
    fn parses_claim_with_defaulted_namespace() {
        let doc = PVC_DOC.replace("  namespace: default\n", "");
        let claim = parse_claim_doc(&doc).unwrap();
        assert_eq!(claim.name, "svc-app-data");
        assert_eq!(claim.namespace, "default");
        assert_eq!(claim.requested_size, "100Mi");
    }

    #[test]
    fn numeric_storage_value_is_stringified() {
        let doc = PVC_DOC.replace("storage: 100Mi", "storage: 128974848");
        let claim = parse_claim_doc(&doc).unwrap();
        assert_eq!(claim.requested_size, "128974848");
    }

    #[test]
    fn non_claim_documents_are_not_claims() {
        assert!(parse_claim_doc("kind: Deployment\nmetadata:\n  name: web\n").is_none());
        assert!(parse_claim_doc("not: [valid").is_none());
    }

    #[test]
    fn rewrite_touches_only_the_matched_document() {
        let deployment = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  annotations:\n    keep: \"  odd   spacing \"\n";
        let content = format!("{deployment}{DOC_SEPARATOR}{PVC_DOC}");

        let mut claim = ClaimRequest::new("svc-app-data", "default", "100Mi");
        claim.new_size = "1Gi".to_string();

        let updated = rewrite_content(&content, &[claim]);
        assert!(updated.starts_with(deployment));
        assert!(updated.contains("storage: 1Gi"));
        assert!(!updated.contains("storage: 100Mi"));
    }

    #[test]
    fn rewrite_is_a_noop_for_unmatched_claims() {
        let claim = ClaimRequest::new("other-claim", "default", "100Mi");
        assert_eq!(rewrite_content(PVC_DOC, &[claim]), PVC_DOC);
    }
}
