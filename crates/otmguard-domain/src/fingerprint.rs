use otmguard_types::Severity;
use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a finding.
///
/// Identity fields are the merge dedup key, deliberately *not* the rule
/// id: local and external analyzers assign different rule ids to
/// conceptually the same finding.
/// - entity id
/// - title
/// - severity
///
/// Fields are length-prefixed before hashing so adjacent fields cannot
/// blur into each other.
pub fn finding_fingerprint(entity_id: &str, title: &str, severity: Severity) -> String {
    let mut hasher = Sha256::new();
    for part in [entity_id, title, severity.as_str()] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(digest)
}
