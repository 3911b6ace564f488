use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::error::StackError;

const HASH_LEN: usize = 8;
const MAX_HUMAN_LEN: usize = 240;

/// Derives a template logical id from a construct path.
///
/// Single-component paths keep their bare alphanumeric name. Longer paths
/// concatenate the alphanumeric characters of each component (skipping the
/// `Resource`/`Default` leaves and immediate repeats) and append a hash of
/// the full path, so renaming any component yields a new id.
pub fn logical_id(path: &[&str]) -> String {
    if let [single] = path {
        return alphanumeric(single);
    }

    let mut human = String::new();
    let mut previous: Option<&str> = None;
    for &component in path {
        if matches!(component, "Resource" | "Default") || previous == Some(component) {
            continue;
        }
        human.push_str(&alphanumeric(component));
        previous = Some(component);
    }
    human.truncate(MAX_HUMAN_LEN);

    format!("{human}{}", path_hash(path))
}

fn alphanumeric(component: &str) -> String {
    component
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn path_hash(path: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.join("/"));
    let digest = format!("{:X}", hasher.finalize());
    digest[..HASH_LEN].to_string()
}

/// Tracks the ids handed out within one template.
#[derive(Debug, Default)]
pub struct LogicalIds {
    allocated: BTreeSet<String>,
}

impl LogicalIds {
    pub fn allocate(&mut self, path: &[&str]) -> Result<String, StackError> {
        let id = logical_id(path);
        if !self.allocated.insert(id.clone()) {
            return Err(StackError::DuplicateLogicalId(id));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_component_keeps_bare_name() {
        assert_eq!(logical_id(&["Bootstrap-Version"]), "BootstrapVersion");
    }

    #[test]
    fn nested_path_strips_punctuation_and_resource_leaf() {
        let id = logical_id(&["insert-function", "ServiceRole", "Resource"]);

        assert!(id.starts_with("insertfunctionServiceRole"));
        assert_eq!(id.len(), "insertfunctionServiceRole".len() + HASH_LEN);
        assert!(id[id.len() - HASH_LEN..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_depends_on_full_path() {
        let with_leaf = logical_id(&["table", "Resource"]);
        let other_leaf = logical_id(&["table", "Default"]);

        assert_ne!(with_leaf, other_leaf);
        assert_eq!(with_leaf, logical_id(&["table", "Resource"]));
    }

    #[test]
    fn allocator_rejects_repeated_paths() {
        let mut ids = LogicalIds::default();
        ids.allocate(&["table", "Resource"]).expect("first allocation");

        let error = ids
            .allocate(&["table", "Resource"])
            .expect_err("second allocation should fail");
        assert!(matches!(error, StackError::DuplicateLogicalId(_)));
    }
}
