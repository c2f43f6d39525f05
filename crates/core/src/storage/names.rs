//! Store naming and version tags.

use sha2::{Digest, Sha256};

/// Names of the current precache and runtime stores for one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    namespace: String,
    precache: String,
    runtime: String,
}

impl StoreNames {
    pub fn new(namespace: &str, version: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            precache: format!("{namespace}-precache-{version}"),
            runtime: format!("{namespace}-runtime-{version}"),
        }
    }

    pub fn precache(&self) -> &str {
        &self.precache
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn is_current(&self, name: &str) -> bool {
        name == self.precache || name == self.runtime
    }

    /// A store of this namespace left behind by another version.
    pub fn is_stale(&self, name: &str) -> bool {
        name.strip_prefix(self.namespace.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
            && !self.is_current(name)
    }
}

/// Derive a version tag from the skeleton asset list.
///
/// Any change to the list yields a different tag, so stores built from an
/// older skeleton are never mistaken for current ones.
pub fn version_tag(skeleton: &[String]) -> String {
    let mut hasher = Sha256::new();
    for url in skeleton {
        hasher.update(url.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    format!("v{}", &digest[..12])
}
