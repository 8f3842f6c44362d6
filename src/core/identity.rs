use serde::{Deserialize, Serialize};

/// Namespace and service name of the calling process.
///
/// Routing is always evaluated from the caller's perspective, so this is the
/// identity placed in the source-service descriptor of every router request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalIdentity {
    pub namespace: String,
    pub service: String,
}

impl LocalIdentity {
    pub fn new(namespace: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
        }
    }
}

/// Physical location of the calling process, used by nearby routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub region: String,
    pub zone: String,
}

/// Instance metadata key carrying the instance's region
pub const REGION_METADATA_KEY: &str = "region";
/// Instance metadata key carrying the instance's zone
pub const ZONE_METADATA_KEY: &str = "zone";
