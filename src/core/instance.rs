//! Service instance records and the immutable snapshot handed to routers.
use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// Weight assigned to every instance entering a snapshot
pub const DEFAULT_WEIGHT: u32 = 100;

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

fn default_protocol() -> String {
    "http".to_string()
}

/// One network-addressable endpoint of a service, as produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceRecord {
    #[serde(default)]
    pub namespace: String,
    pub service: String,
    pub instance_id: String,
    pub host: String,
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ServiceInstanceRecord {
    /// Create a record with default protocol, weight and no metadata
    pub fn new(
        service: impl Into<String>,
        instance_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            namespace: String::new(),
            service: service.into(),
            instance_id: instance_id.into(),
            host: host.into(),
            port,
            protocol: default_protocol(),
            weight: DEFAULT_WEIGHT,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// `host:port` address of the instance
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logical identity of the service a snapshot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceKey {
    pub namespace: String,
    /// `None` only when the snapshot was built from an empty instance list
    pub service: Option<String>,
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.service {
            Some(service) => write!(f, "{}/{}", self.namespace, service),
            None => write!(f, "{}/<none>", self.namespace),
        }
    }
}

/// Immutable, ordered view of a service's instances at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceSnapshot {
    service_key: ServiceKey,
    instances: Vec<ServiceInstanceRecord>,
}

impl ServiceInstanceSnapshot {
    /// Build a snapshot from already adapted instances
    pub fn new(service_key: ServiceKey, instances: Vec<ServiceInstanceRecord>) -> Self {
        Self {
            service_key,
            instances,
        }
    }

    /// Adapt a discovery result into a snapshot.
    ///
    /// The source is drained completely. Order and duplicates are kept, every
    /// entry gets [`DEFAULT_WEIGHT`] and is placed in `namespace`, and the
    /// service key comes from the first record.
    pub fn adapt<I>(records: I, namespace: &str) -> Self
    where
        I: IntoIterator<Item = ServiceInstanceRecord>,
    {
        let instances: Vec<ServiceInstanceRecord> = records
            .into_iter()
            .map(|mut record| {
                record.weight = DEFAULT_WEIGHT;
                record.namespace = namespace.to_string();
                record
            })
            .collect();

        let service = instances.first().map(|first| first.service.clone());

        Self {
            service_key: ServiceKey {
                namespace: namespace.to_string(),
                service,
            },
            instances,
        }
    }

    pub fn service_key(&self) -> &ServiceKey {
        &self.service_key
    }

    pub fn instances(&self) -> &[ServiceInstanceRecord] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Copy of this snapshot keeping only instances accepted by `keep`
    pub fn retain<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&ServiceInstanceRecord) -> bool,
    {
        Self {
            service_key: self.service_key.clone(),
            instances: self
                .instances
                .iter()
                .filter(|instance| keep(instance))
                .cloned()
                .collect(),
        }
    }

    /// Hand the instances back in caller record form, order and weight intact
    pub fn into_records(self) -> Vec<ServiceInstanceRecord> {
        self.instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(service: &str, id: &str, port: u16) -> ServiceInstanceRecord {
        ServiceInstanceRecord::new(service, id, "10.0.0.1", port)
    }

    #[test]
    fn test_adapt_empty() {
        let snapshot = ServiceInstanceSnapshot::adapt(Vec::new(), "default");
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.service_key().service, None);
        assert_eq!(snapshot.service_key().namespace, "default");
    }

    #[test]
    fn test_adapt_three_records_keeps_order_and_sets_weight() {
        let mut weighted = record("orders", "c", 8082);
        weighted.weight = 7;
        let records = vec![record("orders", "a", 8080), record("orders", "b", 8081), weighted];

        let snapshot = ServiceInstanceSnapshot::adapt(records, "default");

        assert_eq!(snapshot.service_key().service.as_deref(), Some("orders"));
        assert_eq!(snapshot.len(), 3);
        let ids: Vec<&str> = snapshot
            .instances()
            .iter()
            .map(|i| i.instance_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(snapshot.instances().iter().all(|i| i.weight == DEFAULT_WEIGHT));
    }

    #[test]
    fn test_adapt_keeps_duplicates() {
        let records = vec![record("orders", "a", 8080), record("orders", "a", 8080)];
        let snapshot = ServiceInstanceSnapshot::adapt(records, "default");
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_adapt_drains_lazy_source() {
        let lazy = (0..4u16).map(|i| record("orders", &format!("i{i}"), 9000 + i));
        let snapshot = ServiceInstanceSnapshot::adapt(lazy, "prod");
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.instances().iter().all(|i| i.namespace == "prod"));
    }

    #[test]
    fn test_adapt_places_all_records_in_caller_namespace() {
        let records = vec![
            record("orders", "a", 8080).with_namespace("ns-a"),
            record("orders", "b", 8081).with_namespace("ns-b"),
            record("orders", "c", 8082),
        ];
        let snapshot = ServiceInstanceSnapshot::adapt(records, "caller-ns");
        assert_eq!(snapshot.service_key().namespace, "caller-ns");
        assert!(
            snapshot
                .instances()
                .iter()
                .all(|i| i.namespace == "caller-ns")
        );
    }

    #[test]
    fn test_adapt_preserves_identity() {
        let source = record("orders", "a", 8080)
            .with_namespace("prod")
            .with_metadata("zone", "z1");
        let snapshot = ServiceInstanceSnapshot::adapt(vec![source.clone()], "prod");
        let adapted = &snapshot.instances()[0];
        assert_eq!(adapted.namespace, "prod");
        assert_eq!(adapted.host, source.host);
        assert_eq!(adapted.port, source.port);
        assert_eq!(adapted.metadata, source.metadata);
        assert_eq!(adapted.address(), "10.0.0.1:8080");
    }

    #[test]
    fn test_retain_and_into_records() {
        let records = vec![record("orders", "a", 8080), record("orders", "b", 8081)];
        let snapshot = ServiceInstanceSnapshot::adapt(records, "default");
        let filtered = snapshot.retain(|i| i.port == 8081);
        assert_eq!(filtered.service_key(), snapshot.service_key());
        let out = filtered.into_records();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].instance_id, "b");
    }

    #[test]
    fn test_record_deserialize_defaults() {
        let record: ServiceInstanceRecord = serde_json::from_str(
            r#"{"service":"orders","instance_id":"a","host":"h","port":80}"#,
        )
        .unwrap();
        assert_eq!(record.weight, DEFAULT_WEIGHT);
        assert_eq!(record.protocol, "http");
        assert!(record.metadata.is_empty());
        assert_eq!(ServiceKey { namespace: "ns".into(), service: None }.to_string(), "ns/<none>");
    }
}
