// Property tests for label decoding and snapshot adaptation
use mesh_router::{
    Labels, ServiceInstanceRecord, ServiceInstanceSnapshot,
    core::{DEFAULT_WEIGHT, decode_labels, encode_labels},
};
use proptest::prelude::*;

fn label_map() -> impl Strategy<Value = Labels> {
    prop::collection::hash_map("[a-zA-Z0-9_.-]{1,12}", "\\PC{0,16}", 0..6)
}

fn record() -> impl Strategy<Value = ServiceInstanceRecord> {
    ("[a-z]{1,8}", "[a-z0-9-]{1,8}", 1u16..u16::MAX, 0u32..1000).prop_map(
        |(service, id, port, weight)| {
            let mut record = ServiceInstanceRecord::new(service, id, "10.0.0.1", port);
            record.weight = weight;
            record
        },
    )
}

proptest! {
    #[test]
    fn decode_is_stable_under_reencoding(maps in prop::collection::vec(label_map(), 0..4)) {
        let values: Vec<String> = maps.iter().map(|m| encode_labels(m).unwrap()).collect();
        let decoded = decode_labels(&values).unwrap();

        let reencoded = encode_labels(&decoded).unwrap();
        prop_assert_eq!(decode_labels([reencoded]).unwrap(), decoded.clone());

        let mut expected = Labels::new();
        for map in &maps {
            expected.extend(map.clone());
        }
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn encoded_plus_survives_decoding(value in "[a-z+ ]{0,12}\\+[a-z+ ]{0,12}") {
        let labels = Labels::from([("expr".to_string(), value.clone())]);
        let encoded = encode_labels(&labels).unwrap();
        prop_assert!(encoded.contains("%2B"));
        let decoded = decode_labels([encoded]).unwrap();
        prop_assert_eq!(decoded.get("expr"), Some(&value));
    }

    #[test]
    fn adapt_preserves_order_and_identity(records in prop::collection::vec(record(), 0..20)) {
        let snapshot = ServiceInstanceSnapshot::adapt(records.clone(), "default");

        prop_assert_eq!(snapshot.len(), records.len());
        prop_assert_eq!(
            snapshot.service_key().service.clone(),
            records.first().map(|r| r.service.clone())
        );
        for (adapted, source) in snapshot.instances().iter().zip(&records) {
            prop_assert_eq!(&adapted.service, &source.service);
            prop_assert_eq!(&adapted.instance_id, &source.instance_id);
            prop_assert_eq!(&adapted.host, &source.host);
            prop_assert_eq!(adapted.port, source.port);
            prop_assert_eq!(adapted.weight, DEFAULT_WEIGHT);
        }
    }
}
