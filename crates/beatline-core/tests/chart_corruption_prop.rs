use beatline_core::{
    fixtures::demo_chart,
    persistence::{decode_items, encode_items, load_chart, save_chart},
};
use proptest::prelude::*;

fn no_panic_load(path: &std::path::Path) -> bool {
    std::panic::catch_unwind(|| {
        let _ = load_chart(path);
    })
    .is_ok()
}

#[test]
fn saved_chart_round_trips() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("demo.beatline.json");
    let chart = demo_chart();
    save_chart(&path, &chart).expect("saving fixture chart should work");

    let loaded = load_chart(&path).expect("loading saved chart should work");
    assert_eq!(loaded, chart);

    let encoded = encode_items(&chart.timeline).expect("items should encode");
    let decoded = decode_items(&encoded).expect("items should decode");
    assert_eq!(decoded, chart.timeline);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn random_chart_bytes_do_not_panic(raw in prop::collection::vec(any::<u8>(), 0..4096)) {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join("corrupt_random.beatline.json");
        std::fs::write(&path, raw).expect("writing random payload should work");
        prop_assert!(no_panic_load(&path));
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn truncated_chart_payloads_do_not_panic(prefix_len in 0usize..16384usize) {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join("corrupt_truncated.beatline.json");
        save_chart(&path, &demo_chart()).expect("saving fixture chart should work");

        let mut payload = std::fs::read(&path).expect("reading saved chart should work");
        let truncated_len = prefix_len.min(payload.len());
        payload.truncate(truncated_len);
        std::fs::write(&path, payload).expect("writing truncated payload should work");

        prop_assert!(no_panic_load(&path));
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn mutated_item_payloads_do_not_panic(index in 0usize..16384usize, delta in any::<u8>()) {
        let mut payload = encode_items(&demo_chart().timeline).expect("items should encode");
        if !payload.is_empty() {
            let target = index % payload.len();
            payload[target] ^= delta.max(1);
        }

        let decoded = std::panic::catch_unwind(|| decode_items(&payload).is_ok());
        prop_assert!(decoded.is_ok());
    }
}
