//! End-to-end tests for the matching engine public API.

use clipsync::fingerprint::{
    codec, group_duplicates, matcher, Fingerprint, ReferenceSet, DEFAULT_BER_THRESHOLD,
};

fn bits(codes: &[u32]) -> clipsync::fingerprint::BitVector {
    codec::encode(&Fingerprint::new(codes.to_vec()))
}

#[test]
fn encode_is_deterministic_and_sized() {
    let fp = Fingerprint::new(vec![0xDEAD_BEEF, 0x0, 0xFFFF_FFFF]);
    let a = codec::encode(&fp);
    let b = codec::encode(&fp);

    assert_eq!(a, b);
    assert_eq!(a.len(), 32 * fp.len());
}

#[test]
fn query_matching_a_subwindow_is_accepted_at_any_positive_threshold() {
    // Reference song_a = [0x1, 0x2, 0x3, 0x4]; query [0x2, 0x3] is
    // bit-identical to the sub-window at window index 1.
    let mut refs = ReferenceSet::new();
    refs.insert("song_a".to_string(), bits(&[0x1, 0x2, 0x3, 0x4]));

    let query = bits(&[0x2, 0x3]);
    let alignment = matcher::align(&query, refs.get("song_a").unwrap()).unwrap();
    assert_eq!(alignment.distance, 0);
    assert!(alignment.exact);

    for threshold in [0.0001, 0.05, DEFAULT_BER_THRESHOLD, 0.9] {
        let candidate = matcher::select_best("clip", &query, &refs, threshold);
        assert!(candidate.accepted, "threshold {threshold}");
        assert_eq!(candidate.ber, 0.0);
        assert_eq!(candidate.reference_id.as_deref(), Some("song_a"));
    }
}

#[test]
fn longer_query_than_reference_is_a_clean_no_match() {
    let query = bits(&[0x1, 0x2, 0x3]);
    let reference = bits(&[0x1, 0x2]);

    assert!(matcher::align(&query, &reference).is_none());

    let mut refs = ReferenceSet::new();
    refs.insert("short".to_string(), reference);
    let candidate = matcher::select_best("clip", &query, &refs, DEFAULT_BER_THRESHOLD);
    assert!(!candidate.accepted);
    assert_eq!(candidate.ber, 1.0);
}

#[test]
fn empty_query_never_matches() {
    let query = bits(&[]);
    let mut refs = ReferenceSet::new();
    refs.insert("anything".to_string(), bits(&[0x1, 0x2, 0x3, 0x4]));

    assert!(matcher::align(&query, refs.get("anything").unwrap()).is_none());

    let candidate = matcher::select_best("clip", &query, &refs, DEFAULT_BER_THRESHOLD);
    assert!(!candidate.accepted);
    assert_eq!(candidate.reference_id, None);
    assert_eq!(candidate.ber, 1.0);
}

#[test]
fn acceptance_threshold_is_exclusive() {
    // 48 differing bits over a 320-bit query: BER exactly 0.15.
    let mut query_codes = vec![0u32; 10];
    query_codes[0] = 0xFFFF_FFFF;
    query_codes[1] = 0xFFFF;

    let mut refs = ReferenceSet::new();
    refs.insert("r".to_string(), bits(&[0u32; 10]));
    let query = bits(&query_codes);

    let at = matcher::select_best("clip", &query, &refs, 0.15);
    assert!(!at.accepted);

    let below = matcher::select_best("clip", &query, &refs, 0.1501);
    assert!(below.accepted);
}

#[test]
fn dedup_output_is_a_partition() {
    let entries: Vec<(String, _)> = vec![
        ("a".to_string(), bits(&[0x11, 0x22])),
        ("b".to_string(), bits(&[0x11, 0x22])),
        ("c".to_string(), bits(&[0xFFFF_FFFF, 0x0])),
        ("d".to_string(), bits(&[0xAAAA_AAAA, 0x5555_5555])),
    ];

    let groups = group_duplicates(&entries, DEFAULT_BER_THRESHOLD);

    let mut seen: Vec<&str> = groups
        .iter()
        .flat_map(|g| g.members().iter().map(String::as_str))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec!["a", "b", "c", "d"]);
    assert!(groups.iter().all(|g| !g.is_empty()));
}

#[test]
fn dedup_singletons_when_nothing_is_similar() {
    let entries: Vec<(String, _)> = vec![
        ("a".to_string(), bits(&[0x0, 0x0])),
        ("b".to_string(), bits(&[0xFFFF_FFFF, 0xFFFF_FFFF])),
    ];

    let groups = group_duplicates(&entries, DEFAULT_BER_THRESHOLD);
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| !g.is_cluster()));
}

#[test]
fn dedup_groups_by_anchor_similarity_only() {
    // b and c are each 12 bits (BER 0.094) away from a, in disjoint bit
    // positions, so b vs c would be 24 bits (BER 0.1875) apart - above the
    // threshold. Anchor-only grouping still puts all three together.
    let anchor = [0u32; 4];
    let mut near_b = anchor;
    near_b[0] = 0x0000_0FFF; // 12 bits
    let mut near_c = anchor;
    near_c[1] = 0x0FFF_0000; // 12 different bits

    let b_vs_c = matcher::symmetric_ber(&bits(&near_b), &bits(&near_c)).unwrap();
    assert!(b_vs_c >= 0.15, "premise: b vs c must not match directly");

    let entries: Vec<(String, _)> = vec![
        ("a".to_string(), bits(&anchor)),
        ("b".to_string(), bits(&near_b)),
        ("c".to_string(), bits(&near_c)),
    ];

    let groups = group_duplicates(&entries, 0.15);
    assert_eq!(groups.len(), 1);
    let members: Vec<&str> = groups[0].members().iter().map(String::as_str).collect();
    assert_eq!(members, vec!["a", "b", "c"]);
    assert_eq!(groups[0].representative(), "a");
}
