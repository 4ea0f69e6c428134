use super::*;
use crate::test_support::{dec, deal, DealExt};

fn thresholds() -> DedupThresholds {
    DedupThresholds::default()
}

fn cluster_ids(outcome: &DedupOutcome) -> Vec<Vec<String>> {
    outcome
        .clusters
        .iter()
        .map(|c| {
            let mut ids: Vec<String> = c.members.iter().map(|d| d.deal_id.clone()).collect();
            ids.sort();
            ids
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Identifier signals
// ---------------------------------------------------------------------------

#[test]
fn shared_gtin_clusters_with_cheapest_representative() {
    let a = deal("a1", "Retailer A", "Copa Youth Cleat", "40")
        .with_msrp("80")
        .with_gtin("123");
    let b = deal("b1", "Retailer B", "Copa Kids Cleat FG", "45")
        .with_msrp("90")
        .with_gtin("123");

    let outcome = dedup(vec![b, a], &thresholds());

    assert_eq!(outcome.clusters.len(), 1);
    let cluster = &outcome.clusters[0];
    assert_eq!(cluster.len(), 2);
    assert_eq!(cluster.representative().retailer, "Retailer A");
    assert_eq!(cluster.representative().price, dec("40"));
    assert_eq!(cluster.alternate_retailers, vec!["Retailer B".to_string()]);
}

#[test]
fn mpn_requires_matching_brand() {
    let a = deal("a1", "A", "Trainer", "40").with_mpn("GZ1").with_brand("Adidas");
    let b = deal("b1", "B", "Shoe", "90").with_mpn("GZ1").with_brand("adidas ");
    let c = deal("c1", "C", "Boot", "10").with_mpn("GZ1").with_brand("Puma");
    let d = deal("d1", "D", "Boot", "10").with_mpn("GZ1");

    let outcome = dedup(vec![a, b, c, d], &thresholds());

    assert_eq!(
        cluster_ids(&outcome),
        vec![vec!["a1".to_string(), "b1".to_string()], vec!["c1".into()], vec!["d1".into()]]
    );
}

#[test]
fn matching_is_transitive() {
    // a~b by GTIN, b~c by MPN + brand; a and c share nothing directly.
    let a = deal("a1", "A", "Alpha", "10").with_gtin("555");
    let b = deal("b1", "B", "Beta", "50")
        .with_gtin("555")
        .with_mpn("M-9")
        .with_brand("Bauer");
    let c = deal("c1", "C", "Gamma", "99").with_mpn("M-9").with_brand("Bauer");

    let outcome = dedup(vec![a, b, c], &thresholds());

    assert_eq!(outcome.clusters.len(), 1);
    assert_eq!(outcome.clusters[0].len(), 3);
    assert_eq!(
        outcome.clusters[0].alternate_retailers,
        vec!["B".to_string(), "C".to_string()]
    );
}

// ---------------------------------------------------------------------------
// Fuzzy signal
// ---------------------------------------------------------------------------

#[test]
fn fuzzy_match_needs_title_brand_sport_and_price() {
    let title = "Nike Mercurial Vapor 15 Youth Cleat";
    let a = deal("a1", "A", title, "40").with_brand("Nike");
    let b = deal("b1", "B", "NIKE Mercurial Vapor 15 - Youth Cleat", "44").with_brand("NIKE");
    let far_price = deal("c1", "C", title, "80").with_brand("Nike");
    let other_sport = deal("d1", "D", title, "40")
        .with_brand("Nike")
        .with_sport(Sport::Running);
    let no_brand = deal("e1", "E", title, "40");
    let other_title = deal("f1", "F", "Nike Phantom GX Youth Cleat", "40").with_brand("Nike");

    let outcome = dedup(
        vec![a, b, far_price, other_sport, no_brand, other_title],
        &thresholds(),
    );

    let merged: Vec<&DealCluster> = outcome.clusters.iter().filter(|c| c.len() > 1).collect();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].representative().deal_id, "a1");
    assert_eq!(outcome.clusters.len(), 5);
}

#[test]
fn fuzzy_match_survives_prices_near_decimal_max() {
    let a = deal("a1", "A", "Adidas Copa Youth Cleat", "50000000000000000000000000000")
        .with_brand("Adidas");
    let b = deal("b1", "B", "Adidas Copa Youth Cleat", "50000000000000000000000000000")
        .with_brand("Adidas");

    let outcome = dedup(vec![a, b], &thresholds());

    assert_eq!(outcome.clusters.len(), 1);
    assert_eq!(outcome.stats.duplicates_merged, 1);
}

#[test]
fn title_threshold_is_configurable() {
    let a = deal("a1", "A", "Bauer Vapor Youth Stick", "50").with_brand("Bauer");
    let b = deal("b1", "B", "Bauer Vapor Youth Hockey Stick", "50").with_brand("Bauer");
    // {vapor, youth, stick} vs {vapor, youth, hockey, stick}: 6/7 ≈ 0.857
    assert_eq!(dedup(vec![a.clone(), b.clone()], &thresholds()).clusters.len(), 1);

    let strict = DedupThresholds {
        title_similarity: 0.95,
        ..thresholds()
    };
    assert_eq!(dedup(vec![a, b], &strict).clusters.len(), 2);
}

// ---------------------------------------------------------------------------
// Representative selection and ordering
// ---------------------------------------------------------------------------

#[test]
fn representative_ties_break_on_discount_then_retailer() {
    let plain = deal("p1", "Aardvark", "X", "30").with_gtin("9");
    let discounted = deal("d1", "Zebra", "X", "30").with_msrp("60").with_gtin("9");
    let outcome = dedup(vec![plain.clone(), discounted], &thresholds());
    assert_eq!(outcome.clusters[0].representative().retailer, "Zebra");

    let other = deal("o1", "Mongoose", "X", "30").with_gtin("9");
    let outcome = dedup(vec![other, plain], &thresholds());
    assert_eq!(outcome.clusters[0].representative().retailer, "Aardvark");
}

#[test]
fn representative_is_a_member_with_minimum_price() {
    let deals = vec![
        deal("a", "A", "One", "12.50").with_gtin("1"),
        deal("b", "B", "One", "11.99").with_gtin("1"),
        deal("c", "C", "One", "13.00").with_gtin("1"),
        deal("d", "D", "Two", "20").with_gtin("2"),
        deal("e", "E", "Two", "19.50").with_gtin("2"),
        deal("f", "F", "Three", "5"),
    ];
    let outcome = dedup(deals, &thresholds());
    for cluster in &outcome.clusters {
        let rep = cluster.representative();
        assert!(cluster.members.iter().any(|m| m.deal_id == rep.deal_id));
        assert!(cluster.members.iter().all(|m| rep.price <= m.price));
    }
}

#[test]
fn alternates_exclude_representatives_own_retailer() {
    let a = deal("a1", "A", "X", "10").with_gtin("7");
    let a2 = deal("a2", "A", "X", "12").with_gtin("7");
    let b = deal("b1", "B", "X", "11").with_gtin("7");
    let outcome = dedup(vec![a, a2, b], &thresholds());
    assert_eq!(outcome.clusters[0].alternate_retailers, vec!["B".to_string()]);
}

#[test]
fn output_does_not_depend_on_input_order() {
    let deals = vec![
        deal("a1", "A", "Nike Vapor Youth Cleat", "40").with_brand("Nike"),
        deal("b1", "B", "Nike Vapor Youth Cleat", "42").with_brand("Nike"),
        deal("c1", "C", "Helmet", "30").with_gtin("44"),
        deal("d1", "D", "Helmet Jr", "28").with_gtin("44"),
        deal("e1", "E", "Bag", "15"),
    ];
    let mut reversed = deals.clone();
    reversed.reverse();

    let forward = dedup(deals, &thresholds());
    let backward = dedup(reversed, &thresholds());
    assert_eq!(forward.clusters, backward.clusters);
}

#[test]
fn clusters_are_ordered_by_representative_id() {
    let outcome = dedup(
        vec![
            deal("zz", "Z", "Z", "1"),
            deal("aa", "A", "A", "1"),
            deal("mm", "M", "M", "1"),
        ],
        &thresholds(),
    );
    let ids: Vec<&str> = outcome
        .clusters
        .iter()
        .map(|c| c.representative().deal_id.as_str())
        .collect();
    assert_eq!(ids, vec!["aa", "mm", "zz"]);
}

// ---------------------------------------------------------------------------
// Stats and overlap
// ---------------------------------------------------------------------------

#[test]
fn stats_count_groups_and_merges() {
    let outcome = dedup(
        vec![
            deal("a", "A", "X", "1").with_gtin("1"),
            deal("b", "B", "X", "1").with_gtin("1"),
            deal("c", "C", "X", "1").with_gtin("1"),
            deal("d", "D", "Y", "1"),
        ],
        &thresholds(),
    );
    assert_eq!(outcome.stats.total_deals, 4);
    assert_eq!(outcome.stats.clusters, 2);
    assert_eq!(outcome.stats.duplicate_groups, 1);
    assert_eq!(outcome.stats.duplicates_merged, 2);
    assert!((outcome.stats.dedup_rate - 50.0).abs() < f64::EPSILON);
}

#[test]
fn empty_batch_yields_nothing() {
    let outcome = dedup(Vec::new(), &thresholds());
    assert!(outcome.clusters.is_empty());
    assert_eq!(outcome.stats, DedupStats::default());
}

#[test]
fn retailer_overlap_is_symmetric() {
    let outcome = dedup(
        vec![
            deal("a", "A", "X", "1").with_gtin("1"),
            deal("b", "B", "X", "1").with_gtin("1"),
            deal("c", "C", "Y", "1").with_gtin("2"),
            deal("a2", "A", "Y", "1").with_gtin("2"),
            deal("d", "D", "Z", "1"),
        ],
        &thresholds(),
    );
    let overlap = retailer_overlap(&outcome.clusters);
    let names = |r: &str| -> Vec<&str> { overlap[r].iter().map(String::as_str).collect() };
    assert_eq!(names("A"), vec!["B", "C"]);
    assert_eq!(names("B"), vec!["A"]);
    assert_eq!(names("C"), vec!["A"]);
    assert!(!overlap.contains_key("D"));
}
