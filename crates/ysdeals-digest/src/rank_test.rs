use super::*;
use crate::test_support::{at, dec, deal, DealExt};
use ysdeals_core::Deal;

fn single(d: Deal) -> DealCluster {
    DealCluster {
        members: vec![d],
        representative: 0,
        alternate_retailers: Vec::new(),
    }
}

fn ids(entries: &[RankedEntry]) -> Vec<&str> {
    entries
        .iter()
        .map(|e| e.cluster.representative().deal_id.as_str())
        .collect()
}

fn rank_with(options: RankingOptions, deals: Vec<Deal>) -> Vec<RankedEntry> {
    let brands = BrandWeights::default();
    let weights = ScoringWeights::default();
    Ranker::new(&brands, &weights, options).rank(deals.into_iter().map(single).collect())
}

fn options() -> RankingOptions {
    RankingOptions {
        min_discount: 0.20,
        top_per_sport: None,
        youth_only: false,
        in_stock_only: false,
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn min_discount_treats_missing_discount_as_zero() {
    let deals = vec![
        deal("a", "A", "X", "40").with_msrp("80"),
        deal("b", "B", "X", "45").with_msrp("50"),
        deal("c", "C", "X", "30"),
    ];
    assert_eq!(ids(&rank_with(options(), deals.clone())), vec!["a"]);

    let everything = RankingOptions {
        min_discount: 0.0,
        ..options()
    };
    assert_eq!(rank_with(everything, deals).len(), 3);
}

#[test]
fn youth_only_and_in_stock_only_filter_on_representative() {
    let mut adult = deal("adult", "A", "X", "40").with_msrp("80");
    adult.youth_flag = false;
    adult.age_band = None;
    let mut sold_out = deal("out", "B", "X", "40").with_msrp("80");
    sold_out.stock_level = StockLevel::Out;
    let keep = deal("keep", "C", "X", "40").with_msrp("80");
    let deals = vec![adult, sold_out, keep];

    assert_eq!(rank_with(options(), deals.clone()).len(), 3);

    let youth = RankingOptions {
        youth_only: true,
        ..options()
    };
    assert_eq!(ids(&rank_with(youth, deals.clone())), vec!["keep", "out"]);

    let stocked = RankingOptions {
        in_stock_only: true,
        ..options()
    };
    assert_eq!(ids(&rank_with(stocked, deals)), vec!["keep", "adult"]);
}

// ---------------------------------------------------------------------------
// Ordering and grouping
// ---------------------------------------------------------------------------

#[test]
fn entries_group_by_sport_with_ranks_from_one() {
    let deals = vec![
        deal("h1", "A", "Stick", "40")
            .with_msrp("80")
            .with_sport(Sport::Hockey),
        deal("s1", "B", "Cleat", "40").with_msrp("80"),
        deal("s2", "C", "Cleat", "40").with_msrp("100"),
    ];
    let entries = rank_with(options(), deals);

    assert_eq!(ids(&entries), vec!["s2", "s1", "h1"]);
    let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 1]);
    assert!(entries[0].score > entries[1].score);
}

#[test]
fn rank_follows_score_within_each_sport() {
    let deals = vec![
        deal("a", "A", "X", "20").with_msrp("80"),
        deal("b", "B", "X", "60").with_msrp("80"),
        deal("c", "C", "X", "35").with_msrp("50"),
        deal("d", "D", "X", "50").with_msrp("70").with_sport(Sport::Tennis),
    ];
    let entries = rank_with(options(), deals);
    for pair in entries.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.cluster.representative().sport == b.cluster.representative().sport {
            assert!(a.score >= b.score);
            assert_eq!(b.rank, a.rank + 1);
        } else {
            assert_eq!(b.rank, 1);
        }
    }
}

#[test]
fn top_per_sport_truncates_each_group() {
    let mut deals: Vec<Deal> = (0..5)
        .map(|i| deal(&format!("s{i}"), "A", "X", "40").with_msrp(&(80 + 10 * i).to_string()))
        .collect();
    deals.push(
        deal("h0", "B", "X", "40")
            .with_msrp("80")
            .with_sport(Sport::Hockey),
    );
    let capped = RankingOptions {
        top_per_sport: Some(2),
        ..options()
    };
    let entries = rank_with(capped, deals);
    assert_eq!(ids(&entries), vec!["s4", "s3", "h0"]);
}

#[test]
fn equal_scores_break_on_discount_then_last_seen_then_id() {
    let flat = ScoringWeights {
        discount: 0.0,
        price: 0.0,
        youth: 0.0,
        brand: 0.0,
        inventory: 0.0,
    };
    let brands = BrandWeights::default();

    let mut x = deal("x", "A", "X", "40").with_msrp("80");
    x.last_seen = at(8);
    let y = deal("y", "B", "X", "40").with_msrp("100");
    let mut z = deal("z", "C", "X", "40").with_msrp("80");
    z.last_seen = at(6);
    let mut w = deal("w", "D", "X", "40").with_msrp("80");
    w.last_seen = at(6);

    let clusters = vec![x, y, z, w].into_iter().map(single).collect();
    let entries = Ranker::new(&brands, &flat, options()).rank(clusters);
    assert_eq!(ids(&entries), vec!["y", "w", "z", "x"]);
}

#[test]
fn ranking_is_deterministic() {
    let deals = vec![
        deal("a", "A", "Alpha", "20").with_msrp("40").with_brand("Nike"),
        deal("b", "B", "Beta", "25").with_msrp("50").with_brand("Bauer"),
        deal("c", "C", "Gamma", "30").with_msrp("60"),
    ];
    let first = rank_with(options(), deals.clone());
    let mut reversed = deals;
    reversed.reverse();
    let second = rank_with(options(), reversed);
    assert_eq!(first, second);
}

#[test]
fn from_config_uses_configured_options() {
    let mut config = PipelineConfig {
        sources: Vec::new(),
        youth: ysdeals_core::YouthConfig::default(),
        brands: BrandWeights::default(),
        scoring: ScoringWeights::default(),
        dedup: ysdeals_core::DedupThresholds::default(),
        ranking: RankingOptions::default(),
        currency_rates: BTreeMap::new(),
    };
    config.ranking.min_discount = 0.55;
    let ranker = Ranker::from_config(&config);
    let entries = ranker.rank(vec![
        single(deal("a", "A", "X", "40").with_msrp("80")),
        single(deal("b", "B", "X", "40").with_msrp("100")),
    ]);
    assert_eq!(ids(&entries), vec!["b"]);
}

// ---------------------------------------------------------------------------
// Digest stats
// ---------------------------------------------------------------------------

#[test]
fn digest_stats_summarize_entries() {
    let mut couponed = deal("a", "Alpha", "X", "40").with_msrp("80").with_brand("Nike");
    couponed.coupon_code = Some("KIDS10".into());
    let mut adult = deal("b", "Beta", "X", "45")
        .with_msrp("112.50")
        .with_brand("Nike")
        .with_sport(Sport::Hockey);
    adult.youth_flag = false;
    adult.age_band = None;
    let entries = rank_with(options(), vec![couponed, adult]);

    let stats = digest_stats(&entries);
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.youth_entries, 1);
    assert_eq!(stats.in_stock_entries, 2);
    assert_eq!(stats.coupon_entries, 1);
    assert!((stats.avg_discount_pct - 55.0).abs() < 1e-9);
    assert_eq!(stats.avg_price, dec("42.50"));
    assert_eq!(stats.top_sports, vec![(Sport::Soccer, 1), (Sport::Hockey, 1)]);
    assert_eq!(stats.top_brands, vec![("Nike".to_string(), 2)]);
    assert_eq!(
        stats.top_retailers,
        vec![("Alpha".to_string(), 1), ("Beta".to_string(), 1)]
    );
}

#[test]
fn digest_stats_average_prices_near_decimal_max() {
    let price = "50000000000000000000000000000";
    let a = deal("a", "Alpha", "Copa Cleat", price);
    let b = deal("b", "Beta", "Bauer Stick", price).with_sport(Sport::Hockey);
    let no_floor = RankingOptions {
        min_discount: 0.0,
        ..options()
    };
    let entries = rank_with(no_floor, vec![a, b]);

    let stats = digest_stats(&entries);
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.avg_price, dec(price));
}

#[test]
fn digest_stats_of_nothing_is_default() {
    assert_eq!(digest_stats(&[]), DigestStats::default());
}
