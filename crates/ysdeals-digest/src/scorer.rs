//! Composite scoring of deal clusters.
//!
//! Every sub-score lands in `[0, 1]`; the composite is their weighted sum
//! using [`ScoringWeights`], rounded to six decimal places so equal inputs
//! compare equal.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use ysdeals_core::{
    AgeBand, BrandWeights, Deal, DealCluster, ScoringWeights, StockLevel, SubScores, YouthEvidence,
};

/// Cheapest and dearest eligible representative price for one
/// sport + category group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    #[must_use]
    pub fn of(price: Decimal) -> Self {
        Self {
            min: price,
            max: price,
        }
    }

    pub fn include(&mut self, price: Decimal) {
        self.min = self.min.min(price);
        self.max = self.max.max(price);
    }
}

#[must_use]
pub fn discount_score(deal: &Deal) -> f64 {
    deal.discount_fraction().clamp(0.0, 1.0)
}

/// `(max - price) / (max - min)`: the cheapest item in the range scores 1.
/// A degenerate range scores 1 for everyone.
#[must_use]
pub fn price_score(price: Decimal, range: PriceRange) -> f64 {
    let span = range.max - range.min;
    if span <= Decimal::ZERO {
        return 1.0;
    }
    ((range.max - price) / span)
        .to_f64()
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

/// Prestige plus sport bonus on the 0–10 scale, divided by 10 and capped.
/// No brand scores 0.
#[must_use]
pub fn brand_score(deal: &Deal, brands: &BrandWeights) -> f64 {
    match deal.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        Some(brand) => (brands.raw_score(brand, deal.sport) / 10.0).clamp(0.0, 1.0),
        None => 0.0,
    }
}

#[must_use]
pub fn youth_score(deal: &Deal) -> f64 {
    if deal.youth_flag {
        return match deal.age_band {
            Some(AgeBand::AdultSizedDown) => 0.75,
            _ => 1.0,
        };
    }
    if deal.youth_evidence == YouthEvidence::Ambiguous {
        0.35
    } else {
        0.0
    }
}

/// Availability signals on a 0–5 point scale, normalized: stock level from
/// the representative, size breadth and coupon from the whole cluster.
#[must_use]
pub fn inventory_score(cluster: &DealCluster) -> f64 {
    let stock = cluster.representative().stock_level;
    let broad_sizes = cluster.merged_sizes().len() >= 3;
    let has_coupon = cluster.coupon_code().is_some();

    let mut points: f64 = match stock {
        StockLevel::InStock => 2.5,
        StockLevel::Limited => 3.0,
        StockLevel::Out => -2.0,
    };
    if broad_sizes {
        points += 1.0;
    }
    if has_coupon {
        points += 1.0;
    }
    if stock != StockLevel::Out && broad_sizes && has_coupon {
        points += 1.0;
    }
    points.clamp(0.0, 5.0) / 5.0
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Scores one cluster by its representative.
#[must_use]
pub fn score_cluster(
    cluster: &DealCluster,
    range: PriceRange,
    brands: &BrandWeights,
    weights: &ScoringWeights,
) -> (f64, SubScores) {
    let rep = cluster.representative();
    let sub = SubScores {
        discount: discount_score(rep),
        price: price_score(rep.price, range),
        brand: brand_score(rep, brands),
        youth: youth_score(rep),
        inventory: inventory_score(cluster),
    };
    let total = weights.discount * sub.discount
        + weights.price * sub.price
        + weights.brand * sub.brand
        + weights.youth * sub.youth
        + weights.inventory * sub.inventory;
    (round6(total), sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dec, deal, DealExt};
    use ysdeals_core::Sport;

    fn single(d: Deal) -> DealCluster {
        DealCluster {
            members: vec![d],
            representative: 0,
            alternate_retailers: Vec::new(),
        }
    }

    #[test]
    fn discount_score_is_fraction() {
        let d = deal("a", "A", "X", "20").with_msrp("80");
        assert!((discount_score(&d) - 0.75).abs() < 1e-9);
        assert!(discount_score(&deal("b", "B", "X", "20")).abs() < f64::EPSILON);
    }

    #[test]
    fn price_score_inverts_within_range() {
        let range = PriceRange {
            min: dec("20"),
            max: dec("60"),
        };
        assert!((price_score(dec("20"), range) - 1.0).abs() < 1e-9);
        assert!((price_score(dec("40"), range) - 0.5).abs() < 1e-9);
        assert!(price_score(dec("60"), range).abs() < 1e-9);
        assert!((price_score(dec("35"), PriceRange::of(dec("35"))) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn brand_score_uses_prestige_and_sport_bonus() {
        let brands = BrandWeights::default();
        let bauer_hockey = deal("a", "A", "X", "1")
            .with_brand("Bauer")
            .with_sport(Sport::Hockey);
        // 8.0 + 2.0 bonus, capped at 10.
        assert!((brand_score(&bauer_hockey, &brands) - 1.0).abs() < 1e-9);

        let bauer_soccer = deal("b", "B", "X", "1").with_brand("bauer");
        assert!((brand_score(&bauer_soccer, &brands) - 0.8).abs() < 1e-9);

        let unknown = deal("c", "C", "X", "1").with_brand("Acme");
        assert!((brand_score(&unknown, &brands) - 0.5).abs() < 1e-9);

        assert!(brand_score(&deal("d", "D", "X", "1"), &brands).abs() < f64::EPSILON);
    }

    #[test]
    fn youth_score_grades_evidence() {
        let youth = deal("a", "A", "X", "1");
        assert!((youth_score(&youth) - 1.0).abs() < f64::EPSILON);

        let mut sized_down = youth.clone();
        sized_down.age_band = Some(AgeBand::AdultSizedDown);
        assert!((youth_score(&sized_down) - 0.75).abs() < f64::EPSILON);

        let mut ambiguous = youth.clone();
        ambiguous.youth_flag = false;
        ambiguous.age_band = None;
        ambiguous.youth_evidence = YouthEvidence::Ambiguous;
        assert!((youth_score(&ambiguous) - 0.35).abs() < f64::EPSILON);

        let mut adult = ambiguous;
        adult.youth_evidence = YouthEvidence::None;
        assert!(youth_score(&adult).abs() < f64::EPSILON);
    }

    #[test]
    fn inventory_score_rewards_full_availability() {
        let mut d = deal("a", "A", "X", "1");
        d.sizes = ["YS", "YM", "YL"].into_iter().map(String::from).collect();
        d.coupon_code = Some("KIDS15".into());
        assert!((inventory_score(&single(d.clone())) - 1.0).abs() < 1e-9);

        d.stock_level = StockLevel::Out;
        // -2 + 1 + 1 = 0
        assert!(inventory_score(&single(d)).abs() < 1e-9);

        let bare = deal("b", "B", "X", "1");
        assert!((inventory_score(&single(bare)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn composite_is_weighted_sum() {
        let d = deal("a", "A", "X", "40").with_msrp("80").with_brand("Acme");
        let (score, sub) = score_cluster(
            &single(d),
            PriceRange::of(dec("40")),
            &BrandWeights::default(),
            &ScoringWeights::default(),
        );
        // .45*.5 + .20*1 + .10*.5 + .20*1 + .05*.5
        assert!((score - 0.7).abs() < 1e-9, "got {score}");
        assert!((sub.discount - 0.5).abs() < 1e-9);
    }
}
