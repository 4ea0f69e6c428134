//! Deal fixtures shared by the unit tests of this crate.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use ysdeals_core::{AgeBand, Category, Deal, Identifier, Sport, StockLevel, YouthEvidence};

pub(crate) fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub(crate) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0).unwrap()
}

/// A youth soccer deal with no identifiers beyond a synthetic one.
pub(crate) fn deal(id: &str, retailer: &str, title: &str, price: &str) -> Deal {
    Deal {
        deal_id: id.to_string(),
        source: retailer.to_lowercase(),
        title: title.to_string(),
        brand: None,
        sport: Sport::Soccer,
        category: Category::Footwear,
        price: dec(price),
        msrp: None,
        discount_pct: None,
        identifiers: BTreeSet::from([Identifier::Synthetic(format!("{retailer}:{id}"))]),
        sizes: BTreeSet::new(),
        youth_flag: true,
        age_band: Some(AgeBand::Youth),
        youth_evidence: YouthEvidence::TitleKeyword,
        retailer: retailer.to_string(),
        canonical_url: format!("https://{}.example/p/{id}", retailer.to_lowercase()),
        image_url: None,
        stock_level: StockLevel::InStock,
        coupon_code: None,
        first_seen: at(8),
        last_seen: at(8),
    }
}

pub(crate) trait DealExt {
    fn with_msrp(self, msrp: &str) -> Self;
    fn with_gtin(self, gtin: &str) -> Self;
    fn with_mpn(self, mpn: &str) -> Self;
    fn with_brand(self, brand: &str) -> Self;
    fn with_sport(self, sport: Sport) -> Self;
}

impl DealExt for Deal {
    fn with_msrp(mut self, msrp: &str) -> Self {
        let msrp = dec(msrp);
        self.msrp = Some(msrp);
        self.discount_pct = Deal::discount_between(self.price, msrp);
        self
    }

    fn with_gtin(mut self, gtin: &str) -> Self {
        self.identifiers.insert(Identifier::Gtin(gtin.to_string()));
        self
    }

    fn with_mpn(mut self, mpn: &str) -> Self {
        self.identifiers.insert(Identifier::Mpn(mpn.to_string()));
        self
    }

    fn with_brand(mut self, brand: &str) -> Self {
        self.brand = Some(brand.to_string());
        self
    }

    fn with_sport(mut self, sport: Sport) -> Self {
        self.sport = sport;
        self
    }
}
