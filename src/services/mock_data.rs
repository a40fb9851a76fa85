use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::PriceChange;

/// Static fallback data served when the upstream API is unreachable or empty.
/// Seeds the price cache at service construction.
pub fn price_changes() -> Vec<PriceChange> {
    vec![
        seeded(".ABOGADO", 15.00, 20.00, 33.33, (2022, 9, 1), 3_245),
        seeded(".ACADEMY", 25.00, 33.00, 32.00, (2024, 10, 4), 8_234),
        seeded(".ACCOUNTANTS", 75.00, 81.00, 8.00, (2024, 10, 4), 2_134),
        seeded(".ACTOR", 29.00, 31.00, 6.90, (2024, 10, 4), 4_521),
        seeded(".ADULT", 75.00, 85.00, 13.33, (2024, 10, 1), 6_451),
        seeded(".AFRICA", 3.80, 7.50, 97.37, (2025, 6, 1), 12_543),
        seeded(".AI", 120.00, 140.00, 16.67, (2023, 4, 15), 278_543),
        seeded(".APP", 12.00, 14.00, 16.67, (2024, 8, 1), 456_321),
    ]
}

fn seeded(
    tld: &str,
    old_price: f64,
    new_price: f64,
    percentage_change: f64,
    date: (i32, u32, u32),
    domain_count: u64,
) -> PriceChange {
    let now = Utc::now();
    PriceChange {
        id: Uuid::new_v4(),
        tld: tld.to_string(),
        old_price,
        new_price,
        price_change: new_price - old_price,
        percentage_change,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .expect("static fallback dates are valid"),
        domain_count: Some(domain_count),
        history: Vec::new(),
        alerts: Vec::new(),
        last_checked: now,
        next_check: now + Duration::hours(24),
        sources: vec!["fallback".to_string()],
        metadata: None,
    }
}
