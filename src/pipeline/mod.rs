//! Post-processing of raw candidates into the ranked catalog

use std::collections::HashSet;

use tracing::info;

use crate::classify::AppleProductFilter;
use crate::models::Product;

/// Filter, deduplicate and rank raw candidates.
pub fn finalize(products: Vec<Product>, filter: &AppleProductFilter) -> Vec<Product> {
    let total = products.len();
    let genuine: Vec<Product> = products
        .into_iter()
        .filter(|p| filter.is_genuine(&p.name))
        .collect();
    let genuine_count = genuine.len();

    let unique = deduplicate(genuine);
    info!(
        "Kept {} of {} candidates ({} genuine, {} after deduplication)",
        unique.len(),
        total,
        genuine_count,
        unique.len()
    );

    rank_by_discount(unique)
}

/// Key under which two listings count as the same product.
pub fn dedup_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Keep the first occurrence of each normalized name, preserving order.
pub fn deduplicate(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|p| seen.insert(dedup_key(&p.name)))
        .collect()
}

/// Fill in `discount_percent` and `savings`.
pub fn apply_discount(product: &mut Product) {
    let (price, original) = (product.price, product.original_price);
    if original > price && price > 0 {
        let percent = (1.0 - price as f64 / original as f64) * 100.0;
        product.discount_percent = round_to_tenth(percent);
        product.savings = original - price;
    } else {
        product.discount_percent = 0.0;
        product.savings = 0;
    }
}

/// Round to one decimal place, ties to even on the exact binary value.
fn round_to_tenth(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(0.0)
}

/// Attach discount figures, then stable-sort by discount, largest first.
pub fn rank_by_discount(mut products: Vec<Product>) -> Vec<Product> {
    products.iter_mut().for_each(apply_discount);
    products.sort_by(|a, b| b.discount_percent.total_cmp(&a.discount_percent));
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn product(name: &str, price: u64, original: u64) -> Product {
        Product::new(name, price, original, "", "", Category::Other)
    }

    #[test]
    fn test_dedup_key() {
        assert_eq!(dedup_key(" iPhone 15\tPro "), "iphone15pro");
        assert_eq!(dedup_key("아이폰 15"), "아이폰15");
    }

    #[test]
    fn test_deduplicate_keeps_first_seen() {
        let products = vec![
            product("iPhone 15", 1_000_000, 1_200_000),
            product("AirPods", 200_000, 200_000),
            product("iphone 15 ", 900_000, 1_200_000),
            product("IPHONE15", 1, 1),
        ];
        let unique = deduplicate(products);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "iPhone 15");
        assert_eq!(unique[0].price, 1_000_000);
        assert_eq!(unique[1].name, "AirPods");
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let products = vec![
            product("Mac mini", 1, 1),
            product("mac  mini", 2, 2),
            product("iMac", 3, 3),
        ];
        let once = deduplicate(products);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_discount_rounding() {
        let mut p = product("iPhone 15", 1_000_000, 1_200_000);
        apply_discount(&mut p);
        assert_eq!(p.discount_percent, 16.7);
        assert_eq!(p.savings, 200_000);
    }

    #[test]
    fn test_discount_half_rounds_to_even() {
        // 1 - 1_500_000 / 1_600_000 is exactly 6.25 %.
        let mut p = product("MacBook Pro 14", 1_500_000, 1_600_000);
        apply_discount(&mut p);
        assert_eq!(p.discount_percent, 6.2);
        assert_eq!(p.savings, 100_000);

        assert_eq!(round_to_tenth(81.25), 81.2);
        assert_eq!(round_to_tenth(0.25), 0.2);
        assert_eq!(round_to_tenth(16.666), 16.7);
    }

    #[test]
    fn test_no_discount_cases() {
        for (price, original) in [(500, 500), (0, 1000), (0, 0)] {
            let mut p = product("x", price, original);
            apply_discount(&mut p);
            assert_eq!(p.discount_percent, 0.0);
            assert_eq!(p.savings, 0);
        }
    }

    #[test]
    fn test_rank_is_stable_and_descending() {
        let ranked = rank_by_discount(vec![
            product("a", 100, 100),
            product("b", 50, 100),
            product("c", 90, 100),
            product("d", 100, 100),
            product("e", 45, 90),
        ]);
        let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "e", "c", "a", "d"]);

        for pair in ranked.windows(2) {
            assert!(pair[0].discount_percent >= pair[1].discount_percent);
        }
        for p in &ranked {
            assert!(p.original_price >= p.price);
            assert!((0.0..=100.0).contains(&p.discount_percent));
        }
    }

    #[test]
    fn test_finalize_end_to_end() {
        let filter = AppleProductFilter::default();
        let products = vec![
            product("iPhone 15", 1_000_000, 1_200_000),
            product("iphone 15 ", 1_000_000, 1_200_000),
            product("iPhone 15 호환 케이스", 9_900, 19_900),
            product("AirPods Pro 2", 300_000, 300_000),
        ];
        let ranked = finalize(products, &filter);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "iPhone 15");
        assert_eq!(ranked[0].discount_percent, 16.7);
        assert_eq!(ranked[0].savings, 200_000);
        assert_eq!(ranked[1].name, "AirPods Pro 2");
    }
}
