//! Investment policy matching.
//!
//! A product is a candidate for a setting only when the fixed bid fits
//! the remaining amount, period and rate fall inside the inclusive bounds,
//! and its category is accepted. Category is checked last.

use crate::config::Setting;
use crate::types::Product;

impl Setting {
    /// Whether `product` satisfies this setting's policy.
    pub fn matches(&self, product: &Product) -> bool {
        if self.amount > product.remain_amount {
            return false;
        }
        if product.period < self.period_min || product.period > self.period_max {
            return false;
        }
        if product.rate < self.rate_min || product.rate > self.rate_max {
            return false;
        }
        self.categories.contains(&product.category)
    }
}

/// Keep the products matching `setting`, preserving listing order.
pub fn filter_candidates(products: Vec<Product>, setting: &Setting) -> Vec<Product> {
    products.into_iter().filter(|p| setting.matches(p)).collect()
}
