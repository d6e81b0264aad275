//! Data models for product records and the persisted result artifact

use std::fmt;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Offset of Korea Standard Time from UTC, in seconds.
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Product family label assigned by the category classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "iPhone")]
    IPhone,
    #[serde(rename = "iPad")]
    IPad,
    #[serde(rename = "MacBook")]
    MacBook,
    #[serde(rename = "iMac")]
    IMac,
    #[serde(rename = "Mac mini")]
    MacMini,
    #[serde(rename = "Mac Studio")]
    MacStudio,
    #[serde(rename = "Mac Pro")]
    MacPro,
    #[serde(rename = "Apple Watch")]
    AppleWatch,
    #[serde(rename = "AirPods")]
    AirPods,
    #[serde(rename = "AirTag")]
    AirTag,
    #[serde(rename = "Apple TV")]
    AppleTv,
    #[serde(rename = "HomePod")]
    HomePod,
    #[serde(rename = "Apple Pencil")]
    ApplePencil,
    #[serde(rename = "Accessories")]
    Accessories,
    #[serde(rename = "Display")]
    Display,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IPhone => "iPhone",
            Self::IPad => "iPad",
            Self::MacBook => "MacBook",
            Self::IMac => "iMac",
            Self::MacMini => "Mac mini",
            Self::MacStudio => "Mac Studio",
            Self::MacPro => "Mac Pro",
            Self::AppleWatch => "Apple Watch",
            Self::AirPods => "AirPods",
            Self::AirTag => "AirTag",
            Self::AppleTv => "Apple TV",
            Self::HomePod => "HomePod",
            Self::ApplePencil => "Apple Pencil",
            Self::Accessories => "Accessories",
            Self::Display => "Display",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product listing discovered on a page.
///
/// Extractors create the record; `discount_percent` and `savings` are filled
/// in later by the discount calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub price: u64,
    pub original_price: u64,
    pub url: String,
    pub image: String,
    pub category: Category,
    pub discount_percent: f64,
    pub savings: u64,
}

impl Product {
    /// Build a raw candidate. An original price that is missing (`0`) or
    /// lower than the sale price collapses to the sale price.
    pub fn new(
        name: impl Into<String>,
        price: u64,
        original_price: u64,
        url: impl Into<String>,
        image: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            original_price: original_price.max(price),
            url: url.into(),
            image: image.into(),
            category,
            discount_percent: 0.0,
            savings: 0,
        }
    }
}

/// The persisted catalog: ranked products plus run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub last_updated: DateTime<FixedOffset>,
    pub total_products: usize,
    pub source_url: String,
    pub products: Vec<Product>,
}

impl ResultSet {
    /// Wrap a ranked product sequence, stamped with the current KST time.
    pub fn assemble(products: Vec<Product>, source_url: impl Into<String>) -> Self {
        Self {
            last_updated: now_kst(),
            total_products: products.len(),
            source_url: source_url.into(),
            products,
        }
    }
}

/// Current time at a fixed UTC+9 offset.
pub fn now_kst() -> DateTime<FixedOffset> {
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&kst)
}
