//! Keyword-driven product classification
//!
//! Both components here are pure functions over a product name, parameterized
//! by fixed keyword tables. Matching is case-insensitive substring search
//! against the lowercased name, with Korean and English synonyms side by side.

use crate::models::Category;

/// One classification rule: a category and the keywords that select it.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, name_lower: &str) -> bool {
        self.keywords.iter().any(|k| name_lower.contains(k.as_str()))
    }
}

/// Maps a product name to a category. Rules are checked in order and the
/// first rule with a matching keyword wins; no match yields [`Category::Other`].
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    rules: Vec<CategoryRule>,
}

impl CategoryClassifier {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, name: &str) -> Category {
        if name.is_empty() {
            return Category::Other;
        }
        let name_lower = name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&name_lower))
            .map_or(Category::Other, |rule| rule.category)
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(vec![
            CategoryRule::new(Category::IPhone, &["iphone", "아이폰"]),
            CategoryRule::new(Category::IPad, &["ipad", "아이패드"]),
            CategoryRule::new(Category::MacBook, &["macbook", "맥북"]),
            CategoryRule::new(Category::IMac, &["imac", "아이맥"]),
            CategoryRule::new(Category::MacMini, &["mac mini", "맥 미니", "맥미니"]),
            CategoryRule::new(Category::MacStudio, &["mac studio", "맥 스튜디오"]),
            CategoryRule::new(Category::MacPro, &["mac pro", "맥 프로"]),
            CategoryRule::new(Category::AppleWatch, &["apple watch", "애플워치", "애플 워치"]),
            CategoryRule::new(Category::AirPods, &["airpods", "에어팟"]),
            CategoryRule::new(Category::AirTag, &["airtag", "에어태그"]),
            CategoryRule::new(Category::AppleTv, &["apple tv", "애플 tv"]),
            CategoryRule::new(Category::HomePod, &["homepod", "홈팟"]),
            CategoryRule::new(Category::ApplePencil, &["pencil", "펜슬"]),
            CategoryRule::new(Category::Accessories, &["magic", "매직"]),
            CategoryRule::new(Category::Display, &["display", "디스플레이"]),
        ])
    }
}

/// Decides whether a listing is a genuine first-party Apple product rather
/// than an accessory or a third-party "compatible" item.
///
/// Exclusion keywords always win over inclusion keywords: plenty of case and
/// cable titles also mention the device they fit.
#[derive(Debug, Clone)]
pub struct AppleProductFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl AppleProductFilter {
    pub fn new(include: &[&str], exclude: &[&str]) -> Self {
        Self {
            include: include.iter().map(|k| k.to_lowercase()).collect(),
            exclude: exclude.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn is_genuine(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let name_lower = name.to_lowercase();
        if self.exclude.iter().any(|k| name_lower.contains(k.as_str())) {
            return false;
        }
        self.include.iter().any(|k| name_lower.contains(k.as_str()))
    }
}

impl Default for AppleProductFilter {
    fn default() -> Self {
        Self::new(
            &[
                "iPhone", "아이폰",
                "iPad", "아이패드",
                "MacBook", "맥북",
                "iMac", "아이맥",
                "Mac mini", "맥 미니",
                "Mac Studio", "맥 스튜디오",
                "Mac Pro", "맥 프로",
                "Apple Watch", "애플워치", "애플 워치",
                "AirPods", "에어팟",
                "AirTag", "에어태그",
                "Apple TV", "애플 TV",
                "HomePod", "홈팟",
                "Apple Pencil", "애플 펜슬",
                "Magic Keyboard", "매직 키보드",
                "Magic Mouse", "매직 마우스",
                "Magic Trackpad", "매직 트랙패드",
                "Studio Display", "스튜디오 디스플레이",
                "Pro Display", "프로 디스플레이",
            ],
            &[
                "케이스", "필름", "거치대", "충전기", "케이블", "어댑터",
                "스트랩", "밴드만", "보호", "강화유리", "compatible", "호환",
            ],
        )
    }
}
