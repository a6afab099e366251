use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::business::{BusinessId, ServiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Wellness,
    Beauty,
    Fitness,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Wellness => "Wellness",
            Category::Beauty => "Beauty",
            Category::Fitness => "Fitness",
            Category::Other => "Other",
        }
    }
}

// Checked in order; the first category with a hit wins.
const KEYWORDS: [(Category, &[&str]); 3] = [
    (Category::Wellness, &["spa", "massage", "wellness"]),
    (Category::Beauty, &["salon", "hair", "beauty", "nail"]),
    (Category::Fitness, &["gym", "fitness", "training"]),
];

/// Guesses a listing category from free text on the business profile.
pub fn infer_category(name: &str, description: Option<&str>) -> Category {
    let name = name.to_lowercase();
    let description = description.unwrap_or_default().to_lowercase();

    KEYWORDS
        .iter()
        .find(|(_, words)| {
            words
                .iter()
                .any(|w| name.contains(w) || description.contains(w))
        })
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessListing {
    pub id: BusinessId,
    pub name: String,
    pub category: Category,
    pub services: Vec<ServiceListing>,
}
