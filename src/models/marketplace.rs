use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    New,
    LikeNew,
    #[default]
    Good,
    Fair,
    Poor,
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemCondition::New => write!(f, "new"),
            ItemCondition::LikeNew => write!(f, "like_new"),
            ItemCondition::Good => write!(f, "good"),
            ItemCondition::Fair => write!(f, "fair"),
            ItemCondition::Poor => write!(f, "poor"),
        }
    }
}

impl FromStr for ItemCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "new" => Ok(ItemCondition::New),
            "like_new" => Ok(ItemCondition::LikeNew),
            "good" => Ok(ItemCondition::Good),
            "fair" => Ok(ItemCondition::Fair),
            "poor" => Ok(ItemCondition::Poor),
            _ => Err(format!(
                "Invalid condition '{}'. Valid options: new, like_new, good, fair, poor",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: ItemCondition,
    pub seller_id: String,
    pub seller_name: String,
    pub image_url: Option<String>,
    pub sold: bool,
    pub created_at: DateTime<Utc>,
}

impl MarketplaceItem {
    pub fn new(
        new: NewMarketplaceItem,
        seller_id: impl Into<String>,
        seller_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            price: new.price,
            category: new.category,
            condition: new.condition,
            seller_id: seller_id.into(),
            seller_name: seller_name.into(),
            image_url: new.image_url,
            sold: false,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for MarketplaceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{}", self.title, if self.sold { " (SOLD)" } else { "" })?;
        writeln!(f, "Price: {:.2}", self.price)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Condition: {}", self.condition)?;
        writeln!(f, "Seller: {}", self.seller_name)?;
        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarketplaceItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub condition: ItemCondition,
    #[serde(default)]
    pub image_url: Option<String>,
}
