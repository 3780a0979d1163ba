use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of listing posted on the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Job,
    SkillExchange,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Job => "job",
            ListingType::SkillExchange => "skill_exchange",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job" => Ok(ListingType::Job),
            "skill_exchange" => Ok(ListingType::SkillExchange),
            other => Err(format!("must be one of: job, skill_exchange (got '{}')", other)),
        }
    }
}

/// A job or skill-exchange posting as stored in the `listings` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub offered_skill: Option<i64>,
    pub wanted_skill: Option<i64>,
    /// Stored file name of the uploaded image
    pub image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Listing data accepted for insertion; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub listing_type: ListingType,
    pub offered_skill: Option<i64>,
    pub wanted_skill: Option<i64>,
    pub image: Option<String>,
}

/// Checks the skill invariant of a listing.
///
/// `skill_exchange` needs both an offered and a wanted skill, `job` needs a wanted skill.
pub fn check_listing_skills(
    listing_type: ListingType,
    offered_skill: Option<i64>,
    wanted_skill: Option<i64>,
) -> Result<(), &'static str> {
    match listing_type {
        ListingType::SkillExchange if offered_skill.is_none() || wanted_skill.is_none() => Err(
            "For skill_exchange, both 'offered_skill' and 'wanted_skill' are required.",
        ),
        ListingType::Job if wanted_skill.is_none() => {
            Err("For job, 'wanted_skill' is required.")
        }
        _ => Ok(()),
    }
}

/// Latitude/longitude pair produced by geocoding a postal code
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Reference point and radius for the proximity post-filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proximity {
    pub reference_zip: String,
    pub radius_miles: u32,
}

/// 1-based page window applied to the final result sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.per_page as usize)
    }

    /// Apply the window to an ordered sequence
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.per_page as usize)
            .collect()
    }
}

/// Validated search input. Every `None` field is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub listing_type: Option<ListingType>,
    /// Owner of the listing
    pub user_id: Option<i64>,
    /// Title keyword
    pub title: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Exact postal code predicate; only set when no proximity search is requested
    pub postal_code: Option<String>,
    pub wanted_skill: Option<i64>,
    pub offered_skill: Option<i64>,
    pub proximity: Option<Proximity>,
    pub pagination: Option<Pagination>,
}
