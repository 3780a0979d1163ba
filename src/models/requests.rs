use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::models::domain::{
    check_listing_skills, ListingType, NewListing, Pagination, Proximity, SearchCriteria,
};

/// Raw query string of `GET /listings/search`.
///
/// Everything is kept as text so that malformed values surface as
/// field-level validation errors instead of extractor failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub user_id: Option<String>,
    /// Title keyword
    pub query: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub wanted_skill: Option<String>,
    pub offered_skill: Option<String>,
    pub proximity: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Page size bounds used when pagination parameters are present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

/// Validation messages keyed by request parameter name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Blank parameters are treated as absent
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_field<T: FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
    message: &str,
) -> Option<T> {
    let raw = non_blank(value)?;
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, message);
            None
        }
    }
}

fn parse_id(errors: &mut FieldErrors, field: &str, value: &Option<String>, kind: &str) -> Option<i64> {
    let id = parse_field::<i64>(errors, field, value, &format!("must be an integer {} id", kind))?;
    if id <= 0 {
        errors.add(field, format!("must be a positive {} id", kind));
        return None;
    }
    Some(id)
}

fn parse_positive(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<u32> {
    let n = parse_field::<u32>(errors, field, value, "must be a positive integer")?;
    if n == 0 {
        errors.add(field, "must be a positive integer");
        return None;
    }
    Some(n)
}

impl SearchParams {
    /// Validate the raw parameters into `SearchCriteria`, collecting every field error
    pub fn to_criteria(&self, limits: PageLimits) -> Result<SearchCriteria, FieldErrors> {
        let mut errors = FieldErrors::default();

        let listing_type = non_blank(&self.listing_type).and_then(|raw| {
            match raw.parse::<ListingType>() {
                Ok(t) => Some(t),
                Err(message) => {
                    errors.add("type", message);
                    None
                }
            }
        });

        let user_id = parse_id(&mut errors, "user_id", &self.user_id, "user");
        let wanted_skill = parse_id(&mut errors, "wanted_skill", &self.wanted_skill, "skill");
        let offered_skill = parse_id(&mut errors, "offered_skill", &self.offered_skill, "skill");
        let radius = parse_field::<u32>(
            &mut errors,
            "proximity",
            &self.proximity,
            "must be a non-negative integer number of miles",
        );
        let page = parse_positive(&mut errors, "page", &self.page);
        let per_page = parse_positive(&mut errors, "per_page", &self.per_page);

        if !errors.is_empty() {
            return Err(errors);
        }

        let zip_code = non_blank(&self.zip_code).map(str::to_string);
        let (postal_code, proximity) = match (zip_code, radius) {
            (Some(reference_zip), Some(radius_miles)) => (
                None,
                Some(Proximity {
                    reference_zip,
                    radius_miles,
                }),
            ),
            (zip, _) => (zip, None),
        };

        let pagination = if page.is_some() || per_page.is_some() {
            Some(Pagination {
                page: page.unwrap_or(1),
                per_page: per_page
                    .unwrap_or(limits.default_per_page)
                    .min(limits.max_per_page),
            })
        } else {
            None
        };

        Ok(SearchCriteria {
            listing_type,
            user_id,
            title: non_blank(&self.query).map(str::to_string),
            city: non_blank(&self.city).map(str::to_string),
            state: non_blank(&self.state).map(str::to_string),
            postal_code,
            wanted_skill,
            offered_skill,
            proximity,
            pagination,
        })
    }
}

/// Request body of `POST /listings`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_listing_skills"))]
pub struct CreateListingRequest {
    #[validate(range(min = 1))]
    pub user_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 10))]
    pub zip_code: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    #[serde(default)]
    pub offered_skill: Option<i64>,
    #[serde(default)]
    pub wanted_skill: Option<i64>,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub image: Option<String>,
}

fn validate_listing_skills(req: &CreateListingRequest) -> Result<(), ValidationError> {
    check_listing_skills(req.listing_type, req.offered_skill, req.wanted_skill).map_err(|msg| {
        let mut err = ValidationError::new("listing_skills");
        err.message = Some(msg.into());
        err
    })
}

impl From<CreateListingRequest> for NewListing {
    fn from(req: CreateListingRequest) -> Self {
        NewListing {
            user_id: req.user_id,
            title: req.title.trim().to_string(),
            description: req.description,
            city: req.city.trim().to_string(),
            state: req.state.trim().to_string(),
            zip_code: req.zip_code.trim().to_string(),
            listing_type: req.listing_type,
            offered_skill: req.offered_skill,
            wanted_skill: req.wanted_skill,
            image: req.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams::default()
    }

    #[test]
    fn test_empty_params_are_wildcards() {
        let criteria = params().to_criteria(PageLimits::default()).unwrap();
        assert_eq!(criteria, SearchCriteria::default());
    }

    #[test]
    fn test_blank_params_are_ignored() {
        let p = SearchParams {
            city: Some("   ".to_string()),
            wanted_skill: Some("".to_string()),
            ..params()
        };
        let criteria = p.to_criteria(PageLimits::default()).unwrap();
        assert_eq!(criteria.city, None);
        assert_eq!(criteria.wanted_skill, None);
    }

    #[test]
    fn test_non_numeric_skill_is_rejected() {
        let p = SearchParams {
            wanted_skill: Some("abc".to_string()),
            offered_skill: Some("-3".to_string()),
            listing_type: Some("gig".to_string()),
            ..params()
        };
        let errors = p.to_criteria(PageLimits::default()).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["offered_skill", "type", "wanted_skill"]);
    }

    #[test]
    fn test_user_and_keyword_params() {
        let p = SearchParams {
            user_id: Some("42".to_string()),
            query: Some("  guitar ".to_string()),
            ..params()
        };
        let criteria = p.to_criteria(PageLimits::default()).unwrap();
        assert_eq!(criteria.user_id, Some(42));
        assert_eq!(criteria.title.as_deref(), Some("guitar"));

        let p = SearchParams {
            user_id: Some("me".to_string()),
            ..params()
        };
        let errors = p.to_criteria(PageLimits::default()).unwrap_err();
        assert_eq!(errors.get("user_id"), Some(&["must be an integer user id".to_string()][..]));
    }

    #[test]
    fn test_zip_with_radius_becomes_proximity() {
        let p = SearchParams {
            zip_code: Some("10002".to_string()),
            proximity: Some("5".to_string()),
            ..params()
        };
        let criteria = p.to_criteria(PageLimits::default()).unwrap();
        assert_eq!(criteria.postal_code, None);
        assert_eq!(
            criteria.proximity,
            Some(Proximity {
                reference_zip: "10002".to_string(),
                radius_miles: 5
            })
        );
    }

    #[test]
    fn test_zip_without_radius_is_exact_filter() {
        let p = SearchParams {
            zip_code: Some(" 10002 ".to_string()),
            ..params()
        };
        let criteria = p.to_criteria(PageLimits::default()).unwrap();
        assert_eq!(criteria.postal_code.as_deref(), Some("10002"));
        assert!(criteria.proximity.is_none());
    }

    #[test]
    fn test_radius_without_zip_is_skipped() {
        let p = SearchParams {
            proximity: Some("25".to_string()),
            ..params()
        };
        let criteria = p.to_criteria(PageLimits::default()).unwrap();
        assert!(criteria.proximity.is_none());
        assert!(criteria.postal_code.is_none());
    }

    #[test]
    fn test_negative_radius_is_rejected() {
        let p = SearchParams {
            zip_code: Some("10002".to_string()),
            proximity: Some("-1".to_string()),
            ..params()
        };
        let errors = p.to_criteria(PageLimits::default()).unwrap_err();
        assert!(errors.get("proximity").is_some());
    }

    #[test]
    fn test_pagination_defaults_and_cap() {
        let p = SearchParams {
            page: Some("2".to_string()),
            ..params()
        };
        let criteria = p.to_criteria(PageLimits::default()).unwrap();
        assert_eq!(criteria.pagination, Some(Pagination { page: 2, per_page: 20 }));

        let p = SearchParams {
            per_page: Some("1000".to_string()),
            ..params()
        };
        let criteria = p.to_criteria(PageLimits::default()).unwrap();
        assert_eq!(criteria.pagination, Some(Pagination { page: 1, per_page: 100 }));

        let p = SearchParams {
            page: Some("0".to_string()),
            ..params()
        };
        assert!(p.to_criteria(PageLimits::default()).is_err());
    }

    fn create_request(listing_type: ListingType, offered: Option<i64>, wanted: Option<i64>) -> CreateListingRequest {
        CreateListingRequest {
            user_id: 1,
            title: "Fix my bike".to_string(),
            description: None,
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip_code: "78701".to_string(),
            listing_type,
            offered_skill: offered,
            wanted_skill: wanted,
            image: None,
        }
    }

    #[test]
    fn test_create_request_skill_invariant() {
        assert!(create_request(ListingType::Job, None, Some(3)).validate().is_ok());
        assert!(create_request(ListingType::Job, None, None).validate().is_err());
        assert!(create_request(ListingType::SkillExchange, Some(1), Some(3)).validate().is_ok());
        assert!(create_request(ListingType::SkillExchange, None, Some(3)).validate().is_err());
    }

    #[test]
    fn test_create_request_field_lengths() {
        let mut req = create_request(ListingType::Job, None, Some(3));
        req.zip_code = "12345678901".to_string();
        assert!(req.validate().is_err());

        let mut req = create_request(ListingType::Job, None, Some(3));
        req.title = String::new();
        assert!(req.validate().is_err());
    }
}
