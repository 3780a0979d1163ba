use sqlx::{Postgres, QueryBuilder};
use crate::models::{Listing, ListingType, SearchCriteria};

/// Non-geographic predicate set over the listing collection
///
/// Every supplied field must match; `None` fields impose no constraint.
/// - `listing_type`, `postal_code`, `user_id`: exact match
/// - `city`, `state`, `title`: case-insensitive substring match
/// - `wanted_skill`, `offered_skill`: skill id equality (a NULL skill never matches)
///
/// The same predicate set is evaluated in memory by [`ListingFilter::matches`]
/// and rendered as SQL by [`ListingFilter::push_where`]; both must agree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub listing_type: Option<ListingType>,
    pub user_id: Option<i64>,
    /// Lowercased needle
    pub title: Option<String>,
    /// Lowercased needle
    pub city: Option<String>,
    /// Lowercased needle
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub wanted_skill: Option<i64>,
    pub offered_skill: Option<i64>,
}

impl ListingFilter {
    /// Build the predicate set from validated criteria.
    ///
    /// Proximity and pagination are not predicates and are left to the caller.
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        Self {
            listing_type: criteria.listing_type,
            user_id: criteria.user_id,
            title: criteria.title.as_deref().map(str::to_lowercase),
            city: criteria.city.as_deref().map(str::to_lowercase),
            state: criteria.state.as_deref().map(str::to_lowercase),
            postal_code: criteria.postal_code.clone(),
            wanted_skill: criteria.wanted_skill,
            offered_skill: criteria.offered_skill,
        }
    }

    /// True when no predicate is set
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluate the predicate set against a single listing
    #[inline]
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(listing_type) = self.listing_type {
            if listing.listing_type != listing_type {
                return false;
            }
        }

        if let Some(user_id) = self.user_id {
            if listing.user_id != user_id {
                return false;
            }
        }

        if let Some(title) = &self.title {
            if !listing.title.to_lowercase().contains(title.as_str()) {
                return false;
            }
        }

        if let Some(city) = &self.city {
            if !listing.city.to_lowercase().contains(city.as_str()) {
                return false;
            }
        }

        if let Some(state) = &self.state {
            if !listing.state.to_lowercase().contains(state.as_str()) {
                return false;
            }
        }

        if let Some(zip) = &self.postal_code {
            if listing.zip_code != *zip {
                return false;
            }
        }

        if let Some(skill) = self.wanted_skill {
            if listing.wanted_skill != Some(skill) {
                return false;
            }
        }

        if let Some(skill) = self.offered_skill {
            if listing.offered_skill != Some(skill) {
                return false;
            }
        }

        true
    }

    /// Filter an ordered sequence, keeping relative order
    pub fn apply(&self, listings: Vec<Listing>) -> Vec<Listing> {
        listings.into_iter().filter(|l| self.matches(l)).collect()
    }

    /// Append ` WHERE ...` for the supplied predicates (nothing when unconstrained) to a `SELECT ... FROM listings` query.
    ///
    /// All values are bound parameters; substring needles have LIKE wildcards escaped.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if self.is_unconstrained() {
            return;
        }

        qb.push(" WHERE TRUE");

        if let Some(listing_type) = self.listing_type {
            qb.push(" AND type = ").push_bind(listing_type);
        }
        if let Some(user_id) = self.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(title) = &self.title {
            qb.push(" AND title ILIKE ").push_bind(like_pattern(title));
        }
        if let Some(city) = &self.city {
            qb.push(" AND city ILIKE ").push_bind(like_pattern(city));
        }
        if let Some(state) = &self.state {
            qb.push(" AND state ILIKE ").push_bind(like_pattern(state));
        }
        if let Some(zip) = &self.postal_code {
            qb.push(" AND zip_code = ").push_bind(zip.clone());
        }
        if let Some(skill) = self.wanted_skill {
            qb.push(" AND wanted_skill = ").push_bind(skill);
        }
        if let Some(skill) = self.offered_skill {
            qb.push(" AND offered_skill = ").push_bind(skill);
        }
    }
}

/// `%needle%` with `\`, `%` and `_` escaped (Postgres' default LIKE escape is `\`)
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
