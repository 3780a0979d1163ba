// Unit tests for the listing search building blocks

use chrono::{TimeZone, Utc};
use skillswap_search::core::{distance::{haversine_miles, is_within_radius}, ListingFilter};
use skillswap_search::models::{
    check_listing_skills, Coordinate, Listing, ListingType, PageLimits, Pagination, SearchCriteria,
    SearchParams,
};

fn create_listing(id: i64, city: &str, listing_type: ListingType) -> Listing {
    Listing {
        id,
        user_id: 1,
        title: format!("Listing {}", id),
        description: None,
        city: city.to_string(),
        state: "TX".to_string(),
        zip_code: "78701".to_string(),
        listing_type,
        offered_skill: None,
        wanted_skill: None,
        image: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    }
}

fn filter_for(criteria: SearchCriteria) -> ListingFilter {
    ListingFilter::from_criteria(&criteria)
}

#[test]
fn test_haversine_miles_manhattan_to_brooklyn() {
    let manhattan = Coordinate::new(40.7580, -73.9855);
    let brooklyn = Coordinate::new(40.6782, -73.9442);

    let distance = haversine_miles(manhattan, brooklyn);
    assert!(distance > 4.0 && distance < 7.0, "got {}", distance);
}

#[test]
fn test_adjacent_zip_centroids_within_five_miles() {
    let zip_10001 = Coordinate::new(40.7484, -73.9967);
    let zip_10002 = Coordinate::new(40.7173, -73.9897);
    let zip_94105 = Coordinate::new(37.7898, -122.3942);

    assert!(is_within_radius(zip_10002, zip_10001, 5.0));
    assert!(!is_within_radius(zip_10002, zip_94105, 5.0));
}

#[test]
fn test_city_substring_matches_case_insensitively() {
    let filter = filter_for(SearchCriteria {
        city: Some("Austin".to_string()),
        ..Default::default()
    });

    let listings = vec![
        create_listing(1, "Austin, TX", ListingType::Job),
        create_listing(2, "South Austin", ListingType::Job),
        create_listing(3, "Dallas", ListingType::Job),
        create_listing(4, "AUSTIN", ListingType::SkillExchange),
    ];

    let ids: Vec<i64> = filter.apply(listings).iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![1, 2, 4]);
}

#[test]
fn test_type_only_criteria_tolerate_null_skills() {
    let filter = filter_for(SearchCriteria {
        listing_type: Some(ListingType::SkillExchange),
        ..Default::default()
    });

    let mut with_skills = create_listing(1, "Austin", ListingType::SkillExchange);
    with_skills.offered_skill = Some(3);
    with_skills.wanted_skill = Some(4);
    let without_skills = create_listing(2, "Austin", ListingType::SkillExchange);
    let job = create_listing(3, "Austin", ListingType::Job);

    let ids: Vec<i64> = filter
        .apply(vec![with_skills, without_skills, job])
        .iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_skill_filter_never_matches_null_skill() {
    let filter = filter_for(SearchCriteria {
        wanted_skill: Some(5),
        ..Default::default()
    });

    let mut wanted = create_listing(1, "Austin", ListingType::Job);
    wanted.wanted_skill = Some(5);
    let other = {
        let mut l = create_listing(2, "Austin", ListingType::Job);
        l.wanted_skill = Some(6);
        l
    };
    let null = create_listing(3, "Austin", ListingType::Job);

    assert!(filter.matches(&wanted));
    assert!(!filter.matches(&other));
    assert!(!filter.matches(&null));
}

#[test]
fn test_empty_criteria_match_everything() {
    let filter = filter_for(SearchCriteria::default());
    assert!(filter.is_unconstrained());
    assert!(filter.matches(&create_listing(1, "Anywhere", ListingType::Job)));
}

#[test]
fn test_params_with_proximity_become_reference_point() {
    let params = SearchParams {
        listing_type: Some("job".to_string()),
        wanted_skill: Some("5".to_string()),
        zip_code: Some("10002".to_string()),
        proximity: Some("5".to_string()),
        ..Default::default()
    };

    let criteria = params.to_criteria(PageLimits::default()).unwrap();
    let proximity = criteria.proximity.expect("proximity should be set");

    assert_eq!(criteria.listing_type, Some(ListingType::Job));
    assert_eq!(criteria.wanted_skill, Some(5));
    assert_eq!(criteria.postal_code, None);
    assert_eq!(proximity.reference_zip, "10002");
    assert_eq!(proximity.radius_miles, 5);
}

#[test]
fn test_params_zip_without_proximity_is_exact_filter() {
    let params = SearchParams {
        zip_code: Some("78701".to_string()),
        ..Default::default()
    };

    let criteria = params.to_criteria(PageLimits::default()).unwrap();
    assert_eq!(criteria.postal_code.as_deref(), Some("78701"));
    assert!(criteria.proximity.is_none());
}

#[test]
fn test_params_report_every_invalid_field() {
    let params = SearchParams {
        listing_type: Some("gig".to_string()),
        wanted_skill: Some("abc".to_string()),
        proximity: Some("-3".to_string()),
        ..Default::default()
    };

    let errors = params.to_criteria(PageLimits::default()).unwrap_err();
    let fields: Vec<&str> = errors.fields().collect();
    assert_eq!(fields, vec!["proximity", "type", "wanted_skill"]);
}

#[test]
fn test_per_page_is_capped() {
    let params = SearchParams {
        per_page: Some("1000".to_string()),
        ..Default::default()
    };

    let criteria = params.to_criteria(PageLimits::default()).unwrap();
    assert_eq!(criteria.pagination, Some(Pagination { page: 1, per_page: 100 }));
}

#[test]
fn test_pagination_slices_in_order() {
    let page = Pagination { page: 2, per_page: 2 };
    assert_eq!(page.apply(vec![1, 2, 3, 4, 5]), vec![3, 4]);

    let past_end = Pagination { page: 9, per_page: 2 };
    assert!(past_end.apply(vec![1, 2, 3]).is_empty());
}

#[test]
fn test_listing_skill_invariant() {
    assert!(check_listing_skills(ListingType::Job, None, Some(5)).is_ok());
    assert!(check_listing_skills(ListingType::Job, None, None).is_err());
    assert!(check_listing_skills(ListingType::SkillExchange, Some(1), Some(2)).is_ok());
    assert!(check_listing_skills(ListingType::SkillExchange, None, Some(2)).is_err());
}
