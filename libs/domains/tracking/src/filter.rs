//! Typed query filter built from raw query parameters.

use bson::oid::ObjectId;
use std::str::FromStr;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::models::{FuelCondition, VehicleStatus};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Largest skip the store accepts (BSON int64).
pub const MAX_SKIP: u64 = i64::MAX as u64;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("{key} must be an integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must not be negative")]
    Negative { key: &'static str },

    #[error("mileage must be a finite number, got '{0}'")]
    InvalidMileage(String),

    #[error("vehicle_id must be a 24-digit hex ObjectId, got '{0}'")]
    InvalidVehicleId(String),

    #[error("unknown status '{0}'")]
    InvalidStatus(String),

    #[error("unknown fuel_condition '{0}'")]
    InvalidFuelCondition(String),

    #[error("cannot sort by '{0}'")]
    InvalidSortField(String),

    #[error("sort_order must be 'asc' or 'desc', got '{0}'")]
    InvalidSortOrder(String),

    #[error("page {page} is out of range for limit {limit}")]
    PageOutOfRange { page: u64, limit: u64 },

    #[error("malformed query string: {0}")]
    MalformedQuery(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// MongoDB sort direction
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

impl FromStr for SortOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(FilterError::InvalidSortOrder(s.to_string()))
        }
    }
}

/// Fields the query may be sorted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    VehicleId,
    Location,
    Mileage,
    Status,
    FuelCondition,
    #[strum(serialize = "_id", serialize = "id")]
    Id,
}

impl SortField {
    /// Stored document field name
    pub fn field_name(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::VehicleId => "vehicle_id",
            SortField::Location => "location",
            SortField::Mileage => "mileage",
            SortField::Status => "status",
            SortField::FuelCondition => "fuel_condition",
            SortField::Id => "_id",
        }
    }
}

/// Predicate, sort and page of one tracking query.
///
/// Always holds valid values: `page >= 1` and `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingFilter {
    page: u64,
    limit: u64,
    sort_by: SortField,
    sort_order: SortOrder,
    vehicle_id: Option<ObjectId>,
    location: Option<String>,
    mileage: Option<f64>,
    status: Option<VehicleStatus>,
    fuel_condition: Option<FuelCondition>,
}

impl Default for TrackingFilter {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            vehicle_id: None,
            location: None,
            mileage: None,
            status: None,
            fuel_condition: None,
        }
    }
}

impl TrackingFilter {
    /// Builds a filter from `(key, value)` query pairs.
    ///
    /// Only the first value of a repeated key is used, unknown keys are
    /// ignored and empty values count as absent. `page=0` and `limit=0` take
    /// the defaults. `limit` above [`MAX_LIMIT`] is clamped. A page whose
    /// offset exceeds [`MAX_SKIP`] is rejected.
    pub fn from_params<'a, I>(params: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filter = Self::default();
        let mut seen: Vec<&str> = Vec::new();

        for (key, value) in params {
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            if value.is_empty() {
                continue;
            }

            match key {
                "page" => {
                    let page = parse_count("page", value)?;
                    if page > 0 {
                        filter.page = page;
                    }
                }
                "limit" => {
                    let limit = parse_count("limit", value)?;
                    if limit > 0 {
                        filter.limit = limit.min(MAX_LIMIT);
                    }
                }
                "sort_by" => {
                    filter.sort_by = SortField::from_str(value)
                        .map_err(|_| FilterError::InvalidSortField(value.to_string()))?;
                }
                "sort_order" => filter.sort_order = value.parse()?,
                "vehicle_id" => {
                    let id = ObjectId::parse_str(value)
                        .map_err(|_| FilterError::InvalidVehicleId(value.to_string()))?;
                    filter.vehicle_id = Some(id);
                }
                "location" => filter.location = Some(value.to_string()),
                "mileage" => {
                    let mileage = value
                        .parse::<f64>()
                        .ok()
                        .filter(|m| m.is_finite())
                        .ok_or_else(|| FilterError::InvalidMileage(value.to_string()))?;
                    filter.mileage = Some(mileage);
                }
                "status" => {
                    let status = VehicleStatus::from_str(value)
                        .map_err(|_| FilterError::InvalidStatus(value.to_string()))?;
                    filter.status = Some(status);
                }
                "fuel_condition" => {
                    let fuel = FuelCondition::from_str(value)
                        .map_err(|_| FilterError::InvalidFuelCondition(value.to_string()))?;
                    filter.fuel_condition = Some(fuel);
                }
                _ => {}
            }
        }

        if filter.offset().is_none_or(|skip| skip > MAX_SKIP) {
            return Err(FilterError::PageOutOfRange {
                page: filter.page,
                limit: filter.limit,
            });
        }

        Ok(filter)
    }

    /// Pages past the last representable offset are pulled back to it.
    pub fn with_page(mut self, page: u64, limit: u64) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self.page = page.clamp(1, MAX_SKIP / self.limit + 1);
        self
    }

    pub fn with_sort(mut self, sort_by: SortField, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of documents before the requested page, at most [`MAX_SKIP`]
    pub fn skip(&self) -> u64 {
        self.offset().map_or(MAX_SKIP, |skip| skip.min(MAX_SKIP))
    }

    fn offset(&self) -> Option<u64> {
        (self.page - 1).checked_mul(self.limit)
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn vehicle_id(&self) -> Option<ObjectId> {
        self.vehicle_id
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn mileage(&self) -> Option<f64> {
        self.mileage
    }

    pub fn status(&self) -> Option<VehicleStatus> {
        self.status
    }

    pub fn fuel_condition(&self) -> Option<FuelCondition> {
        self.fuel_condition
    }
}

fn parse_count(key: &'static str, value: &str) -> Result<u64, FilterError> {
    let n = value.parse::<i64>().map_err(|_| FilterError::InvalidNumber {
        key,
        value: value.to_string(),
    })?;
    u64::try_from(n).map_err(|_| FilterError::Negative { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(pairs: &[(&str, &str)]) -> Result<TrackingFilter, FilterError> {
        TrackingFilter::from_params(pairs.iter().copied())
    }

    #[test]
    fn no_params_uses_defaults() {
        let filter = build(&[]).unwrap();
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), 10);
        assert_eq!(filter.skip(), 0);
        assert_eq!(filter.sort_by(), SortField::CreatedAt);
        assert_eq!(filter.sort_order(), SortOrder::Asc);
        assert_eq!(filter, TrackingFilter::default());
    }

    #[test]
    fn page_and_limit_are_parsed() {
        let filter = build(&[("page", "2"), ("limit", "5")]).unwrap();
        assert_eq!(filter.page(), 2);
        assert_eq!(filter.limit(), 5);
        assert_eq!(filter.skip(), 5);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(build(&[("limit", "500")]).unwrap().limit(), MAX_LIMIT);
    }

    #[test]
    fn zero_takes_defaults() {
        let filter = build(&[("page", "0"), ("limit", "0")]).unwrap();
        assert_eq!(filter.page(), DEFAULT_PAGE);
        assert_eq!(filter.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn negative_and_non_numeric_counts_are_rejected() {
        assert_eq!(
            build(&[("page", "-1")]).unwrap_err(),
            FilterError::Negative { key: "page" }
        );
        assert!(matches!(
            build(&[("limit", "ten")]).unwrap_err(),
            FilterError::InvalidNumber { key: "limit", .. }
        ));
    }

    #[test]
    fn first_value_wins() {
        let filter = build(&[("limit", "3"), ("limit", "7"), ("status", "sold"), ("status", "x")])
            .unwrap();
        assert_eq!(filter.limit(), 3);
        assert_eq!(filter.status(), Some(VehicleStatus::Sold));
    }

    #[test]
    fn unknown_keys_and_empty_values_are_ignored() {
        let filter = build(&[("color", "red"), ("status", ""), ("location", "")]).unwrap();
        assert_eq!(filter, TrackingFilter::default());
    }

    #[test]
    fn bad_status_is_rejected() {
        assert_eq!(
            build(&[("status", "bogus")]).unwrap_err(),
            FilterError::InvalidStatus("bogus".into())
        );
        assert!(build(&[("fuel_condition", "overflowing")]).is_err());
    }

    #[test]
    fn bad_vehicle_id_is_rejected() {
        assert_eq!(
            build(&[("vehicle_id", "not-a-valid-id")]).unwrap_err(),
            FilterError::InvalidVehicleId("not-a-valid-id".into())
        );
    }

    #[test]
    fn predicate_fields_are_typed() {
        let filter = build(&[
            ("vehicle_id", "65a1f0c2e4b0a1b2c3d4e5f6"),
            ("location", "Yan"),
            ("mileage", "1500.5"),
            ("fuel_condition", "low"),
        ])
        .unwrap();

        assert_eq!(
            filter.vehicle_id().map(|id| id.to_hex()).as_deref(),
            Some("65a1f0c2e4b0a1b2c3d4e5f6")
        );
        assert_eq!(filter.location(), Some("Yan"));
        assert_eq!(filter.mileage(), Some(1500.5));
        assert_eq!(filter.fuel_condition(), Some(FuelCondition::Low));
    }

    #[test]
    fn mileage_must_be_finite() {
        for value in ["NaN", "inf", "-inf", "lots"] {
            assert_eq!(
                build(&[("mileage", value)]).unwrap_err(),
                FilterError::InvalidMileage(value.into())
            );
        }
    }

    #[test]
    fn sort_is_allow_listed() {
        let filter = build(&[("sort_by", "mileage"), ("sort_order", "DESC")]).unwrap();
        assert_eq!(filter.sort_by(), SortField::Mileage);
        assert_eq!(filter.sort_order(), SortOrder::Desc);
        assert_eq!(filter.sort_order().direction(), -1);

        assert_eq!(build(&[("sort_by", "id")]).unwrap().sort_by(), SortField::Id);
        assert_eq!(SortField::Id.field_name(), "_id");

        assert_eq!(
            build(&[("sort_by", "password")]).unwrap_err(),
            FilterError::InvalidSortField("password".into())
        );
        assert!(build(&[("sort_order", "sideways")]).is_err());
    }

    #[test]
    fn page_beyond_the_largest_offset_is_rejected() {
        let page = i64::MAX.to_string();
        assert_eq!(
            build(&[("page", page.as_str()), ("limit", "100")]).unwrap_err(),
            FilterError::PageOutOfRange {
                page: i64::MAX as u64,
                limit: 100
            }
        );

        let last = (MAX_SKIP / 100 + 1).to_string();
        let filter = build(&[("page", last.as_str()), ("limit", "100")]).unwrap();
        assert!(filter.skip() <= MAX_SKIP);
    }

    #[test]
    fn huge_page_with_default_limit_still_fits() {
        let page = (MAX_SKIP / DEFAULT_LIMIT + 2).to_string();
        assert!(matches!(
            build(&[("page", page.as_str())]).unwrap_err(),
            FilterError::PageOutOfRange { .. }
        ));
    }

    #[test]
    fn with_page_clamps_to_the_largest_offset() {
        let filter = TrackingFilter::default().with_page(u64::MAX, 100);
        assert_eq!(filter.page(), MAX_SKIP / 100 + 1);
        assert!(filter.skip() <= MAX_SKIP);
    }
}
