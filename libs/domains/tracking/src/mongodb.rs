//! MongoDB implementation of TrackingRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{FindOptions, IndexOptions},
};
use tracing::instrument;

use crate::error::TrackingResult;
use crate::filter::TrackingFilter;
use crate::models::{NewTrackingEvent, TrackingEvent};
use crate::repository::TrackingRepository;

pub const COLLECTION: &str = "tracking";

/// MongoDB implementation of the TrackingRepository
#[derive(Clone)]
pub struct MongoTrackingRepository {
    collection: Collection<TrackingEvent>,
}

impl MongoTrackingRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<TrackingEvent>(collection_name),
        }
    }

    /// Creates the per-vehicle and recency indexes. Safe to call on every start.
    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    pub async fn ensure_indexes(&self) -> TrackingResult<()> {
        let indexes = [
            IndexModel::builder()
                .keys(doc! { "vehicle_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("vehicle_id_created_at".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(IndexOptions::builder().name("created_at".to_string()).build())
                .build(),
        ];

        let result = self.collection.create_indexes(indexes).await?;
        tracing::info!(indexes = ?result.index_names, "Tracking indexes ready");
        Ok(())
    }

    /// Conjunction of the predicates present in `filter`.
    fn build_filter(filter: &TrackingFilter) -> Document {
        let mut doc = doc! {};

        if let Some(vehicle_id) = filter.vehicle_id() {
            doc.insert("vehicle_id", vehicle_id);
        }

        if let Some(location) = filter.location() {
            doc.insert(
                "location",
                doc! { "$regex": format!("^{}", regex::escape(location)), "$options": "i" },
            );
        }

        if let Some(mileage) = filter.mileage() {
            doc.insert("mileage", doc! { "$gte": mileage });
        }

        if let Some(status) = filter.status() {
            doc.insert("status", status.to_string());
        }

        if let Some(fuel) = filter.fuel_condition() {
            doc.insert("fuel_condition", fuel.to_string());
        }

        doc
    }

    /// Sort, skip and limit. `_id` breaks ties so pages never overlap.
    fn find_options(filter: &TrackingFilter) -> FindOptions {
        let field = filter.sort_by().field_name();
        let direction = filter.sort_order().direction();

        let mut sort = Document::new();
        sort.insert(field, direction);
        if field != "_id" {
            sort.insert("_id", direction);
        }

        FindOptions::builder()
            .sort(sort)
            .skip(filter.skip())
            .limit(filter.limit() as i64)
            .build()
    }
}

#[async_trait]
impl TrackingRepository for MongoTrackingRepository {
    #[instrument(skip(self, event), fields(vehicle_id = %event.vehicle_id))]
    async fn create(&self, event: NewTrackingEvent) -> TrackingResult<TrackingEvent> {
        let mut record = TrackingEvent::new(event);

        let result = self.collection.insert_one(&record).await?;
        record.id = result.inserted_id.as_object_id();

        tracing::debug!(id = ?record.id, "Tracking event stored");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: TrackingFilter) -> TrackingResult<Vec<TrackingEvent>> {
        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(Self::find_options(&filter))
            .await?;

        let events: Vec<TrackingEvent> = cursor.try_collect().await?;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{SortField, SortOrder};
    use mongodb::bson::oid::ObjectId;

    fn filter(pairs: &[(&str, &str)]) -> TrackingFilter {
        TrackingFilter::from_params(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(MongoTrackingRepository::build_filter(&TrackingFilter::default()).is_empty());
    }

    #[test]
    fn vehicle_id_is_matched_as_object_id() {
        let doc = MongoTrackingRepository::build_filter(&filter(&[(
            "vehicle_id",
            "65a1f0c2e4b0a1b2c3d4e5f6",
        )]));
        assert_eq!(
            doc.get_object_id("vehicle_id").unwrap(),
            ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap()
        );
    }

    #[test]
    fn location_is_an_escaped_case_insensitive_prefix() {
        let doc = MongoTrackingRepository::build_filter(&filter(&[("location", "St. (North)")]));
        let location = doc.get_document("location").unwrap();
        assert_eq!(location.get_str("$regex").unwrap(), r"^St\. \(North\)");
        assert_eq!(location.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn mileage_is_a_lower_bound_and_enums_use_names() {
        let doc = MongoTrackingRepository::build_filter(&filter(&[
            ("mileage", "250"),
            ("status", "repair"),
            ("fuel_condition", "empty"),
        ]));
        assert_eq!(
            doc.get_document("mileage").unwrap().get_f64("$gte").unwrap(),
            250.0
        );
        assert_eq!(doc.get_str("status").unwrap(), "repair");
        assert_eq!(doc.get_str("fuel_condition").unwrap(), "empty");
    }

    #[test]
    fn options_follow_sort_and_page() {
        let filter = TrackingFilter::default()
            .with_page(3, 20)
            .with_sort(SortField::Mileage, SortOrder::Desc);
        let options = MongoTrackingRepository::find_options(&filter);

        assert_eq!(options.sort, Some(doc! { "mileage": -1, "_id": -1 }));
        assert_eq!(options.skip, Some(40));
        assert_eq!(options.limit, Some(20));
    }

    #[test]
    fn skip_is_always_encodable() {
        let filter = TrackingFilter::default().with_page(u64::MAX, 100);
        let options = MongoTrackingRepository::find_options(&filter);
        let skip = options.skip.unwrap();
        assert!(i64::try_from(skip).is_ok());
    }

    #[test]
    fn id_sort_has_no_tiebreak() {
        let filter = TrackingFilter::default().with_sort(SortField::Id, SortOrder::Asc);
        let options = MongoTrackingRepository::find_options(&filter);
        assert_eq!(options.sort, Some(doc! { "_id": 1 }));
        assert_eq!(options.skip, Some(0));
        assert_eq!(options.limit, Some(10));
    }
}
