//! Repository and service tests against a real MongoDB (testcontainers).
//!
//! Run with `cargo test -p domain_tracking -- --ignored`.

use domain_tracking::*;
use std::collections::HashSet;
use test_utils::{TestDataBuilder, TestMongo, assertions::*};

fn submission(vehicle_id: String, location: &str, mileage: f64) -> TrackingSubmission {
    TrackingSubmission {
        vehicle_id,
        location: location.to_string(),
        mileage,
        status: VehicleStatus::Active,
        fuel_condition: FuelCondition::Half,
    }
}

/// Ten events for one vehicle with mileage 100, 200, ... 1000, inserted out of order.
async fn seed(service: &TrackingService<MongoTrackingRepository>, vehicle_id: &str) {
    for step in [3, 7, 1, 10, 5, 2, 9, 4, 8, 6] {
        service
            .track(submission(vehicle_id.to_string(), "Yangon", step as f64 * 100.0))
            .await
            .unwrap();
    }
}

fn filter(pairs: &[(&str, &str)]) -> TrackingFilter {
    TrackingFilter::from_params(pairs.iter().copied()).unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_track_persists_one_record() {
    let mongo = TestMongo::new().await;
    let repo = MongoTrackingRepository::new(&mongo.database());
    repo.ensure_indexes().await.unwrap();
    let service = TrackingService::new(repo.clone());
    let builder = TestDataBuilder::from_test_name("track_persists");

    let vehicle_id = builder.object_id_hex(1);
    let event = service
        .track(submission(vehicle_id.clone(), "Mandalay", 1234.5))
        .await
        .unwrap();

    let id = assert_some(event.id, "stored event should have an id");
    assert_hex_id(&id.to_hex(), "event id");

    let found = service.find(TrackingFilter::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(id));
    assert_eq!(found[0].vehicle_id.to_hex(), vehicle_id);
    assert_eq!(found[0].location, "Mandalay");
    assert_eq!(found[0].mileage, 1234.5);
    assert_eq!(found[0].created_at, event.created_at);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_sort_ascending_and_descending() {
    let mongo = TestMongo::new().await;
    let service = TrackingService::new(MongoTrackingRepository::new(&mongo.database()));
    let builder = TestDataBuilder::from_test_name("sort");
    seed(&service, &builder.object_id_hex(1)).await;

    let asc = service
        .find(filter(&[("sort_by", "mileage"), ("sort_order", "asc")]))
        .await
        .unwrap();
    let asc: Vec<f64> = asc.iter().map(|e| e.mileage).collect();
    assert_eq!(asc, (1..=10).map(|i| i as f64 * 100.0).collect::<Vec<_>>());

    let desc = service
        .find(filter(&[("sort_by", "mileage"), ("sort_order", "desc")]))
        .await
        .unwrap();
    let desc: Vec<f64> = desc.iter().map(|e| e.mileage).collect();
    assert_eq!(desc, (1..=10).rev().map(|i| i as f64 * 100.0).collect::<Vec<_>>());

    let newest_first = service
        .find(filter(&[("sort_order", "desc")]))
        .await
        .unwrap();
    assert!(newest_first.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_pagination_covers_everything_once() {
    let mongo = TestMongo::new().await;
    let service = TrackingService::new(MongoTrackingRepository::new(&mongo.database()));
    let builder = TestDataBuilder::from_test_name("pagination");
    seed(&service, &builder.object_id_hex(1)).await;

    let first = service
        .query([("page", "1"), ("limit", "5")])
        .await
        .unwrap();
    let second = service
        .query([("page", "2"), ("limit", "5")])
        .await
        .unwrap();
    let third = service
        .query([("page", "3"), ("limit", "5")])
        .await
        .unwrap();

    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert!(third.is_empty());

    let ids: HashSet<_> = first.iter().chain(&second).filter_map(|e| e.id).collect();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_filters_by_vehicle_and_predicates() {
    let mongo = TestMongo::new().await;
    let service = TrackingService::new(MongoTrackingRepository::new(&mongo.database()));
    let builder = TestDataBuilder::from_test_name("vehicle_filter");

    let first = builder.object_id_hex(1);
    let second = builder.object_id_hex(2);
    seed(&service, &first).await;
    service
        .track(submission(second.clone(), "Bago", 50.0))
        .await
        .unwrap();
    service
        .track(submission(second.clone(), "bagan", 5000.0))
        .await
        .unwrap();

    let by_vehicle = service.query([("vehicle_id", second.as_str())]).await.unwrap();
    assert_eq!(by_vehicle.len(), 2);
    assert!(by_vehicle.iter().all(|e| e.vehicle_id.to_hex() == second));

    let by_prefix = service.query([("location", "BAG")]).await.unwrap();
    assert_eq!(by_prefix.len(), 2);

    let by_mileage = service
        .query([("vehicle_id", first.as_str()), ("mileage", "800")])
        .await
        .unwrap();
    assert_eq!(by_mileage.len(), 3);

    let none = service.query([("status", "sold")]).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_location_prefix_is_literal() {
    let mongo = TestMongo::new().await;
    let service = TrackingService::new(MongoTrackingRepository::new(&mongo.database()));
    let builder = TestDataBuilder::from_test_name("literal_prefix");

    service
        .track(submission(builder.object_id_hex(1), "Depot A", 10.0))
        .await
        .unwrap();

    assert!(service.query([("location", ".*")]).await.unwrap().is_empty());
    assert_eq!(service.query([("location", "depot")]).await.unwrap().len(), 1);
}

const CITIES: [&str; 10] = [
    "Bago", "Dawei", "Hpa-An", "Lashio", "Magway", "Mandalay", "Myitkyina", "Pathein", "Sittwe",
    "Yangon",
];

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_sort_by_location_both_directions() {
    let mongo = TestMongo::new().await;
    let service = TrackingService::new(MongoTrackingRepository::new(&mongo.database()));
    let builder = TestDataBuilder::from_test_name("sort_location");

    for i in [4, 9, 0, 7, 2, 5, 8, 1, 6, 3] {
        service
            .track(submission(builder.object_id_hex(i as u32), CITIES[i], 10.0))
            .await
            .unwrap();
    }

    let asc = service
        .query([("sort_by", "location"), ("sort_order", "asc")])
        .await
        .unwrap();
    let asc: Vec<&str> = asc.iter().map(|e| e.location.as_str()).collect();
    assert_eq!(asc, CITIES);

    let desc = service
        .query([("sort_by", "location"), ("sort_order", "desc")])
        .await
        .unwrap();
    let desc: Vec<&str> = desc.iter().map(|e| e.location.as_str()).collect();
    let mut expected = CITIES;
    expected.reverse();
    assert_eq!(desc, expected);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_five_pages_of_two_cover_every_record() {
    let mongo = TestMongo::new().await;
    let service = TrackingService::new(MongoTrackingRepository::new(&mongo.database()));
    let builder = TestDataBuilder::from_test_name("pages_of_two");
    seed(&service, &builder.object_id_hex(1)).await;

    let mut seen = HashSet::new();
    for page in 1..=5 {
        let page = page.to_string();
        let events = service
            .query([("page", page.as_str()), ("limit", "2")])
            .await
            .unwrap();
        assert_eq!(events.len(), 2, "page {page}");
        for event in events {
            let id = assert_some(event.id, "stored event should have an id");
            assert!(seen.insert(id), "page {page} repeats {id}");
        }
    }
    assert_eq!(seen.len(), 10);

    let past_end = service
        .query([("page", "6"), ("limit", "2")])
        .await
        .unwrap();
    assert!(past_end.is_empty());
}
