//! End-to-end ingestion and query behavior against the in-memory table.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, TimeDelta, Utc};
use sensorgrid_core::*;

fn test_service() -> SensorService<MemoryTable> {
    SensorService::new(MemoryTable::new("SensorData"))
}

fn payload(id: i64, name: &str, temperature: f64, humidity: i32) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": id,
        "name": name,
        "temperature": temperature,
        "humidity": humidity,
    }))
    .unwrap()
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[test]
fn append_ingestion_keeps_one_entity_per_call_in_time_order() {
    let svc = test_service();
    let base = now() - TimeDelta::minutes(30);

    for i in 0..20 {
        let at = base + TimeDelta::seconds(i);
        svc.ingest_at(&payload(i, "greenhouse", 20.0, 50), KeyPolicy::Append, at)
            .unwrap();
    }

    let series = svc.time_series("greenhouse", "day").unwrap();
    assert_eq!(series.len(), 20);
    assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn append_ingestion_of_identical_readings_keeps_history() {
    let svc = test_service();
    let at = now();
    for _ in 0..3 {
        let ack = svc
            .ingest_at(&payload(7, "greenhouse", 20.0, 50), KeyPolicy::Append, at)
            .unwrap();
        assert_eq!(ack.outcome, WriteOutcome::Created);
    }
    assert_eq!(svc.table().partition_len("greenhouse"), 3);
}

#[test]
fn upsert_with_same_id_keeps_latest_values() {
    let svc = test_service();
    let at = now() - TimeDelta::minutes(10);

    let first = svc
        .ingest_at(&payload(5, "attic", 10.0, 30), KeyPolicy::Upsert, at)
        .unwrap();
    let second = svc
        .ingest_at(
            &payload(5, "attic", 25.0, 70),
            KeyPolicy::Upsert,
            at + TimeDelta::minutes(1),
        )
        .unwrap();

    assert_eq!(first.outcome, WriteOutcome::Created);
    assert_eq!(second.outcome, WriteOutcome::Replaced);
    assert_eq!(first.row_key, "5");
    assert_eq!(second.row_key, "5");

    let series = svc.time_series("attic", "hour").unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].temperature, 25.0);
    assert_eq!(series[0].humidity, 70);
}

#[test]
fn upsert_same_id_in_different_sensors_is_independent() {
    let svc = test_service();
    svc.ingest(&payload(1, "a", 10.0, 10), KeyPolicy::Upsert).unwrap();
    svc.ingest(&payload(1, "b", 20.0, 20), KeyPolicy::Upsert).unwrap();
    assert_eq!(svc.table().partition_len("a"), 1);
    assert_eq!(svc.table().partition_len("b"), 1);
}

#[test]
fn averages_over_empty_window_are_null() {
    let svc = test_service();
    let averages = svc.averages("nobody").unwrap();
    assert_eq!(averages.sensor_name, "nobody");
    assert_eq!(averages.avg_last_hour, WindowAverage::default());
    assert_eq!(averages.avg_last_day, WindowAverage::default());

    let json = serde_json::to_value(&averages).unwrap();
    assert!(json["avgLastHour"]["temperature"].is_null());
    assert!(json["avgLastDay"]["humidity"].is_null());
}

#[test]
fn averages_of_two_readings() {
    let svc = test_service();
    let t = now();
    svc.ingest_at(&payload(1, "s", 10.0, 40), KeyPolicy::Append, t - TimeDelta::minutes(2))
        .unwrap();
    svc.ingest_at(&payload(2, "s", 20.0, 60), KeyPolicy::Append, t - TimeDelta::minutes(1))
        .unwrap();

    let averages = svc.averages_at("s", t).unwrap();
    assert_eq!(averages.avg_last_hour.temperature, Some(15.0));
    assert_eq!(averages.avg_last_hour.humidity, Some(50.0));
    assert_eq!(averages.avg_last_day, averages.avg_last_hour);
}

#[test]
fn hour_and_day_windows_differ() {
    let svc = test_service();
    let t = now();
    svc.ingest_at(&payload(1, "s", 10.0, 20), KeyPolicy::Append, t - TimeDelta::hours(3))
        .unwrap();
    svc.ingest_at(&payload(2, "s", 30.0, 60), KeyPolicy::Append, t - TimeDelta::minutes(15))
        .unwrap();
    svc.ingest_at(&payload(3, "s", 99.0, 99), KeyPolicy::Append, t - TimeDelta::days(2))
        .unwrap();

    let averages = svc.averages_at("s", t).unwrap();
    assert_eq!(averages.avg_last_hour.temperature, Some(30.0));
    assert_eq!(averages.avg_last_day.temperature, Some(20.0));
    assert_eq!(averages.avg_last_day.humidity, Some(40.0));
}

#[test]
fn hour_series_excludes_two_hour_old_reading() {
    let svc = test_service();
    let t = now();
    svc.ingest_at(&payload(1, "s", 1.0, 1), KeyPolicy::Append, t - TimeDelta::hours(2))
        .unwrap();
    svc.ingest_at(&payload(2, "s", 2.0, 2), KeyPolicy::Append, t - TimeDelta::minutes(30))
        .unwrap();

    let hour = svc.time_series_at("s", "hour", t).unwrap();
    assert_eq!(hour.len(), 1);
    assert_eq!(hour[0].temperature, 2.0);

    let day = svc.time_series_at("s", "DAY", t).unwrap();
    assert_eq!(day.len(), 2);
}

#[test]
fn series_is_sorted_regardless_of_ingestion_order() {
    let svc = test_service();
    let t = now() - TimeDelta::minutes(20);

    // Upsert keys are ids, so storage order follows id, not time.
    svc.ingest_at(&payload(1, "s", 10.0, 10), KeyPolicy::Upsert, t + TimeDelta::seconds(10))
        .unwrap();
    svc.ingest_at(&payload(2, "s", 5.0, 5), KeyPolicy::Upsert, t + TimeDelta::seconds(5))
        .unwrap();

    let series = svc.time_series("s", "hour").unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].timestamp, t + TimeDelta::seconds(5));
    assert_eq!(series[1].timestamp, t + TimeDelta::seconds(10));
}

#[test]
fn malformed_payload_is_rejected_and_not_stored() {
    let svc = test_service();
    let err = svc
        .ingest(br#"{"id": 1, "temperature": 21.0, "humidity": 40}"#, KeyPolicy::Append)
        .unwrap_err();
    assert!(matches!(err, SensorError::InvalidPayload(_)));
    assert!(err.is_client_error());
    assert!(!svc.table().exists());
}

#[test]
fn lenient_payload_is_stored_with_zero_defaults() {
    let svc = test_service();
    svc.ingest(br#"{"Name": "bare"}"#, KeyPolicy::Append).unwrap();
    let series = svc.time_series("bare", "hour").unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].temperature, 0.0);
    assert_eq!(series[0].humidity, 0);

    let averages = svc.averages("bare").unwrap();
    assert_eq!(averages.avg_last_hour.temperature, Some(0.0));
}

#[test]
fn concurrent_append_writers_never_collide() {
    let table = Arc::new(MemoryTable::new("SensorData"));
    let at = now();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let svc = SensorService::new(Arc::clone(&table));
            thread::spawn(move || {
                for i in 0..50 {
                    svc.ingest_at(
                        &payload(worker * 100 + i, "shared", 20.0, 50),
                        KeyPolicy::Append,
                        at,
                    )
                    .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.partition_len("shared"), 400);
    let svc = SensorService::new(table);
    assert_eq!(svc.time_series("shared", "hour").unwrap().len(), 400);
}
