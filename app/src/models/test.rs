//! Runs against the database behind `DATABASE_URL`, use a disposable one:
//! `cargo test -- --ignored`

use agro_core::{parse_batch, DevEui, MetricSet, RadioMeta};
use chrono::{Duration, TimeZone, Utc};

use super::*;
use crate::ingest::ports::{
    AssignmentRepository, MeasurementRepository, NewMeasurement, Sensor, SensorRepository,
};

async fn connect() -> sqlx::PgPool {
    dotenv::dotenv().ok();
    let url = std::env::var("DATABASE_URL").unwrap();
    let conn = establish_db_connection(&url, 2).await.unwrap();
    run_migrations(&conn).await.unwrap();
    conn
}

// unique per run so reruns don't collide on UNIQUE columns
fn unique_suffix() -> String {
    format!("{:08X}", Utc::now().timestamp_subsec_nanos())
}

#[test]
fn unknown_status_reads_as_offline() {
    let dao = sensor::SensorDao {
        id: 3,
        code: "cap3".to_owned(),
        dev_eui: "cafebabed27c8b46".to_owned(),
        status: "maintenance".to_owned(),
        last_seen: None,
        battery_level: Some(80),
        signal_quality: None,
    };

    let sensor = Sensor::try_from(dao).unwrap();
    assert!(!sensor.online);
    assert_eq!("CAFEBABED27C8B46", sensor.dev_eui.as_str());
    assert_eq!(Some(80), sensor.battery_level);
}

#[test]
fn invalid_dev_eui_row_is_rejected() {
    let dao = sensor::SensorDao {
        id: 4,
        code: "cap4".to_owned(),
        dev_eui: "not-an-eui".to_owned(),
        status: "online".to_owned(),
        last_seen: None,
        battery_level: None,
        signal_quality: None,
    };
    assert!(matches!(Sensor::try_from(dao), Err(DBError::InvalidRow(_))));
}

#[tokio::test]
#[ignore]
async fn test_db_connection() {
    let conn = connect().await;
    assert!(check_schema(&conn).await.unwrap() >= 0);
}

#[tokio::test]
#[ignore]
async fn crud_sensors() {
    let conn = connect().await;
    let suffix = unique_suffix();
    let dev_eui = DevEui::normalize(&format!("A1B2C3D4{}", suffix)).unwrap();

    // create
    let dao = sensor::insert(&conn, &format!("cap-{}", suffix), &dev_eui)
        .await
        .unwrap();
    assert!(!dao.is_online());

    // read
    let found = sensor::get_by_dev_eui(&conn, &dev_eui).await.unwrap().unwrap();
    assert_eq!(dao.id(), found.id());
    assert_eq!(dao.code(), found.code());

    // update
    let seen_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    sensor::mark_seen(&conn, dao.id(), seen_at, &RadioMeta::default())
        .await
        .unwrap();
    let updated = sensor::get(&conn, dao.id()).await.unwrap().unwrap();
    assert!(updated.is_online());
    assert_eq!(Some(seen_at.naive_utc()), updated.last_seen);

    // delete
    sensor::delete(&conn, dao.id()).await.unwrap();
    assert!(sensor::get(&conn, dao.id()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn lowercase_dev_eui_row_is_found() {
    let conn = connect().await;
    let suffix = unique_suffix();
    let dev_eui = DevEui::normalize(&format!("ABCDEF01{}", suffix)).unwrap();
    sql_stmnt!(
        "INSERT INTO sensors (code, dev_eui) VALUES ($1, $2)",
        format!("cap-{}", suffix),
        dev_eui.as_str().to_lowercase()
    )
    .execute(&conn)
    .await
    .unwrap();

    let store = PgStore::new(conn.clone());
    let found = store.find_by_dev_eui(&dev_eui).await.unwrap().unwrap();
    assert_eq!(dev_eui, found.dev_eui);

    sensor::delete(&conn, found.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn covering_assignment_is_right_open() {
    let conn = connect().await;
    let suffix = unique_suffix();
    let dev_eui = DevEui::normalize(&format!("B1B2C3D4{}", suffix)).unwrap();
    let sensor = sensor::insert(&conn, &format!("cap-{}", suffix), &dev_eui)
        .await
        .unwrap();
    let plot = plot::insert(&conn, &format!("plot-{}", suffix), Some(1.5))
        .await
        .unwrap();
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    assignment::insert(&conn, sensor.id(), plot.id(), start, Some(end))
        .await
        .unwrap();

    let store = PgStore::new(conn.clone());
    let at_start = store.find_covering(sensor.id(), start).await.unwrap();
    let at_end = store.find_covering(sensor.id(), end).await.unwrap();
    assert_eq!(Some(plot.id()), at_start.map(|a| a.plot_id));
    assert!(at_end.is_none());
    assert_eq!(
        1,
        assignment::get_history(&conn, sensor.id()).await.unwrap().len()
    );

    sensor::delete(&conn, sensor.id()).await.unwrap();
    plot::delete(&conn, plot.id()).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn record_measurement_marks_sensor_seen() {
    let conn = connect().await;
    let suffix = unique_suffix();
    let dev_eui = DevEui::normalize(&format!("C1B2C3D4{}", suffix)).unwrap();
    let sensor = sensor::insert(&conn, &format!("cap-{}", suffix), &dev_eui)
        .await
        .unwrap();
    let plot = plot::insert(&conn, &format!("plot-{}", suffix), None)
        .await
        .unwrap();
    let timestamp = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
    let batch = parse_batch("d:4500 s:cap1;1 p:1,d:2150 s:cap1;2 p:1");
    let new = NewMeasurement {
        sensor_id: sensor.id(),
        plot_id: plot.id(),
        timestamp,
        received_at: timestamp + Duration::seconds(3),
        metrics: MetricSet::aggregate(&batch.segments),
        radio: RadioMeta {
            rssi: Some(-85),
            snr: Some(7.5),
            frequency: Some(868_100_000),
            battery_voltage: Some(3.75),
        },
    };

    // Execute
    let store = PgStore::new(conn.clone());
    let measurement_id = store.record(&new).await.unwrap();

    // Validate
    let rows = store
        .for_plot(plot.id(), timestamp - Duration::hours(1), timestamp)
        .await
        .unwrap();
    assert_eq!(1, rows.len());
    assert_eq!(measurement_id, rows[0].id);
    assert_eq!(Some(45.0), rows[0].humidity);
    assert_eq!(Some(21.5), rows[0].temperature);
    assert_eq!(None, rows[0].ph);
    assert_eq!(serde_json::json!(45.0), rows[0].raw["humidity"]);
    assert_eq!(Some(-85), rows[0].rssi);
    assert_eq!(Some(868_100_000), rows[0].frequency);
    let seen = store.find_by_dev_eui(&dev_eui).await.unwrap().unwrap();
    assert!(seen.online);
    assert_eq!(Some(new.received_at), seen.last_seen);
    assert_eq!(Some(62), seen.battery_level);
    assert_eq!(Some(50), seen.signal_quality);
    assert_eq!(
        1,
        measurement::count_for_sensor(&conn, sensor.id()).await.unwrap()
    );

    sensor::delete(&conn, sensor.id()).await.unwrap();
    plot::delete(&conn, plot.id()).await.unwrap();
}
