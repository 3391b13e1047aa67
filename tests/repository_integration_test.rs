// ==========================================
// SqliteRecordSink 集成测试
// ==========================================


use chrono::{NaiveDate, NaiveDateTime};
use scrape_import::domain::CanonicalRecord;
use scrape_import::repository::{RecordSink, SqliteRecordSink};
use test_helpers::{count_records, create_test_db, install_failing_title_trigger};

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn record(campaign_id: i64, product_id: &str, title: &str) -> CanonicalRecord {
    let mut record = CanonicalRecord::new(
        campaign_id,
        1,
        at("2024-03-01 15:45:10"),
        "shoes",
        product_id,
        title,
        format!("https://shop.example/{}", product_id),
    );
    record.price = Some(19.99);
    record.is_carousel = Some(true);
    record
}

#[tokio::test]
async fn test_insert_all_rolls_back_on_failure() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    install_failing_title_trigger(&db_path, "BAD");
    let sink = SqliteRecordSink::new(&db_path).unwrap();

    let batch = vec![record(1, "P1", "Good"), record(1, "P2", "BAD"), record(1, "P3", "Good too")];
    let result = sink.insert_all(&batch).await;

    assert!(result.is_err());
    assert_eq!(count_records(&db_path, 1), 0);

    // 连接在回滚后仍可用
    let ids = sink.insert_all(&batch[..1]).await.unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(count_records(&db_path, 1), 1);
}

#[tokio::test]
async fn test_count_existing_scoped_to_campaign() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let sink = SqliteRecordSink::new(&db_path).unwrap();

    sink.insert_all(&[record(1, "P1", "A"), record(1, "P2", "B"), record(2, "P3", "C")])
        .await
        .unwrap();

    assert_eq!(sink.count_existing(1).await.unwrap(), 2);
    assert_eq!(sink.count_existing(2).await.unwrap(), 1);
    assert_eq!(sink.count_existing(3).await.unwrap(), 0);
}

#[tokio::test]
async fn test_fetch_existing_filters_and_truncates_date() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let sink = SqliteRecordSink::new(&db_path).unwrap();

    let mut other_keyword = record(1, "P9", "Hat");
    other_keyword.keyword = "hats".to_string();
    sink.insert_all(&[record(1, "P1", "A"), record(2, "P2", "B"), other_keyword])
        .await
        .unwrap();

    let existing = sink
        .fetch_existing(&[1], &[1], &["shoes".to_string()])
        .await
        .unwrap();

    assert_eq!(existing.len(), 1);
    assert_eq!(existing[0].product_id, "P1");
    assert_eq!(existing[0].scrape_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

    // 截断后的日期与新记录的身份键一致
    let fresh = record(1, "P1", "A");
    assert_eq!(existing[0].identity_keys(), fresh.identity_keys());
}

#[tokio::test]
async fn test_optional_fields_round_trip() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let sink = SqliteRecordSink::new(&db_path).unwrap();
    sink.insert(&record(1, "P1", "A")).await.unwrap();

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let (price, is_carousel, rating): (Option<f64>, Option<bool>, Option<f64>) = conn
        .query_row(
            "SELECT price, is_carousel, rating FROM scrape_data WHERE product_id = 'P1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();

    assert_eq!(price, Some(19.99));
    assert_eq!(is_carousel, Some(true));
    assert_eq!(rating, None);
}
