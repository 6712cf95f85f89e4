use assert_cmd::{cargo_bin, prelude::*};
use gtfs_mend::test_utils::get_file_content;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_correct_feed_with_config_and_report() {
    let output_dir = TempDir::new().expect("create temp dir failed");
    let zip_path = output_dir.path().join("corrected.zip");
    let report_path = output_dir.path().join("report.json");
    Command::new(cargo_bin!("correct-gtfs"))
        .arg("--input")
        .arg("../tests/fixtures/correct/input")
        .arg("--output")
        .arg(zip_path.to_str().unwrap())
        .arg("--config")
        .arg("../tests/fixtures/correct/config.json")
        .arg("--report")
        .arg(report_path.to_str().unwrap())
        .arg("--current-datetime")
        .arg("2024-06-01T10:30:00")
        .assert()
        .success();

    let extracted = TempDir::new().expect("create temp dir failed");
    gtfs_mend::utils::unzip_to(&zip_path, extracted.path()).unwrap();

    assert_eq!(
        "agency_id,agency_name,agency_url,agency_timezone\n\
         BCT,Broward County Transit,http://www.broward.org/bct,America/New_York\n",
        get_file_content(extracted.path().join("agency.txt"))
    );
    assert_eq!(
        "route_id,agency_id,route_short_name,route_long_name,route_type\n\
         R1,BCT,1,University Breeze,3\n",
        get_file_content(extracted.path().join("routes.txt"))
    );
    assert_eq!(
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence,shape_dist_traveled\n\
         T1,08:00:00,08:00:00,S1,1,0.5\n\
         T1,08:10:00,08:10:00,S2,2,0.500696\n",
        get_file_content(extracted.path().join("stop_times.txt"))
    );
    assert_eq!(
        "feed_publisher_name,feed_publisher_url,feed_lang,feed_start_date,feed_end_date,feed_version,feed_contact_email,feed_contact_url\n\
         Broward County Transit,http://www.broward.org/bct,en,20240101,20241231,S20240101_E20241231_TS20240601103000,gtfs@example.com,https://example.com\n",
        get_file_content(extracted.path().join("feed_info.txt"))
    );

    let report: serde_json::Value =
        serde_json::from_str(&get_file_content(&report_path)).unwrap();
    let messages: Vec<&str> = report["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|warning| warning["message"].as_str().unwrap())
        .collect();
    assert!(messages.contains(&"Removed columns from routes.txt: avl_route_key"));
    assert!(messages
        .iter()
        .any(|m| m.starts_with("Generated agency_id BCT")));
}

#[test]
fn test_correct_feed_with_exception_rules() {
    let output_dir = TempDir::new().expect("create temp dir failed");
    let zip_path = output_dir.path().join("corrected.zip");
    Command::new(cargo_bin!("correct-gtfs"))
        .arg("--input")
        .arg("../tests/fixtures/correct/input")
        .arg("--output")
        .arg(zip_path.to_str().unwrap())
        .arg("--rules")
        .arg("../tests/fixtures/correct/rules.csv")
        .arg("--current-datetime")
        .arg("2024-06-01T10:30:00")
        .assert()
        .success();

    let extracted = TempDir::new().expect("create temp dir failed");
    gtfs_mend::utils::unzip_to(&zip_path, extracted.path()).unwrap();
    assert_eq!(
        "service_id,date,exception_type\nWEEK,20240704,2\n",
        get_file_content(extracted.path().join("calendar_dates.txt"))
    );
}

#[test]
fn test_correct_fails_on_missing_input() {
    let output_dir = TempDir::new().expect("create temp dir failed");
    Command::new(cargo_bin!("correct-gtfs"))
        .arg("--input")
        .arg("../tests/fixtures/correct/no-such-input")
        .arg("--output")
        .arg(output_dir.path().join("corrected.zip").to_str().unwrap())
        .assert()
        .failure();
}
