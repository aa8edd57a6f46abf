use anyhow::Result;
use chrono::NaiveDate;
use etfdash::export::{csv_document, export_filename, export_to_csv, BOM};
use etfdash::models::FundRecord;
use tempfile::TempDir;

fn records() -> Vec<FundRecord> {
    vec![
        FundRecord {
            fund_name: "Золото".to_string(),
            management_co: "Первая".to_string(),
            asset_class: "Драгметаллы".to_string(),
            ter_percent: Some(0.0),
            nav_million_rub: Some(320.0),
            ..FundRecord::new("SBGD")
        },
        FundRecord {
            fund_name: "Облигации, \"длинные\"".to_string(),
            asset_class: "Облигации".to_string(),
            ..FundRecord::new("OBLG")
        },
    ]
}

#[test]
fn document_has_header_and_one_line_per_record() {
    let doc = csv_document(&records());
    assert!(doc.starts_with(BOM));
    assert!(!doc.ends_with('\n'));

    let lines: Vec<&str> = doc.trim_start_matches(BOM).split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Тикер,Название,УК"));
    assert_eq!(lines[1], "SBGD,\"Золото\",\"Первая\",\"Драгметаллы\",0,320,,");
    assert_eq!(
        lines[2],
        "OBLG,\"Облигации, \"\"длинные\"\"\",\"\",\"Облигации\",,,,"
    );
}

#[test]
fn empty_view_exports_header_only() -> Result<()> {
    let dir = TempDir::new()?;
    let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

    let path = export_to_csv(&[], "funds", dir.path(), date)?;
    assert_eq!(path, dir.path().join("funds_2024-12-31.csv"));

    let content = std::fs::read_to_string(&path)?;
    assert_eq!(content.trim_start_matches(BOM).lines().count(), 1);

    Ok(())
}

#[test]
fn export_creates_missing_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let nested = dir.path().join("a").join("b");
    let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    let path = export_to_csv(&records(), "etf_data", &nested, date)?;
    assert!(path.exists());
    assert_eq!(export_filename("etf_data", date), "etf_data_2025-03-01.csv");

    Ok(())
}
