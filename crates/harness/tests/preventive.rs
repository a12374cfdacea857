use chrono::NaiveDate;
use vistoria_core::{BlobHash, ItemStatus, Photo, PhotoRef};
use vistoria_engine::EngineError;
use vistoria_harness::TestSite;
use vistoria_storage::Storage;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn jpeg(bytes: &[u8]) -> Photo {
    Photo::Inline {
        content_type: "image/jpeg".into(),
        bytes: bytes.to_vec(),
    }
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, &'static str> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or("bad date")
}

// ============================================================================
// Preventive maintenance
// ============================================================================

#[test]
fn record_stores_photo_and_logs_change() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;

    let record = site.engine.record_preventive(
        "MOTO - Entrada 01",
        date(2024, 7, 18)?,
        jpeg(b"jpeg bytes"),
    )?;

    assert_eq!(record.collaborator, "Ana (ana@estapar.com.br)");
    let expected = blake3::hash(b"jpeg bytes");
    let PhotoRef::Blob { hash, content_type } = &record.photo else {
        return Err("expected a stored blob".into());
    };
    assert_eq!(hash.as_bytes(), expected.as_bytes());
    assert_eq!(content_type, "image/jpeg");

    let blob = site
        .engine
        .storage()
        .photo(BlobHash::from_bytes(*expected.as_bytes()))?
        .ok_or("photo missing")?;
    assert_eq!(blob.bytes, b"jpeg bytes");

    let log = site.engine.change_log()?;
    assert_eq!(log[0].change, "Registered preventive maintenance for MOTO - Entrada 01.");
    assert_eq!(site.engine.preventives(None)?, vec![record]);
    Ok(())
}

#[test]
fn every_save_is_a_new_record() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    let day = date(2024, 7, 18)?;
    site.engine.record_preventive("CALF - Saída 01", day, jpeg(b"same"))?;
    site.engine.record_preventive("CALF - Saída 01", day, jpeg(b"same"))?;

    let records = site.engine.preventives(None)?;
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].id, records[1].id);
    assert_eq!(records[0].photo, records[1].photo);
    Ok(())
}

#[test]
fn records_sort_by_maintenance_date_descending() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    site.engine.record_preventive("CALF - Saída 01", date(2024, 7, 10)?, jpeg(b"a"))?;
    site.engine.record_preventive("MOTO - Saída 01", date(2024, 7, 18)?, jpeg(b"b"))?;
    site.engine.record_preventive(
        "ARMAZEM - Entrada 01",
        date(2024, 6, 30)?,
        Photo::External("https://fotos.example/c.jpg".into()),
    )?;

    let dates: Vec<_> = site
        .engine
        .preventives(None)?
        .into_iter()
        .map(|r| r.date)
        .collect();
    assert_eq!(dates, vec![date(2024, 7, 18)?, date(2024, 7, 10)?, date(2024, 6, 30)?]);
    Ok(())
}

#[test]
fn filter_matches_equipment_or_collaborator() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    site.engine.record_preventive("CALF - Saída 01", date(2024, 7, 10)?, jpeg(b"a"))?;
    site.sign_up("Bia", "bia")?;
    site.engine.record_preventive("MOTO - Saída 01", date(2024, 7, 11)?, jpeg(b"b"))?;

    assert_eq!(site.engine.preventives(Some("calf"))?.len(), 1);
    assert_eq!(site.engine.preventives(Some("BIA"))?.len(), 1);
    assert_eq!(site.engine.preventives(Some("saída"))?.len(), 2);
    assert_eq!(site.engine.preventives(Some("  "))?.len(), 2);
    assert!(site.engine.preventives(Some("terminais"))?.is_empty());
    Ok(())
}

#[test]
fn invalid_preventive_requests_are_refused() -> TestResult {
    let mut site = TestSite::new()?;
    let day = date(2024, 7, 18)?;

    let guest = site.engine.record_preventive("MOTO - Entrada 01", day, jpeg(b"x"));
    assert!(matches!(guest, Err(EngineError::Unauthenticated(_))));

    site.sign_up("Ana", "ana")?;
    let unknown = site.engine.record_preventive("MOTO - Entrada 09", day, jpeg(b"x"));
    assert!(matches!(unknown, Err(EngineError::UnknownEquipment(_))));

    let empty = site.engine.record_preventive("MOTO - Entrada 01", day, jpeg(b""));
    assert!(matches!(empty, Err(EngineError::MissingPhoto)));

    assert!(site.engine.preventives(None)?.is_empty());
    Ok(())
}

#[test]
fn failed_preventive_write_leaves_nothing_behind() -> TestResult {
    let mut site = TestSite::flaky()?;
    site.sign_up("Ana", "ana")?;
    site.engine.storage_mut().fail_next(1);

    let result = site.engine.record_preventive("MOTO - Entrada 01", date(2024, 7, 18)?, jpeg(b"x"));
    assert!(matches!(result, Err(EngineError::Storage(_))));
    assert!(site.engine.preventives(None)?.is_empty());
    assert!(site.engine.change_log()?.is_empty());
    Ok(())
}

// ============================================================================
// Fault history
// ============================================================================

#[test]
fn defect_summary_counts_repeated_descriptions() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    for observation in ["sem sinal", "papel", "sem sinal", "sem sinal", "papel", "cancela"] {
        site.check("2024-07-20", &[("TERMINAIS", "Epa Petz", ItemStatus::Issue, observation)])?;
        site.check("2024-07-20", &[("TERMINAIS", "Epa Petz", ItemStatus::Ok, "")])?;
    }
    site.check("2024-07-20", &[("TERMINAIS", "Epa Academia", ItemStatus::Issue, "papel")])?;

    let history = site.engine.fault_history("TERMINAIS - Epa Petz")?;
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].description, "cancela");
    assert!(history.windows(2).all(|w| w[0].date >= w[1].date));

    let summary: Vec<_> = site
        .engine
        .defect_summary("TERMINAIS - Epa Petz")?
        .into_iter()
        .map(|d| (d.description, d.occurrences))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("sem sinal".to_string(), 3),
            ("papel".to_string(), 2),
            ("cancela".to_string(), 1),
        ]
    );
    Ok(())
}

#[test]
fn equipment_names_follow_template_order() -> TestResult {
    let site = TestSite::new()?;
    let names = site.engine.equipment_names();
    assert_eq!(names.len(), site.engine.template().item_count());
    assert_eq!(names[0], "DOCAS - Entrada 01");
    assert_eq!(names.last().map(String::as_str), Some("TERMINAIS MERCADÃO - Epa Salão Veículos"));
    assert!(site.engine.fault_history("DOCAS - Entrada 01")?.is_empty());
    Ok(())
}
