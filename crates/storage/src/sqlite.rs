use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use vistoria_core::{
    BlobHash, ChangeLogEntry, ChecklistData, CredentialHandle, DateKey, EquipmentFaultLogEntry,
    FaultLogId, LoginHistoryEntry, Photo, PhotoRef, PreventiveId, PreventiveMaintenanceRecord,
    ReportSnapshot, UserAccount, clock::from_millis,
};

use crate::error::StorageError;
use crate::traits::{CommitBatch, PhotoBlob, Storage};

const CHANGE_LOG_TABLE: &str = "change_log";
const LOGIN_HISTORY_TABLE: &str = "login_history";

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn write_report(conn: &Connection, snapshot: &ReportSnapshot) -> Result<(), StorageError> {
    let data = snapshot
        .data
        .to_msgpack()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO reports (date_key, collaborator, data, saved_at) VALUES (?1, ?2, ?3, CAST(unixepoch('now','subsec') * 1000 AS INTEGER))
         ON CONFLICT(date_key) DO UPDATE SET collaborator = excluded.collaborator, data = excluded.data, saved_at = excluded.saved_at",
        params![snapshot.id.to_string(), snapshot.collaborator, data],
    )?;
    Ok(())
}

fn write_change(conn: &Connection, entry: &ChangeLogEntry) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO change_log (user, email, logged_at, change) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.user,
            entry.email,
            entry.date.timestamp_millis(),
            entry.change
        ],
    )?;
    Ok(())
}

fn write_fault(conn: &Connection, entry: &EquipmentFaultLogEntry) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO equipment_logs (fault_id, equipment, logged_at, description) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.id.as_bytes().as_slice(),
            entry.equipment,
            entry.date.timestamp_millis(),
            entry.description,
        ],
    )?;
    Ok(())
}

/// Drops everything but the last `cap` rows inserted into a bounded log table.
/// Row ids give insertion order; timestamps come from each writer's own clock
/// and may interleave when several engines share the database.
fn trim_log(conn: &Connection, table: &'static str, cap: usize) -> Result<usize, StorageError> {
    let removed = conn.execute(
        &format!(
            "DELETE FROM {table} WHERE rowid NOT IN (SELECT rowid FROM {table} ORDER BY rowid DESC LIMIT ?1)"
        ),
        params![cap as i64],
    )?;
    if removed > 0 {
        tracing::debug!(table, removed, cap, "trimmed bounded log");
    }
    Ok(removed)
}

fn read_faults(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<EquipmentFaultLogEntry>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        let id_bytes: Vec<u8> = row.get(0)?;
        let equipment: String = row.get(1)?;
        let logged_at: i64 = row.get(2)?;
        let description: String = row.get(3)?;
        Ok((id_bytes, equipment, logged_at, description))
    })?;

    let mut result = Vec::new();
    for row in rows {
        let (id_bytes, equipment, logged_at, description) = row?;
        result.push(EquipmentFaultLogEntry {
            id: FaultLogId::from_bytes(to_array::<16>(id_bytes, "fault_id")?),
            equipment,
            date: from_millis(logged_at)?,
            description,
        });
    }
    Ok(result)
}

impl Storage for SqliteStorage {
    fn get_report(&self, key: DateKey) -> Result<Option<ReportSnapshot>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT collaborator, data FROM reports WHERE date_key = ?1",
                params![key.to_string()],
                |row| {
                    let collaborator: String = row.get(0)?;
                    let data: Vec<u8> = row.get(1)?;
                    Ok((collaborator, data))
                },
            )
            .optional()?;

        let Some((collaborator, data)) = row else {
            return Ok(None);
        };
        match ChecklistData::from_msgpack(&data) {
            Ok(data) => Ok(Some(ReportSnapshot::new(key, &collaborator, data))),
            Err(e) => {
                tracing::warn!(date = %key, error = %e, "stored report is unreadable; treating as absent");
                Ok(None)
            }
        }
    }

    fn upsert_report(&mut self, snapshot: &ReportSnapshot) -> Result<(), StorageError> {
        write_report(&self.conn, snapshot)
    }

    fn report_keys(&self) -> Result<Vec<DateKey>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date_key FROM reports ORDER BY date_key DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for row in rows {
            let raw = row?;
            match raw.parse::<DateKey>() {
                Ok(key) => result.push(key),
                Err(e) => tracing::warn!(key = %raw, error = %e, "skipping report with bad key"),
            }
        }
        Ok(result)
    }

    fn commit_report(&mut self, batch: &CommitBatch) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;

        write_report(&tx, &batch.snapshot)?;
        for entry in &batch.change_log {
            write_change(&tx, entry)?;
        }
        if !batch.change_log.is_empty() {
            trim_log(&tx, CHANGE_LOG_TABLE, batch.change_log_cap)?;
        }
        for entry in &batch.fault_log {
            write_fault(&tx, entry)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn append_change_log(
        &mut self,
        entry: &ChangeLogEntry,
        cap: usize,
    ) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        write_change(&tx, entry)?;
        trim_log(&tx, CHANGE_LOG_TABLE, cap)?;
        tx.commit()?;
        Ok(())
    }

    fn change_log(&self, limit: usize) -> Result<Vec<ChangeLogEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT user, email, logged_at, change FROM change_log ORDER BY rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let user: String = row.get(0)?;
            let email: String = row.get(1)?;
            let logged_at: i64 = row.get(2)?;
            let change: String = row.get(3)?;
            Ok((user, email, logged_at, change))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (user, email, logged_at, change) = row?;
            result.push(ChangeLogEntry {
                user,
                email,
                date: from_millis(logged_at)?,
                change,
            });
        }
        Ok(result)
    }

    fn append_login(
        &mut self,
        entry: &LoginHistoryEntry,
        cap: usize,
    ) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO login_history (user, email, logged_at) VALUES (?1, ?2, ?3)",
            params![entry.user, entry.email, entry.date.timestamp_millis()],
        )?;
        trim_log(&tx, LOGIN_HISTORY_TABLE, cap)?;
        tx.commit()?;
        Ok(())
    }

    fn login_history(&self, limit: usize) -> Result<Vec<LoginHistoryEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT user, email, logged_at FROM login_history ORDER BY rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let user: String = row.get(0)?;
            let email: String = row.get(1)?;
            let logged_at: i64 = row.get(2)?;
            Ok((user, email, logged_at))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (user, email, logged_at) = row?;
            result.push(LoginHistoryEntry {
                user,
                email,
                date: from_millis(logged_at)?,
            });
        }
        Ok(result)
    }

    fn append_fault(&mut self, entry: &EquipmentFaultLogEntry) -> Result<(), StorageError> {
        write_fault(&self.conn, entry)
    }

    fn faults_for_equipment(
        &self,
        equipment: &str,
    ) -> Result<Vec<EquipmentFaultLogEntry>, StorageError> {
        read_faults(
            &self.conn,
            "SELECT fault_id, equipment, logged_at, description FROM equipment_logs WHERE equipment = ?1 ORDER BY rowid DESC",
            params![equipment],
        )
    }

    fn all_faults(&self) -> Result<Vec<EquipmentFaultLogEntry>, StorageError> {
        read_faults(
            &self.conn,
            "SELECT fault_id, equipment, logged_at, description FROM equipment_logs ORDER BY rowid DESC",
            params![],
        )
    }

    fn record_preventive(
        &mut self,
        record: &PreventiveMaintenanceRecord,
        photo: &Photo,
        change: &ChangeLogEntry,
        change_log_cap: usize,
    ) -> Result<(), StorageError> {
        if record.photo != photo.reference() {
            return Err(StorageError::Serialization(
                "photo does not match the maintenance record".into(),
            ));
        }

        let tx = self.conn.transaction()?;

        let (photo_hash, photo_type, photo_url) = match photo {
            Photo::Inline {
                content_type,
                bytes,
            } => {
                let hash = BlobHash::of(bytes);
                tx.execute(
                    "INSERT OR IGNORE INTO photos (hash, content_type, bytes) VALUES (?1, ?2, ?3)",
                    params![hash.as_bytes().as_slice(), content_type, bytes],
                )?;
                (
                    Some(hash.as_bytes().to_vec()),
                    Some(content_type.clone()),
                    None,
                )
            }
            Photo::External(url) => (None, None, Some(url.clone())),
        };

        tx.execute(
            "INSERT INTO preventives (preventive_id, equipment, service_date, photo_hash, photo_type, photo_url, collaborator) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.as_bytes().as_slice(),
                record.equipment,
                DateKey::from_date(record.date).to_string(),
                photo_hash,
                photo_type,
                photo_url,
                record.collaborator,
            ],
        )?;

        write_change(&tx, change)?;
        trim_log(&tx, CHANGE_LOG_TABLE, change_log_cap)?;

        tx.commit()?;
        Ok(())
    }

    fn preventives(&self) -> Result<Vec<PreventiveMaintenanceRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT preventive_id, equipment, service_date, photo_hash, photo_type, photo_url, collaborator
             FROM preventives ORDER BY service_date DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let id_bytes: Vec<u8> = row.get(0)?;
            let equipment: String = row.get(1)?;
            let service_date: String = row.get(2)?;
            let photo_hash: Option<Vec<u8>> = row.get(3)?;
            let photo_type: Option<String> = row.get(4)?;
            let photo_url: Option<String> = row.get(5)?;
            let collaborator: String = row.get(6)?;
            Ok((
                id_bytes,
                equipment,
                service_date,
                photo_hash,
                photo_type,
                photo_url,
                collaborator,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id_bytes, equipment, service_date, photo_hash, photo_type, photo_url, collaborator) =
                row?;
            let photo = match (photo_hash, photo_type, photo_url) {
                (Some(hash), Some(content_type), _) => PhotoRef::Blob {
                    hash: BlobHash::from_bytes(to_array::<32>(hash, "photo_hash")?),
                    content_type,
                },
                (None, _, Some(url)) => PhotoRef::External(url),
                _ => {
                    return Err(StorageError::Serialization(
                        "maintenance record without a photo".into(),
                    ));
                }
            };
            result.push(PreventiveMaintenanceRecord {
                id: PreventiveId::from_bytes(to_array::<16>(id_bytes, "preventive_id")?),
                equipment,
                date: service_date.parse::<DateKey>()?.date(),
                photo,
                collaborator,
            });
        }
        Ok(result)
    }

    fn photo(&self, hash: BlobHash) -> Result<Option<PhotoBlob>, StorageError> {
        let blob = self
            .conn
            .query_row(
                "SELECT content_type, bytes FROM photos WHERE hash = ?1",
                params![hash.as_bytes().as_slice()],
                |row| {
                    Ok(PhotoBlob {
                        content_type: row.get(0)?,
                        bytes: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(blob)
    }

    fn get_user(&self, email: &str) -> Result<Option<UserAccount>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT email, name, salt, digest FROM users WHERE email = ?1",
                params![email],
                |row| {
                    let email: String = row.get(0)?;
                    let name: String = row.get(1)?;
                    let salt: Vec<u8> = row.get(2)?;
                    let digest: Vec<u8> = row.get(3)?;
                    Ok((email, name, salt, digest))
                },
            )
            .optional()?;

        match row {
            Some((email, name, salt, digest)) => Ok(Some(UserAccount {
                name,
                email,
                credential: CredentialHandle::from_parts(&salt, &digest)?,
            })),
            None => Ok(None),
        }
    }

    fn insert_user(&mut self, account: &UserAccount) -> Result<(), StorageError> {
        let result = self.conn.execute(
            "INSERT INTO users (email, name, salt, digest) VALUES (?1, ?2, ?3, ?4)",
            params![
                account.email,
                account.name,
                account.credential.salt().as_slice(),
                account.credential.digest().as_slice(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::AccountCollision {
                    email: account.email.clone(),
                })
            }
            Err(e) => Err(StorageError::Sqlite(e)),
        }
    }

    fn user_count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn registration_locked(&self) -> Result<bool, StorageError> {
        let locked: Option<bool> = self
            .conn
            .query_row(
                "SELECT registration_locked FROM settings WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(locked.unwrap_or(false))
    }

    fn set_registration_locked(&mut self, locked: bool) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO settings (id, registration_locked) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET registration_locked = excluded.registration_locked",
            params![locked],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vistoria_core::{ItemState, LogClock, clock::physical_now};

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn change(clock: &mut LogClock, text: &str) -> ChangeLogEntry {
        ChangeLogEntry {
            user: "Ana".into(),
            email: "ana@estapar.com.br".into(),
            date: clock.tick().unwrap(),
            change: text.into(),
        }
    }

    fn fault(clock: &mut LogClock, equipment: &str, description: &str) -> EquipmentFaultLogEntry {
        EquipmentFaultLogEntry {
            id: FaultLogId::new(),
            equipment: equipment.into(),
            date: clock.tick().unwrap(),
            description: description.into(),
        }
    }

    fn snapshot(date: &str, observation: &str) -> ReportSnapshot {
        let mut data = ChecklistData::new();
        data.set_item("DOCAS", "Entrada 01", ItemState::issue(observation));
        ReportSnapshot::new(key(date), "Ana", data)
    }

    #[test]
    fn absent_report_reads_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.get_report(key("2024-07-20")).unwrap().is_none());
        assert!(storage.report_keys().unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.upsert_report(&snapshot("2024-07-20", "first")).unwrap();
        storage.upsert_report(&snapshot("2024-07-20", "second")).unwrap();

        let stored = storage.get_report(key("2024-07-20")).unwrap().unwrap();
        assert_eq!(stored, snapshot("2024-07-20", "second"));
        assert_eq!(storage.report_keys().unwrap(), vec![key("2024-07-20")]);
    }

    #[test]
    fn report_keys_newest_first() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.upsert_report(&snapshot("2024-07-01", "a")).unwrap();
        storage.upsert_report(&snapshot("2024-07-20", "b")).unwrap();
        storage.upsert_report(&snapshot("2024-06-30", "c")).unwrap();
        assert_eq!(
            storage.report_keys().unwrap(),
            vec![key("2024-07-20"), key("2024-07-01"), key("2024-06-30")]
        );
    }

    #[test]
    fn corrupt_report_reads_as_absent() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .conn()
            .execute(
                "INSERT INTO reports (date_key, collaborator, data) VALUES ('2024-07-20', 'x', X'C1C1C1')",
                [],
            )
            .unwrap();
        assert!(storage.get_report(key("2024-07-20")).unwrap().is_none());
    }

    #[test]
    fn commit_batch_is_atomic() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut clock = LogClock::new();
        let duplicate = fault(&mut clock, "DOCAS - Entrada 01", "x");

        let batch = CommitBatch {
            snapshot: snapshot("2024-07-20", "x"),
            change_log: vec![change(&mut clock, "changed")],
            fault_log: vec![duplicate.clone(), duplicate],
            change_log_cap: 50,
        };
        assert!(storage.commit_report(&batch).is_err());

        assert!(storage.get_report(key("2024-07-20")).unwrap().is_none());
        assert!(storage.change_log(50).unwrap().is_empty());
        assert!(storage.all_faults().unwrap().is_empty());
    }

    #[test]
    fn commit_batch_applies_everything() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut clock = LogClock::new();
        let batch = CommitBatch {
            snapshot: snapshot("2024-07-20", "x"),
            change_log: vec![change(&mut clock, "first"), change(&mut clock, "second")],
            fault_log: vec![fault(&mut clock, "DOCAS - Entrada 01", "x")],
            change_log_cap: 50,
        };
        storage.commit_report(&batch).unwrap();

        assert!(storage.get_report(key("2024-07-20")).unwrap().is_some());
        let log: Vec<_> = storage
            .change_log(50)
            .unwrap()
            .into_iter()
            .map(|e| e.change)
            .collect();
        assert_eq!(log, vec!["second", "first"]);
        assert_eq!(storage.all_faults().unwrap().len(), 1);
    }

    #[test]
    fn change_log_keeps_newest_fifty() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut clock = LogClock::new();
        for i in 0..51 {
            storage
                .append_change_log(&change(&mut clock, &format!("change {i}")), 50)
                .unwrap();
        }
        let log = storage.change_log(100).unwrap();
        assert_eq!(log.len(), 50);
        assert_eq!(log[0].change, "change 50");
        assert_eq!(log[49].change, "change 1");
        assert!(log.iter().all(|e| e.change != "change 0"));
    }

    #[test]
    fn login_history_is_capped() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut clock = LogClock::new();
        for i in 0..5 {
            let entry = LoginHistoryEntry {
                user: format!("user {i}"),
                email: "a@estapar.com.br".into(),
                date: clock.tick().unwrap(),
            };
            storage.append_login(&entry, 3).unwrap();
        }
        let history = storage.login_history(10).unwrap();
        let users: Vec<_> = history.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(users, vec!["user 4", "user 3", "user 2"]);
    }

    #[test]
    fn skewed_timestamps_keep_insertion_order() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut ahead = LogClock::new();
        ahead.observe(from_millis(physical_now() + 60_000).unwrap());
        let mut behind = LogClock::new();

        for i in 0..3 {
            storage
                .append_change_log(&change(&mut ahead, &format!("ahead {i}")), 3)
                .unwrap();
        }
        storage
            .append_change_log(&change(&mut behind, "latest"), 3)
            .unwrap();

        let log: Vec<_> = storage
            .change_log(10)
            .unwrap()
            .into_iter()
            .map(|e| e.change)
            .collect();
        assert_eq!(log, vec!["latest", "ahead 2", "ahead 1"]);

        let entry = LoginHistoryEntry {
            user: "late".into(),
            email: "a@estapar.com.br".into(),
            date: behind.tick().unwrap(),
        };
        storage
            .append_login(
                &LoginHistoryEntry {
                    user: "early".into(),
                    date: ahead.tick().unwrap(),
                    ..entry.clone()
                },
                1,
            )
            .unwrap();
        storage.append_login(&entry, 1).unwrap();
        let history = storage.login_history(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "late");
    }

    #[test]
    fn faults_by_equipment_newest_first() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut clock = LogClock::new();
        storage
            .append_fault(&fault(&mut clock, "DOCAS - Entrada 01", "old"))
            .unwrap();
        storage
            .append_fault(&fault(&mut clock, "MOTO - Entrada 01", "elsewhere"))
            .unwrap();
        storage
            .append_fault(&fault(&mut clock, "DOCAS - Entrada 01", "new"))
            .unwrap();

        let history = storage.faults_for_equipment("DOCAS - Entrada 01").unwrap();
        let descriptions: Vec<_> = history.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["new", "old"]);
        assert!(storage.faults_for_equipment("DOCAS").unwrap().is_empty());
    }

    #[test]
    fn preventives_sorted_and_photos_deduplicated() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut clock = LogClock::new();
        let photo = Photo::Inline {
            content_type: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8, 0xff],
        };
        for (equipment, date) in [
            ("DOCAS - Entrada 01", "2024-07-18"),
            ("TERMINAIS - Epa Petz", "2024-07-20"),
        ] {
            let record = PreventiveMaintenanceRecord {
                id: PreventiveId::new(),
                equipment: equipment.into(),
                date: key(date).date(),
                photo: photo.reference(),
                collaborator: "Ana (ana@estapar.com.br)".into(),
            };
            storage
                .record_preventive(&record, &photo, &change(&mut clock, "preventive"), 50)
                .unwrap();
        }

        let records = storage.preventives().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].equipment, "TERMINAIS - Epa Petz");
        assert_eq!(records[1].equipment, "DOCAS - Entrada 01");

        let photo_rows: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(photo_rows, 1);

        let PhotoRef::Blob { hash, .. } = &records[0].photo else {
            panic!("expected a stored photo");
        };
        let blob = storage.photo(*hash).unwrap().unwrap();
        assert_eq!(blob.bytes, vec![0xff, 0xd8, 0xff]);
        assert_eq!(storage.change_log(10).unwrap().len(), 2);
    }

    #[test]
    fn mismatched_photo_rejected() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut clock = LogClock::new();
        let record = PreventiveMaintenanceRecord {
            id: PreventiveId::new(),
            equipment: "DOCAS - Entrada 01".into(),
            date: key("2024-07-18").date(),
            photo: PhotoRef::External("https://example.com/a.jpg".into()),
            collaborator: "Ana (ana@estapar.com.br)".into(),
        };
        let other = Photo::External("https://example.com/b.jpg".into());
        assert!(
            storage
                .record_preventive(&record, &other, &change(&mut clock, "x"), 50)
                .is_err()
        );
        assert!(storage.preventives().unwrap().is_empty());
    }

    #[test]
    fn duplicate_user_is_a_collision() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let account = UserAccount {
            name: "Ana".into(),
            email: "ana@estapar.com.br".into(),
            credential: CredentialHandle::derive("pw"),
        };
        storage.insert_user(&account).unwrap();
        let err = storage.insert_user(&account).unwrap_err();
        assert!(matches!(err, StorageError::AccountCollision { .. }));
        assert_eq!(storage.user_count().unwrap(), 1);

        let stored = storage.get_user("ana@estapar.com.br").unwrap().unwrap();
        assert!(stored.credential.verify("pw"));
        assert!(storage.get_user("bia@estapar.com.br").unwrap().is_none());
    }

    #[test]
    fn registration_lock_defaults_open() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        assert!(!storage.registration_locked().unwrap());
        storage.set_registration_locked(true).unwrap();
        assert!(storage.registration_locked().unwrap());
        storage.set_registration_locked(false).unwrap();
        assert!(!storage.registration_locked().unwrap());
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vistoria.db");
        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.upsert_report(&snapshot("2024-07-20", "kept")).unwrap();
        }
        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(
            storage.get_report(key("2024-07-20")).unwrap(),
            Some(snapshot("2024-07-20", "kept"))
        );
    }
}
