//! Shared test helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use duo::error::NotifyError;
use duo::models::Participant;
use duo::notifications::{EventKind, Notifier, PairingEvent};
use duo::utils::DaySchedule;
use std::sync::Mutex;
use uuid::Uuid;

/// 2026-05-12 16:00 UTC, the matching run's wall clock in most tests.
pub fn run_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 12, 16, 0, 0).unwrap()
}

/// Day boundaries in UTC with pairings expiring at 23:59.
pub fn utc_schedule() -> DaySchedule {
    DaySchedule::new(chrono_tz::UTC, NaiveTime::from_hms_opt(23, 59, 0).unwrap())
}

pub fn participant(handle: &str, now: DateTime<Utc>) -> Participant {
    Participant::new(handle, handle.to_uppercase(), now)
}

pub fn befriend(a: &mut Participant, b: &mut Participant) {
    a.connections.push(b.id);
    b.connections.push(a.id);
}

/// Records every delivery instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub deliveries: Mutex<Vec<(Uuid, EventKind, Uuid)>>,
}

impl RecordingNotifier {
    pub fn count(&self, kind: EventKind) -> usize {
        self.deliveries.lock().unwrap().iter().filter(|(_, k, _)| *k == kind).count()
    }

    pub fn recipients(&self, kind: EventKind) -> Vec<Uuid> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(recipient, _, _)| *recipient)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, recipient: &Participant, event: &PairingEvent) -> Result<(), NotifyError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((recipient.id, event.kind, event.pairing_id));
        Ok(())
    }
}

/// True when `TEST_DATABASE_URL` points at a Postgres instance to test against.
pub fn has_test_db() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

/// Migrated, emptied database behind a [`duo::db::PgStore`].
pub async fn setup_pg_store() -> (sqlx::PgPool, duo::db::PgStore) {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.expect("Failed to connect to test database");
    duo::db::migrations::run_migrations(&pool).await.unwrap();
    sqlx::raw_sql("TRUNCATE TABLE pairings, participants CASCADE")
        .execute(&pool)
        .await
        .unwrap();
    (pool.clone(), duo::db::PgStore::new(pool))
}
