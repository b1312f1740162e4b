//! Domain record CRUD operations.

use super::connection::DomainDb;
use super::{DomainRecord, DomainStore, DomainUpdate, NewDomain, UNKNOWN};
use crate::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const SELECT_BY_URL: &str = "SELECT
    id, url, status, ping, response_rate, reachable, snapshot, last_update, created_at
FROM domains WHERE url = ?1";

/// Timestamps are stored as fixed-width RFC 3339 so text order is time order.
fn db_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_time(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn select_by_url(conn: &rusqlite::Connection, url: &str) -> Result<Option<DomainRecord>, Error> {
    let mut stmt = conn.prepare(SELECT_BY_URL)?;

    let result = stmt.query_row(params![url], |row| {
        Ok(DomainRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            status: row.get(2)?,
            ping: row.get(3)?,
            response_rate: row.get(4)?,
            reachable: row.get(5)?,
            snapshot: row.get(6)?,
            last_update: parse_time(row, 7)?,
            created_at: parse_time(row, 8)?,
        })
    });

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl DomainDb {
    /// Number of stored records.
    pub async fn count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM domains", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl DomainStore for DomainDb {
    async fn find_by_url(&self, url: &str) -> Result<Option<DomainRecord>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| select_by_url(conn, &url))
            .await
            .map_err(Error::from)
    }

    async fn create(&self, domain: NewDomain) -> Result<DomainRecord, Error> {
        self.conn
            .call(move |conn| -> Result<DomainRecord, Error> {
                let inserted = conn.execute(
                    "INSERT INTO domains (
                    url, status, ping, response_rate, reachable, snapshot, last_update, created_at
                ) VALUES (?1, ?2, 0, ?2, 0, ?3, ?4, ?5)",
                    params![
                        &domain.url,
                        UNKNOWN,
                        &domain.snapshot,
                        db_time(&domain.last_update),
                        db_time(&domain.created_at),
                    ],
                );

                match inserted {
                    Ok(_) => {}
                    Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
                        return Err(Error::Conflict(domain.url));
                    }
                    Err(e) => return Err(e.into()),
                }

                select_by_url(conn, &domain.url)?.ok_or_else(|| Error::NotFound(domain.url.clone()))
            })
            .await
            .map_err(Error::from)
    }

    async fn update_by_url(&self, url: &str, update: DomainUpdate) -> Result<DomainRecord, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<DomainRecord, Error> {
                let tx = conn.transaction()?;

                let changed = tx.execute(
                    "UPDATE domains SET
                    status = COALESCE(?2, status),
                    ping = COALESCE(?3, ping),
                    response_rate = COALESCE(?4, response_rate),
                    reachable = COALESCE(?5, reachable),
                    snapshot = COALESCE(?6, snapshot),
                    last_update = MAX(last_update, COALESCE(?7, last_update))
                WHERE url = ?1",
                    params![
                        &url,
                        &update.status,
                        &update.ping,
                        &update.response_rate,
                        &update.reachable,
                        &update.snapshot,
                        update.last_update.as_ref().map(db_time),
                    ],
                )?;

                if changed == 0 {
                    return Err(Error::NotFound(url));
                }

                let record = select_by_url(&tx, &url)?.ok_or_else(|| Error::NotFound(url.clone()))?;
                tx.commit()?;
                Ok(record)
            })
            .await
            .map_err(Error::from)
    }
}
