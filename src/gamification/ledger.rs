//! Append-only points ledger.
//!
//! Totals are always derived by summing the ledger, never kept as a
//! separately mutated counter, so the audit trail and the total cannot
//! drift apart.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::types::{PointsTransaction, TransactionKind};

/// Ledger of points transactions.
pub struct PointsLedger<'a> {
    conn: &'a Connection,
}

impl<'a> PointsLedger<'a> {
    /// Create a new ledger with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a transaction. A single insert is the atomic unit; nothing
    /// is retried and no partial state is possible.
    pub fn award(
        &self,
        user_id: Uuid,
        points: i64,
        kind: TransactionKind,
        description: Option<&str>,
    ) -> Result<PointsTransaction, LedgerError> {
        let transaction = PointsTransaction {
            id: Uuid::new_v4(),
            user_id,
            points,
            kind,
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO points_transactions (id, user_id, points, kind, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    transaction.id.to_string(),
                    transaction.user_id.to_string(),
                    transaction.points,
                    transaction.kind.as_str(),
                    transaction.description,
                    transaction.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(transaction)
    }

    /// Total points for a user: a fold over the ledger.
    pub fn user_points(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(points), 0) FROM points_transactions WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| LedgerError::Database(e.to_string()))
    }

    /// Transaction history for a user, most recent first.
    pub fn transactions(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PointsTransaction>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, points, kind, description, created_at
                 FROM points_transactions WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![user_id.to_string(), limit, offset],
                parse_transaction_row,
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row.map_err(|e| LedgerError::Database(e.to_string()))?);
        }

        Ok(transactions)
    }
}

fn parse_transaction_row(row: &rusqlite::Row) -> rusqlite::Result<PointsTransaction> {
    let id_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;
    let kind_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;

    Ok(PointsTransaction {
        id: parse_uuid(0, &id_str)?,
        user_id: parse_uuid(1, &user_str)?,
        points: row.get(2)?,
        kind: TransactionKind::from_str(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown transaction kind: {}", kind_str).into(),
            )
        })?,
        description: row.get(4)?,
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
    })
}

// Corrupt stored values surface as errors, never as silent defaults.
fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Ledger errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::profiles::ProfileManager;
    use crate::storage::Database;

    fn seeded_db() -> (Database, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let profile = ProfileManager::new(db.connection())
            .create("aluno@example.com", "Aluno Teste", Role::Student)
            .unwrap();
        let id = profile.id;
        (db, id)
    }

    #[test]
    fn test_total_is_sum_of_ledger() {
        let (db, user_id) = seeded_db();
        let ledger = PointsLedger::new(db.connection());

        ledger
            .award(user_id, 50, TransactionKind::CourseCompletion, None)
            .unwrap();
        ledger
            .award(user_id, -10, TransactionKind::Custom, Some("ajuste"))
            .unwrap();

        assert_eq!(ledger.user_points(user_id).unwrap(), 40);
    }

    #[test]
    fn test_empty_ledger_totals_zero() {
        let (db, user_id) = seeded_db();
        let ledger = PointsLedger::new(db.connection());
        assert_eq!(ledger.user_points(user_id).unwrap(), 0);
    }

    #[test]
    fn test_history_most_recent_first_with_pagination() {
        let (db, user_id) = seeded_db();
        let ledger = PointsLedger::new(db.connection());

        for i in 0..5 {
            ledger
                .award(
                    user_id,
                    i,
                    TransactionKind::Custom,
                    Some(&format!("tx-{}", i)),
                )
                .unwrap();
        }

        let page = ledger.transactions(user_id, 2, 0).unwrap();
        assert_eq!(page.len(), 2);

        let rest = ledger.transactions(user_id, 10, 2).unwrap();
        assert_eq!(rest.len(), 3);

        // Pages never overlap
        let page_ids: Vec<_> = page.iter().map(|t| t.id).collect();
        assert!(rest.iter().all(|t| !page_ids.contains(&t.id)));
    }

    #[test]
    fn test_corrupt_transaction_kind_is_an_error() {
        let (db, user_id) = seeded_db();
        let ledger = PointsLedger::new(db.connection());

        db.connection()
            .execute(
                "INSERT INTO points_transactions (id, user_id, points, kind, description, created_at)
                 VALUES (?1, ?2, 10, 'bonus', NULL, ?3)",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .unwrap();

        // Never decoded as some other kind
        let err = ledger.transactions(user_id, 10, 0).unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
    }

    #[test]
    fn test_totals_are_per_user() {
        let (db, user_a) = seeded_db();
        let user_b = ProfileManager::new(db.connection())
            .create("outro@example.com", "Outro Aluno", Role::Student)
            .unwrap()
            .id;

        let ledger = PointsLedger::new(db.connection());
        ledger
            .award(user_a, 100, TransactionKind::CourseCompletion, None)
            .unwrap();
        ledger
            .award(user_b, 25, TransactionKind::ForumParticipation, None)
            .unwrap();

        assert_eq!(ledger.user_points(user_a).unwrap(), 100);
        assert_eq!(ledger.user_points(user_b).unwrap(), 25);
    }
}
