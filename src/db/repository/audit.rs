use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// Insert a batch of audit entries into the audit_log table.
pub fn insert_audit_entries(
    conn: &Connection,
    entries: &[(String, String, String, String)], // (timestamp, source, action, entity)
) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO audit_log (timestamp, source, action, entity) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (timestamp, source, action, entity) in entries {
        stmt.execute(params![timestamp, source, action, entity])?;
    }
    Ok(())
}

/// Drop all but the newest `keep` rows. Returns how many were removed.
pub fn prune_audit_log(conn: &Connection, keep: usize) -> Result<usize, DatabaseError> {
    let keep = i64::try_from(keep).unwrap_or(i64::MAX);
    let removed = conn.execute(
        "DELETE FROM audit_log WHERE id NOT IN
         (SELECT id FROM audit_log ORDER BY id DESC LIMIT ?1)",
        params![keep],
    )?;
    Ok(removed)
}

/// Most recent audit entries, newest first.
/// Returns (timestamp, source, action, entity) tuples.
pub fn recent_audit_entries(
    conn: &Connection,
    limit: i64,
) -> Result<Vec<(String, String, String, String)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, source, action, entity FROM audit_log
         ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
