use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_datetime, parse_datetime, parse_uuid, DatabaseError};
use crate::models::*;

pub fn insert_notification(conn: &Connection, n: &Notification) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, type, message, created_at, is_read)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            n.id.to_string(),
            n.user_id.to_string(),
            n.notification_type.as_str(),
            n.message,
            format_datetime(&n.created_at),
            n.is_read as i32,
        ],
    )?;
    Ok(())
}

/// Notifications addressed to a user, newest first.
pub fn get_user_notifications(
    conn: &Connection,
    user_id: &Uuid,
    unread_only: bool,
) -> Result<Vec<Notification>, DatabaseError> {
    let sql = if unread_only {
        "SELECT id, user_id, type, message, created_at, is_read FROM notifications
         WHERE user_id = ?1 AND is_read = 0 ORDER BY created_at DESC"
    } else {
        "SELECT id, user_id, type, message, created_at, is_read FROM notifications
         WHERE user_id = ?1 ORDER BY created_at DESC"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i32>(5)?,
        ))
    })?;

    let mut notifications = Vec::new();
    for row in rows {
        let (id, user_id, kind, message, created_at, is_read) = row?;
        notifications.push(Notification {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            notification_type: NotificationType::from_str(&kind)?,
            message,
            created_at: parse_datetime(&created_at)?,
            is_read: is_read != 0,
        });
    }
    Ok(notifications)
}

pub fn count_unread_notifications(conn: &Connection, user_id: &Uuid) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mark one notification read. Scoped to its addressee: another user's id is
/// reported as not found.
pub fn mark_notification_read(
    conn: &Connection,
    user_id: &Uuid,
    notification_id: &Uuid,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![notification_id.to_string(), user_id.to_string()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "notification".into(),
            id: notification_id.to_string(),
        });
    }
    Ok(())
}

pub fn mark_all_notifications_read(conn: &Connection, user_id: &Uuid) -> Result<usize, DatabaseError> {
    let affected = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
        params![user_id.to_string()],
    )?;
    Ok(affected)
}

pub fn count_notifications_by_type(
    conn: &Connection,
    user_id: &Uuid,
    kind: NotificationType,
) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND type = ?2",
        params![user_id.to_string(), kind.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}
