/*!
Assignments: a title, a free-text due date, and a free-text status.
*/
use rusqlite::{Row, types::Value};
use serde::{Deserialize, Serialize};

use super::Record;

pub const DEFAULT_STATUS: &str = "Pending";

fn default_status() -> String { DEFAULT_STATUS.to_owned() }

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub due_date: String,
    pub status: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NewAssignment {
    pub title: String,
    pub due_date: String,
    /// "Pending" if the form leaves it out.
    #[serde(default = "default_status")]
    pub status: String,
}

/// What an edit form supplies. Unlike creation, the status is required;
/// a full-row overwrite never falls back to "Pending".
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AssignmentChanges {
    pub title: String,
    pub due_date: String,
    pub status: String,
}

impl From<AssignmentChanges> for NewAssignment {
    fn from(c: AssignmentChanges) -> Self {
        let AssignmentChanges { title, due_date, status } = c;
        NewAssignment { title, due_date, status }
    }
}

impl Record for Assignment {
    type Fields = NewAssignment;

    const TABLE: &'static str = "assignments";
    const COLUMNS: &'static [&'static str] = &["title", "due_date", "status"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Assignment {
            id: row.get("id")?,
            title: row.get("title")?,
            due_date: row.get("due_date")?,
            status: row.get("status")?,
        })
    }

    fn values(fields: NewAssignment) -> Vec<Value> {
        vec![
            Value::Text(fields.title),
            Value::Text(fields.due_date),
            Value::Text(fields.status),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::test_store;

    #[test]
    fn status_defaults_to_pending() {
        let a: NewAssignment = serde_json::from_str(
            r#"{ "title": "Lab report", "due_date": "2024-10-01" }"#
        ).unwrap();
        assert_eq!(a.status, "Pending");
    }

    #[test]
    fn changes_need_status() {
        let c: Result<AssignmentChanges, _> = serde_json::from_str(
            r#"{ "title": "Lab report", "due_date": "2024-10-01" }"#
        );
        assert!(c.is_err());

        let c: AssignmentChanges = serde_json::from_str(
            r#"{ "title": "Lab report", "due_date": "2024-10-01", "status": "Completed" }"#
        ).unwrap();
        assert_eq!(NewAssignment::from(c).status, "Completed");
    }

    #[tokio::test]
    async fn assignment_lifecycle() {
        let (_dir, db) = test_store().await;

        let id = db.insert::<Assignment>(NewAssignment {
            title: "Lab report".to_owned(),
            due_date: "2024-10-01".to_owned(),
            status: default_status(),
        }).await.unwrap();

        let a = db.get::<Assignment>(id).await.unwrap().unwrap();
        assert_eq!(a.status, "Pending");

        let done = NewAssignment {
            title: "Lab report".to_owned(),
            due_date: "2024-10-03".to_owned(),
            status: "Completed".to_owned(),
        };
        db.update::<Assignment>(id, done.clone()).await.unwrap();
        let a = db.get::<Assignment>(id).await.unwrap().unwrap();
        assert_eq!((a.title, a.due_date, a.status), (done.title, done.due_date, done.status));

        db.delete::<Assignment>(id).await.unwrap();
        assert!(db.list::<Assignment>().await.unwrap().is_empty());
    }
}
