/*!
Students: a name, an age, and a free-text grade label.
*/
use rusqlite::{Row, types::Value};
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub age: i64,
    /// Only ever used to group students for counting.
    pub grade: String,
}

/// What a create or update form supplies for a `Student`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NewStudent {
    pub name: String,
    pub age: i64,
    pub grade: String,
}

impl Record for Student {
    type Fields = NewStudent;

    const TABLE: &'static str = "students";
    const COLUMNS: &'static [&'static str] = &["name", "age", "grade"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Student {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            grade: row.get("grade")?,
        })
    }

    fn values(fields: NewStudent) -> Vec<Value> {
        vec![
            Value::Text(fields.name),
            Value::Integer(fields.age),
            Value::Text(fields.grade),
        ]
    }
}
