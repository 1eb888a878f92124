/*!
Courses: a name and whoever teaches it.
*/
use rusqlite::{Row, types::Value};
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Course {
    pub id: i64,
    pub course_name: String,
    pub teacher: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NewCourse {
    pub course_name: String,
    pub teacher: String,
}

impl Record for Course {
    type Fields = NewCourse;

    const TABLE: &'static str = "courses";
    const COLUMNS: &'static [&'static str] = &["course_name", "teacher"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Course {
            id: row.get("id")?,
            course_name: row.get("course_name")?,
            teacher: row.get("teacher")?,
        })
    }

    fn values(fields: NewCourse) -> Vec<Value> {
        vec![
            Value::Text(fields.course_name),
            Value::Text(fields.teacher),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::test_store;

    static COURSES: &[(&str, &str)] = &[
        ("Physics I", "Mr Berro"),
        ("Algebra II", "Ms Jenny"),
        ("Chemistry", "Mr Irfan"),
    ];

    #[tokio::test]
    async fn course_lifecycle() {
        let (_dir, db) = test_store().await;

        let mut ids = Vec::new();
        for (course_name, teacher) in COURSES.iter() {
            let id = db.insert::<Course>(NewCourse {
                course_name: course_name.to_string(),
                teacher: teacher.to_string(),
            }).await.unwrap();
            ids.push(id);
        }

        let courses = db.list::<Course>().await.unwrap();
        assert_eq!(courses.len(), COURSES.len());
        for ((c, id), (course_name, teacher)) in courses.iter().zip(ids.iter()).zip(COURSES.iter()) {
            assert_eq!(
                (*id, *course_name, *teacher),
                (c.id, c.course_name.as_str(), c.teacher.as_str())
            );
        }

        db.update::<Course>(ids[1], NewCourse {
            course_name: "Algebra III".to_owned(),
            teacher: "Ms Jenny".to_owned(),
        }).await.unwrap();
        let c = db.get::<Course>(ids[1]).await.unwrap().unwrap();
        assert_eq!(c.course_name, "Algebra III");

        db.delete::<Course>(ids[0]).await.unwrap();
        assert_eq!(db.get::<Course>(ids[0]).await.unwrap(), None);
        assert_eq!(db.list::<Course>().await.unwrap().len(), 2);
    }
}
