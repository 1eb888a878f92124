/*!
Aggregate counts shown on the dashboard and listing pages.

These are recomputed from a fresh read of the store on every page view.
*/
use std::collections::HashMap;

use serde::Serialize;

use crate::store::{Assignment, Course, Student};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

/// Number of students in each grade, in the order grades are first seen.
pub fn grades_count(students: &[Student]) -> Vec<GradeCount> {
    let mut counts: Vec<GradeCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for s in students.iter() {
        match index.get(s.grade.as_str()) {
            Some(&n) => { counts[n].count += 1; },
            None => {
                index.insert(s.grade.as_str(), counts.len());
                counts.push(GradeCount { grade: s.grade.clone(), count: 1 });
            },
        }
    }

    counts
}

fn status_is(a: &Assignment, status: &str) -> bool {
    a.status.to_lowercase() == status
}

/// Assignments whose status is some capitalization of "pending".
pub fn pending_count(assignments: &[Assignment]) -> usize {
    assignments.iter().filter(|a| status_is(a, "pending")).count()
}

/// Assignments whose status is some capitalization of "completed".
pub fn completed_count(assignments: &[Assignment]) -> usize {
    assignments.iter().filter(|a| status_is(a, "completed")).count()
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StudentStats {
    pub total_students: usize,
    pub grades_count: Vec<GradeCount>,
}

impl StudentStats {
    pub fn new(students: &[Student]) -> Self {
        Self {
            total_students: students.len(),
            grades_count: grades_count(students),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CourseStats {
    pub total_courses: usize,
}

impl CourseStats {
    pub fn new(courses: &[Course]) -> Self {
        Self { total_courses: courses.len() }
    }
}

/// Statuses other than pending/completed land in neither bucket.
#[derive(Debug, PartialEq, Serialize)]
pub struct AssignmentStats {
    pub total_assignments: usize,
    pub pending_assignments: usize,
    pub completed_assignments: usize,
}

impl AssignmentStats {
    pub fn new(assignments: &[Assignment]) -> Self {
        Self {
            total_assignments: assignments.len(),
            pending_assignments: pending_count(assignments),
            completed_assignments: completed_count(assignments),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_courses: usize,
    pub total_assignments: usize,
    pub pending_assignments: usize,
    pub completed_assignments: usize,
    pub grades_count: Vec<GradeCount>,
}

impl DashboardStats {
    pub fn new(
        students: &[Student],
        courses: &[Course],
        assignments: &[Assignment],
    ) -> Self {
        let s = StudentStats::new(students);
        let a = AssignmentStats::new(assignments);

        Self {
            total_students: s.total_students,
            total_courses: courses.len(),
            total_assignments: a.total_assignments,
            pending_assignments: a.pending_assignments,
            completed_assignments: a.completed_assignments,
            grades_count: s.grades_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, name: &str, age: i64, grade: &str) -> Student {
        Student { id, name: name.to_owned(), age, grade: grade.to_owned() }
    }

    fn assignment(id: i64, status: &str) -> Assignment {
        Assignment {
            id,
            title: format!("Assignment {}", &id),
            due_date: "2024-10-01".to_owned(),
            status: status.to_owned(),
        }
    }

    fn gc(grade: &str, count: usize) -> GradeCount {
        GradeCount { grade: grade.to_owned(), count }
    }

    #[test]
    fn same_grade() {
        let students = [
            student(1, "Bob", 14, "8th"),
            student(2, "Cara", 13, "8th"),
        ];
        assert_eq!(grades_count(&students), vec![gc("8th", 2)]);
    }

    #[test]
    fn first_seen_grade_order() {
        let students = [
            student(1, "Dan", 15, "9th"),
            student(2, "Bob", 14, "8th"),
            student(3, "Eve", 16, "10th"),
            student(4, "Cara", 13, "8th"),
            student(5, "Fay", 15, "9th"),
            student(6, "Gus", 15, "9th"),
        ];
        assert_eq!(
            grades_count(&students),
            vec![gc("9th", 3), gc("8th", 2), gc("10th", 1)]
        );

        let stats = StudentStats::new(&students);
        assert_eq!(stats.total_students, 6);
    }

    #[test]
    fn no_students() {
        assert!(grades_count(&[]).is_empty());
        assert_eq!(StudentStats::new(&[]).total_students, 0);
    }

    #[test]
    fn status_buckets() {
        let assignments: Vec<Assignment> = ["Pending", "completed", "PENDING", "Archived"]
            .iter()
            .enumerate()
            .map(|(n, s)| assignment(n as i64 + 1, s))
            .collect();

        assert_eq!(
            AssignmentStats::new(&assignments),
            AssignmentStats {
                total_assignments: 4,
                pending_assignments: 2,
                completed_assignments: 1,
            }
        );
    }

    #[test]
    fn dashboard() {
        let students = [student(1, "Bob", 14, "8th")];
        let courses = [Course {
            id: 1,
            course_name: "Physics I".to_owned(),
            teacher: "Mr Berro".to_owned(),
        }];
        let assignments = [assignment(1, "pending"), assignment(2, "Completed")];

        let stats = DashboardStats::new(&students, &courses, &assignments);
        assert_eq!(
            stats,
            DashboardStats {
                total_students: 1,
                total_courses: 1,
                total_assignments: 2,
                pending_assignments: 1,
                completed_assignments: 1,
                grades_count: vec![gc("8th", 1)],
            }
        );
        assert_eq!(CourseStats::new(&courses).total_courses, 1);
    }
}
