use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use scm_core::db::open_db_in_memory;
use scm_core::{
    Course, CourseRepository, EnrollmentAudit, EnrollmentDrift, EntityKind, Gender, Report,
    ReportService, ServiceError, SqliteCourseRepository, SqliteStudentRepository,
    SqliteTransactionScope, Student, StudentRepository, TransactionScope,
};
use uuid::Uuid;

fn student(name: &str, phone: &str) -> Student {
    Student::new(
        name,
        "សុខ ដារា",
        Utc.with_ymd_and_hms(2000, 6, 1, 0, 0, 0).unwrap(),
        Gender::Male,
        phone,
    )
}

fn course(name: &str) -> Course {
    Course::new(
        name,
        "Dr. Chan",
        30,
        Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2023, 12, 15, 0, 0, 0).unwrap(),
    )
}

fn audit(
    conn: &Connection,
) -> EnrollmentAudit<
    SqliteStudentRepository<'_>,
    SqliteCourseRepository<'_>,
    SqliteTransactionScope<'_>,
> {
    EnrollmentAudit::new(
        SqliteStudentRepository::new(conn),
        SqliteCourseRepository::new(conn),
        SqliteTransactionScope::new(conn),
    )
}

#[test]
fn report_by_entity_kind_counts_relationships() {
    let conn = open_db_in_memory().unwrap();
    let students = SqliteStudentRepository::new(&conn);
    let courses = SqliteCourseRepository::new(&conn);

    let mut math = course("Math 101");
    let mut dara = student("Sok Dara", "012 345 678");
    math.enrolled_students = vec![dara.id];
    dara.courses = vec![math.id];
    courses.create(&math).unwrap();
    students.create(&dara).unwrap();

    let service = ReportService::new(
        SqliteStudentRepository::new(&conn),
        SqliteCourseRepository::new(&conn),
    );

    match service.report(EntityKind::Student).unwrap() {
        Report::Students(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].full_name_en, "Sok Dara");
            assert_eq!(rows[0].number_of_courses, 1);
        }
        other => panic!("unexpected report: {other:?}"),
    }
    match service.report(EntityKind::Course).unwrap() {
        Report::Courses(rows) => {
            assert_eq!(rows[0].number_of_registered_students, 1);
        }
        other => panic!("unexpected report: {other:?}"),
    }
}

#[test]
fn empty_report_is_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let service = ReportService::new(
        SqliteStudentRepository::new(&conn),
        SqliteCourseRepository::new(&conn),
    );
    assert!(service.report(EntityKind::Course).unwrap().is_empty());
}

#[test]
fn report_serializes_with_entity_tag() {
    let report = Report::Courses(Vec::new());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["entity"], "courses");
    assert!(json["rows"].as_array().unwrap().is_empty());
}

#[test]
fn failed_scope_rolls_back_every_write() {
    let conn = open_db_in_memory().unwrap();
    let students = SqliteStudentRepository::new(&conn);
    let courses = SqliteCourseRepository::new(&conn);
    let scope = SqliteTransactionScope::new(&conn);

    let result: Result<(), ServiceError> = scope.atomically(|| {
        students.create(&student("Sok Dara", "012 345 678"))?;
        courses.create(&course("Math 101"))?;
        Err(ServiceError::NotFound("stop".to_string()))
    });
    assert!(result.is_err());
    assert!(students.find_all().is_err());
    assert!(courses.find_all().is_err());

    let committed: Result<Student, ServiceError> =
        scope.atomically(|| Ok(students.create(&student("Sok Dara", "012 345 678"))?));
    let committed = committed.unwrap();
    assert_eq!(students.find_by_id(committed.id).unwrap().id, committed.id);
}

#[test]
fn consistent_store_has_no_drift() {
    let conn = open_db_in_memory().unwrap();
    let mut math = course("Math 101");
    let mut dara = student("Sok Dara", "012 345 678");
    math.enrolled_students = vec![dara.id];
    dara.courses = vec![math.id];
    SqliteCourseRepository::new(&conn).create(&math).unwrap();
    SqliteStudentRepository::new(&conn).create(&dara).unwrap();

    let report = audit(&conn).scan().unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.students_checked, 1);
    assert_eq!(report.courses_checked, 1);
}

#[test]
fn repair_completes_one_sided_links_and_prunes_dangling_ones() {
    let conn = open_db_in_memory().unwrap();
    let students = SqliteStudentRepository::new(&conn);
    let courses = SqliteCourseRepository::new(&conn);

    let math = course("Math 101");
    let mut physics = course("Physics");
    let mut dara = student("Sok Dara", "012 345 678");
    let sophea = student("Chan Sophea", "097 111 2222");
    let ghost = Uuid::new_v4();

    dara.courses = vec![math.id, ghost];
    physics.enrolled_students = vec![sophea.id];
    courses.create(&math).unwrap();
    courses.create(&physics).unwrap();
    students.create(&dara).unwrap();
    students.create(&sophea).unwrap();

    let found = audit(&conn).scan().unwrap();
    assert_eq!(found.drift.len(), 3);
    assert!(found.drift.contains(&EnrollmentDrift::MissingOnCourse {
        student_id: dara.id,
        course_id: math.id,
    }));
    assert!(found.drift.contains(&EnrollmentDrift::DanglingCourse {
        student_id: dara.id,
        course_id: ghost,
    }));
    assert!(found.drift.contains(&EnrollmentDrift::MissingOnStudent {
        student_id: sophea.id,
        course_id: physics.id,
    }));

    let repaired = audit(&conn).repair().unwrap();
    assert_eq!(repaired.drift.len(), 3);
    assert!(audit(&conn).scan().unwrap().is_consistent());

    assert_eq!(students.find_by_id(dara.id).unwrap().courses, vec![math.id]);
    assert_eq!(courses.find_by_id(math.id).unwrap().enrolled_students, vec![dara.id]);
    assert_eq!(students.find_by_id(sophea.id).unwrap().courses, vec![physics.id]);
}

#[test]
fn repair_prunes_links_to_deleted_students() {
    let conn = open_db_in_memory().unwrap();
    let students = SqliteStudentRepository::new(&conn);
    let courses = SqliteCourseRepository::new(&conn);

    let mut math = course("Math 101");
    let mut dara = student("Sok Dara", "012 345 678");
    math.enrolled_students = vec![dara.id];
    dara.courses = vec![math.id];
    courses.create(&math).unwrap();
    students.create(&dara).unwrap();
    students.soft_delete(dara.id).unwrap();

    let report = audit(&conn).repair().unwrap();
    assert_eq!(
        report.drift,
        vec![EnrollmentDrift::DanglingStudent {
            student_id: dara.id,
            course_id: math.id,
        }]
    );
    assert!(courses
        .find_by_id(math.id)
        .unwrap()
        .enrolled_students
        .is_empty());
}
