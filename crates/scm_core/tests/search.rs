use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use scm_core::db::open_db_in_memory;
use scm_core::{
    CourseDateRange, CourseService, ErrorKind, Gender, NewCourse, NewStudent,
    SqliteCourseRepository, SqliteStudentRepository, SqliteTransactionScope, StudentService,
};

fn day(year: i32, month: u32, date: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, date, 0, 0, 0).unwrap()
}

fn seed_students(conn: &Connection) {
    let service = StudentService::new(
        SqliteStudentRepository::new(conn),
        SqliteCourseRepository::new(conn),
        SqliteTransactionScope::new(conn),
    );
    for (en, km, phone) in [
        ("Sok Dara", "សុខ ដារា", "012 345 678"),
        ("Chan Sophea", "ចាន់ សុភា", "097 111 2222"),
        ("Keo Vanna", "កែវ វណ្ណា", "088 555 6666"),
    ] {
        service
            .create_student(&NewStudent {
                full_name_en: en.to_string(),
                full_name_km: km.to_string(),
                date_of_birth: day(2001, 1, 1),
                gender: Gender::Other,
                phone_number: phone.to_string(),
                courses: Vec::new(),
            })
            .unwrap();
    }
}

fn seed_courses(conn: &Connection) {
    let service = CourseService::new(
        SqliteCourseRepository::new(conn),
        SqliteStudentRepository::new(conn),
        SqliteTransactionScope::new(conn),
    );
    for (name, start, end) in [
        ("Math 101", day(2023, 9, 1), day(2023, 12, 15)),
        ("Physics", day(2024, 1, 8), day(2024, 5, 1)),
        ("Chemistry", day(2023, 6, 1), day(2023, 8, 30)),
    ] {
        service
            .create_course(&NewCourse {
                name: name.to_string(),
                professor_name: "Dr. Lim".to_string(),
                limit_number_of_students: 25,
                start_date: start,
                end_date: end,
                enrolled_students: Vec::new(),
            })
            .unwrap();
    }
}

fn sorted<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> Vec<String> {
    let mut names = items.iter().map(key).collect::<Vec<_>>();
    names.sort();
    names
}

#[test]
fn student_search_matches_names_and_phone_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    seed_students(&conn);
    let service = StudentService::new(
        SqliteStudentRepository::new(&conn),
        SqliteCourseRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );

    let by_en = service.search_students("sOK").unwrap();
    assert_eq!(sorted(by_en, |s| s.full_name_en.clone()), vec!["Sok Dara"]);

    let by_km = service.search_students("សុភា").unwrap();
    assert_eq!(sorted(by_km, |s| s.full_name_en.clone()), vec!["Chan Sophea"]);

    let by_phone = service.search_students("555").unwrap();
    assert_eq!(sorted(by_phone, |s| s.full_name_en.clone()), vec!["Keo Vanna"]);

    let err = service.search_students("zzz").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn student_search_folds_non_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    let service = StudentService::new(
        SqliteStudentRepository::new(&conn),
        SqliteCourseRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );
    service
        .create_student(&NewStudent {
            full_name_en: "Élodie Martin".to_string(),
            full_name_km: "អេឡូឌី ម៉ាទីន".to_string(),
            date_of_birth: day(2003, 7, 9),
            gender: Gender::Female,
            phone_number: "015 222 333".to_string(),
            courses: Vec::new(),
        })
        .unwrap();

    for term in ["Élodie", "élodie", "ÉLODIE", "lodie m"] {
        let found = service.search_students(term).unwrap();
        assert_eq!(
            sorted(found, |s| s.full_name_en.clone()),
            vec!["Élodie Martin"],
            "term {term:?} should match"
        );
    }
}

#[test]
fn course_search_folds_non_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    let service = CourseService::new(
        SqliteCourseRepository::new(&conn),
        SqliteStudentRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );
    service
        .create_course(&NewCourse {
            name: "Économie Générale".to_string(),
            professor_name: "Dr. Lim".to_string(),
            limit_number_of_students: 25,
            start_date: day(2024, 1, 8),
            end_date: day(2024, 5, 1),
            enrolled_students: Vec::new(),
        })
        .unwrap();

    let found = service.search_courses("économie générale").unwrap();
    assert_eq!(sorted(found, |c| c.name.clone()), vec!["Économie Générale"]);
    let found = service.search_courses("GÉNÉRALE").unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn deleted_students_are_not_searchable() {
    let conn = open_db_in_memory().unwrap();
    seed_students(&conn);
    let service = StudentService::new(
        SqliteStudentRepository::new(&conn),
        SqliteCourseRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );

    let found = service.search_students("Keo").unwrap();
    service
        .delete_student_by_id(&found[0].id.to_string())
        .unwrap();
    assert_eq!(
        service.search_students("Keo").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn course_search_matches_name() {
    let conn = open_db_in_memory().unwrap();
    seed_courses(&conn);
    let service = CourseService::new(
        SqliteCourseRepository::new(&conn),
        SqliteStudentRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );

    let found = service.search_courses("MATH").unwrap();
    assert_eq!(sorted(found, |c| c.name.clone()), vec!["Math 101"]);

    let err = service.search_courses("Lim").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn advance_search_with_both_bounds_returns_union() {
    let conn = open_db_in_memory().unwrap();
    seed_courses(&conn);
    let service = CourseService::new(
        SqliteCourseRepository::new(&conn),
        SqliteStudentRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );

    let range = CourseDateRange::parse(Some("2024-01-01"), Some("2023-09-30")).unwrap();
    let found = service.advance_search_courses(&range).unwrap();
    assert_eq!(
        sorted(found, |c| c.name.clone()),
        vec!["Chemistry", "Physics"]
    );
}

#[test]
fn advance_search_with_single_bound() {
    let conn = open_db_in_memory().unwrap();
    seed_courses(&conn);
    let service = CourseService::new(
        SqliteCourseRepository::new(&conn),
        SqliteStudentRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );

    let range = CourseDateRange::parse(Some("2023-09-01"), None).unwrap();
    let found = service.advance_search_courses(&range).unwrap();
    assert_eq!(
        sorted(found, |c| c.name.clone()),
        vec!["Math 101", "Physics"]
    );

    let range = CourseDateRange::parse(None, Some("2023-12-15T00:00:00Z")).unwrap();
    let found = service.advance_search_courses(&range).unwrap();
    assert_eq!(
        sorted(found, |c| c.name.clone()),
        vec!["Chemistry", "Math 101"]
    );

    let range = CourseDateRange::parse(Some("2030-01-01"), None).unwrap();
    let err = service.advance_search_courses(&range).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn advance_search_without_bounds_is_bad_request() {
    let conn = open_db_in_memory().unwrap();
    let service = CourseService::new(
        SqliteCourseRepository::new(&conn),
        SqliteStudentRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );

    let err = service
        .advance_search_courses(&CourseDateRange::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}
