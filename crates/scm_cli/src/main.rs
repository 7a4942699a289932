//! CLI entry point.
//!
//! # Responsibility
//! - Verify `scm_core` linkage with the ping/version probe.
//! - Load config, start logging, open the store and print both reports and
//!   an enrollment audit as JSON lines.

use log::error;
use scm_core::{
    init_logging, open_db, EnrollmentAudit, EntityKind, ReportService, ScmConfig,
    SqliteCourseRepository, SqliteStudentRepository, SqliteTransactionScope,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("scm_core ping={}", scm_core::ping());
    println!("scm_core version={}", scm_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = ScmConfig::from_env().map_err(|err| err.to_string())?;
    init_logging(&config.logging())?;

    let conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
    let reports = ReportService::new(
        SqliteStudentRepository::new(&conn),
        SqliteCourseRepository::new(&conn),
    );
    for kind in [EntityKind::Student, EntityKind::Course] {
        let report = reports.report(kind).map_err(|err| err.to_string())?;
        println!(
            "{}",
            serde_json::to_string(&report).map_err(|err| err.to_string())?
        );
    }

    let audit = EnrollmentAudit::new(
        SqliteStudentRepository::new(&conn),
        SqliteCourseRepository::new(&conn),
        SqliteTransactionScope::new(&conn),
    );
    let findings = audit.scan().map_err(|err| err.to_string())?;
    println!(
        "{}",
        serde_json::to_string(&findings).map_err(|err| err.to_string())?
    );
    Ok(())
}
