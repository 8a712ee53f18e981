// CSV export for the applications table and the saved-jobs list.
//
// The header row comes first and is quoted only where needed; every data
// cell is quoted with embedded quotes doubled. Rows are joined with `\n`. An empty input is reported as
// `ExportError::Empty` instead of producing a header-only file.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::errors::AppError;
use crate::models::{Application, Job};

pub const APPLICATIONS_FILE: &str = "applications.csv";
pub const SAVED_JOBS_FILE: &str = "saved-jobs.csv";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No {0} to export.")]
    Empty(&'static str),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV flush error: {0}")]
    Flush(String),

    #[error("CSV output was not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A record with a fixed column schema.
pub trait CsvRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl CsvRow for Application {
    const HEADERS: &'static [&'static str] = &[
        "Job Title",
        "Company",
        "Location",
        "Applicant Name",
        "Applicant Email",
        "Resume URL",
        "Intro",
        "Applied At",
    ];

    fn cells(&self) -> Vec<String> {
        let job = self.job.clone().unwrap_or_default();
        vec![
            job.title,
            job.company,
            job.location,
            self.name.clone(),
            self.email.clone(),
            self.resume_url.clone(),
            self.intro.clone(),
            self.created_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
        ]
    }
}

impl CsvRow for Job {
    const HEADERS: &'static [&'static str] = &["Title", "Company", "Location", "Type", "Description"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.company.clone(),
            self.location.clone(),
            self.job_type.clone(),
            collapse_whitespace(&self.description),
        ]
    }
}

/// Replaces each run of whitespace (including newlines) with one space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

fn csv_writer(style: QuoteStyle, buffer: Vec<u8>) -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(style)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buffer)
}

pub fn to_csv<R: CsvRow>(rows: &[R], what: &'static str) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty(what));
    }

    let mut header = csv_writer(QuoteStyle::Necessary, Vec::new());
    header.write_record(R::HEADERS)?;
    let buffer = header
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;

    let mut writer = csv_writer(QuoteStyle::Always, buffer);
    for row in rows {
        writer.write_record(row.cells())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Renders rows as a CSV download, or `204 No Content` when there is
/// nothing to export.
pub fn export_response<R: CsvRow>(
    rows: &[R],
    what: &'static str,
    file_name: &str,
) -> Result<Response, AppError> {
    match to_csv(rows, what) {
        Ok(body) => Ok(csv_attachment(file_name, body)),
        Err(ExportError::Empty(what)) => {
            tracing::info!("No {what} to export");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(e) => Err(AppError::Internal(e.into())),
    }
}

/// Wraps CSV text as a file download.
pub fn csv_attachment(file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::application::JobSummary;

    #[test]
    fn test_saved_job_row_is_quoted_and_collapsed() {
        let job = Job {
            title: "A \"B\"".into(),
            company: "C".into(),
            location: "L".into(),
            job_type: "T".into(),
            description: "x  y".into(),
            ..Job::default()
        };
        let csv = to_csv(&[job], "saved jobs").unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Title,Company,Location,Type,Description"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(r#""A ""B""""#));
        assert!(row.ends_with(r#""x y""#));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_input_is_a_no_op() {
        let err = to_csv::<Job>(&[], "saved jobs").unwrap_err();
        assert!(matches!(err, ExportError::Empty("saved jobs")));
        assert_eq!(err.to_string(), "No saved jobs to export.");
    }

    #[test]
    fn test_missing_fields_export_as_empty_strings() {
        let csv = to_csv(&[Application::default()], "applications").unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, r#""","","","","","","","""#);
    }

    #[test]
    fn test_application_row_includes_joined_job_and_timestamp() {
        let app = Application {
            name: "Ada".into(),
            email: "ada@x.io".into(),
            intro: "line one\nline \"two\"".into(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            job: Some(JobSummary {
                title: "SRE".into(),
                company: "Acme".into(),
                location: "Oslo".into(),
            }),
            ..Application::default()
        };
        let csv = to_csv(&[app], "applications").unwrap();
        assert!(csv.starts_with(
            "Job Title,Company,Location,Applicant Name,Applicant Email,Resume URL,Intro,Applied At\n"
        ));
        assert!(csv.contains(r#""SRE","Acme","Oslo","Ada","ada@x.io","","line one"#));
        assert!(csv.contains(r#"line ""two""""#));
        assert!(csv.ends_with(r#""2024-01-02T03:04:05+00:00""#));
    }

    #[test]
    fn test_collapse_whitespace_keeps_single_edges() {
        assert_eq!(collapse_whitespace("  a\t\tb\n\nc "), " a b c ");
    }

    #[test]
    fn test_empty_export_answers_no_content() {
        let response = export_response::<Job>(&[], "saved jobs", SAVED_JOBS_FILE).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_export_sets_attachment_headers() {
        let job = Job {
            title: "T".into(),
            ..Job::default()
        };
        let response = export_response(&[job], "saved jobs", SAVED_JOBS_FILE).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert_eq!(disposition, "attachment; filename=\"saved-jobs.csv\"");
    }
}
