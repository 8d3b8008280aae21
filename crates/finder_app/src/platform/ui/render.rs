use finder_core::{AppViewModel, BulkJobView, EmailResult, JobType, RequestKind, Tab};

/// Renders the view model as terminal lines. Pure, so it can run after every dirty update.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = match view.tab {
        Tab::Find | Tab::Verify => render_dispatch(view),
        Tab::Bulk => render_bulk(view),
    };
    if let Some(error) = &view.error {
        lines.push(format!("Error: {error}"));
    }
    lines
}

/// Lines of `next` that were not already shown in `previous`.
pub fn fresh_lines<'a>(previous: &[String], next: &'a [String]) -> Vec<&'a str> {
    next.iter()
        .filter(|line| !previous.contains(line))
        .map(String::as_str)
        .collect()
}

fn render_dispatch(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    match view.loading {
        Some(RequestKind::Find) => lines.push("Searching for email addresses...".to_string()),
        Some(RequestKind::Verify) => lines.push("Verifying email address...".to_string()),
        None => {}
    }
    if view.results_for.is_some() {
        if view.results.is_empty() {
            lines.push("No email addresses found.".to_string());
        }
        lines.extend(view.results.iter().map(format_result));
    }
    lines
}

fn format_result(result: &EmailResult) -> String {
    let email = if result.email.is_empty() {
        "(none)"
    } else {
        result.email.as_str()
    };
    let mut line = format!("{email:<40} {:<10}", result.status.to_string());
    if let Some(confidence) = result.confidence {
        line.push_str(&format!(" {:>4.0}%", confidence * 100.0));
    }
    if !result.reason.is_empty() {
        line.push_str("  ");
        line.push_str(&result.reason);
    }
    line
}

fn render_bulk(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if view.bulk_submitting {
        let name = view
            .bulk_form
            .file
            .as_deref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(format!("Uploading {name}..."));
    }
    if let Some(job) = &view.job {
        lines.extend(render_job(job));
        if view.can_download && view.last_download.is_none() {
            lines.push("Results ready for download.".to_string());
        }
    }
    if let Some(saved) = &view.last_download {
        lines.push(format!(
            "Saved {} bytes to {}",
            saved.bytes,
            saved.path.display()
        ));
    }
    lines
}

fn render_job(job: &BulkJobView) -> Vec<String> {
    let label = match job.job_type {
        JobType::BulkFind => "Bulk find",
        JobType::BulkVerify => "Bulk verify",
    };
    let mut lines = vec![format!(
        "{label} job {}: {} {:.0}% ({}/{} rows, {} ok, {} errors)",
        job.job_id,
        job.status,
        job.progress,
        job.processed_rows,
        job.total_rows,
        job.success_rows,
        job.error_rows
    )];
    if let Some(message) = &job.message {
        lines.push(format!("  {message}"));
    }
    lines.extend(job.recent_errors.iter().map(|err| format!("  ! {err}")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use finder_core::{BulkForm, EmailStatus, JobStatus, SavedDownload};
    use std::path::PathBuf;

    fn result(email: &str, status: EmailStatus, confidence: Option<f64>, reason: &str) -> EmailResult {
        EmailResult {
            email: email.to_string(),
            status,
            reason: reason.to_string(),
            confidence,
            details: None,
        }
    }

    fn job_view(status: JobStatus) -> BulkJobView {
        BulkJobView {
            job_id: "job-1".to_string(),
            job_type: JobType::BulkVerify,
            status,
            progress: 40.0,
            total_rows: 5,
            processed_rows: 2,
            success_rows: 1,
            error_rows: 1,
            message: None,
            recent_errors: vec!["row 2: timeout".to_string()],
        }
    }

    #[test]
    fn loading_shows_only_spinner_text() {
        let view = AppViewModel {
            tab: Tab::Verify,
            loading: Some(RequestKind::Verify),
            ..AppViewModel::default()
        };
        assert_eq!(render(&view), vec!["Verifying email address...".to_string()]);
    }

    #[test]
    fn results_render_in_server_order() {
        let view = AppViewModel {
            tab: Tab::Find,
            results_for: Some(RequestKind::Find),
            results: vec![
                result("ada@example.com", EmailStatus::Valid, Some(0.92), "SMTP accepted"),
                result("a.l@example.com", EmailStatus::CatchAll, None, ""),
            ],
            ..AppViewModel::default()
        };
        let lines = render(&view);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ada@example.com"));
        assert!(lines[0].contains("valid"));
        assert!(lines[0].contains("92%"));
        assert!(lines[0].ends_with("SMTP accepted"));
        assert!(lines[1].contains("catch-all"));
        assert!(!lines[1].contains('%'));
    }

    #[test]
    fn empty_find_says_so_and_idle_says_nothing() {
        let empty = AppViewModel {
            results_for: Some(RequestKind::Find),
            ..AppViewModel::default()
        };
        assert_eq!(render(&empty), vec!["No email addresses found.".to_string()]);
        assert!(render(&AppViewModel::default()).is_empty());
    }

    #[test]
    fn error_is_last_line() {
        let view = AppViewModel {
            error: Some("Request timed out. Please check if the backend server is running.".into()),
            ..AppViewModel::default()
        };
        assert_eq!(
            render(&view),
            vec![
                "Error: Request timed out. Please check if the backend server is running."
                    .to_string()
            ]
        );
    }

    #[test]
    fn bulk_job_shows_counts_and_recent_errors() {
        let view = AppViewModel {
            tab: Tab::Bulk,
            job: Some(job_view(JobStatus::Running)),
            polling: true,
            ..AppViewModel::default()
        };
        assert_eq!(
            render(&view),
            vec![
                "Bulk verify job job-1: running 40% (2/5 rows, 1 ok, 1 errors)".to_string(),
                "  ! row 2: timeout".to_string(),
            ]
        );
    }

    #[test]
    fn bulk_upload_and_download_lines() {
        let uploading = AppViewModel {
            tab: Tab::Bulk,
            bulk_submitting: true,
            bulk_form: BulkForm {
                file: Some(PathBuf::from("/tmp/people.csv")),
                ..BulkForm::default()
            },
            ..AppViewModel::default()
        };
        assert_eq!(render(&uploading), vec!["Uploading people.csv...".to_string()]);

        let ready = AppViewModel {
            tab: Tab::Bulk,
            job: Some(job_view(JobStatus::Completed)),
            can_download: true,
            ..AppViewModel::default()
        };
        assert!(render(&ready).contains(&"Results ready for download.".to_string()));

        let saved = AppViewModel {
            last_download: Some(SavedDownload {
                path: PathBuf::from("output/results.csv"),
                bytes: 42,
            }),
            ..ready
        };
        let lines = render(&saved);
        assert!(!lines.contains(&"Results ready for download.".to_string()));
        assert!(lines.contains(&"Saved 42 bytes to output/results.csv".to_string()));
    }

    #[test]
    fn fresh_lines_skip_what_was_printed() {
        let previous = vec!["a".to_string(), "b".to_string()];
        let next = vec!["b".to_string(), "c".to_string()];
        assert_eq!(fresh_lines(&previous, &next), vec!["c"]);
    }
}
