//! Comparison runner
//!
//! Drives a batch through Idle -> Running -> Done. Each case is posted to
//! server A then server B, both bodies are normalized and diffed, and
//! divergent cases become report rows. Cases may be dispatched concurrently,
//! but outcomes are consumed in input order so rows and log lines keep the
//! order of the input file.

use futures::stream::{self, StreamExt};
use std::io::Write;
use tracing::{info, warn};

use crate::compare::{diff, Normalizer};
use crate::error::{CompareError, CompareResult};
use crate::http::EndpointClient;
use crate::models::{CaseOutcome, ComparisonResult, RunSummary, TestCase, Verdict};
use crate::output::ReportWriter;
use crate::utils::{format_duration, RunTimer};

/// What to do when a case cannot be compared
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole batch on the first failure
    FailFast,
    /// Record the failure as a report row and continue
    KeepGoing,
}

/// Lifecycle of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Done,
}

/// The two servers under comparison
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub server_a: String,
    pub server_b: String,
}

impl Endpoints {
    pub fn new(server_a: impl Into<String>, server_b: impl Into<String>) -> Self {
        Self {
            server_a: server_a.into(),
            server_b: server_b.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    matched: usize,
    divergent: usize,
    failed: usize,
    verdicts: Vec<(String, Verdict)>,
}

impl Tally {
    fn record(&mut self, case_id: String, verdict: Verdict) {
        match verdict {
            Verdict::Ok => self.matched += 1,
            Verdict::Divergent => self.divergent += 1,
            Verdict::Error => self.failed += 1,
        }
        self.verdicts.push((case_id, verdict));
    }
}

/// Runner comparing every case of a batch against two endpoints
pub struct ComparisonRunner {
    client: EndpointClient,
    endpoints: Endpoints,
    normalizer: Normalizer,
    concurrency: usize,
    policy: FailurePolicy,
    state: RunState,
}

impl ComparisonRunner {
    /// Create a sequential, fail-fast runner
    pub fn new(client: EndpointClient, endpoints: Endpoints) -> Self {
        Self {
            client,
            endpoints,
            normalizer: Normalizer::new(),
            concurrency: 1,
            policy: FailurePolicy::FailFast,
            state: RunState::Idle,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Maximum number of cases in flight
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Compare one case, capturing any failure in the outcome
    pub async fn compare_case(&self, case: &TestCase) -> CaseOutcome {
        match self.try_compare(case).await {
            Ok(result) => CaseOutcome::Compared {
                case_id: case.id.clone(),
                result,
            },
            Err(error) => CaseOutcome::Failed {
                case_id: case.id.clone(),
                error,
            },
        }
    }

    async fn try_compare(&self, case: &TestCase) -> CompareResult<ComparisonResult> {
        let raw_a = self.client.send(&case.input, &self.endpoints.server_a).await?;
        let doc_a = self.normalizer.normalize(&raw_a)?;

        let raw_b = self.client.send(&case.input, &self.endpoints.server_b).await?;
        let doc_b = self.normalizer.normalize(&raw_b)?;

        Ok(diff(&doc_a, &doc_b))
    }

    /// Run the whole batch, writing the report to `report` and one verdict
    /// line per case to `log`
    ///
    /// Under [`FailurePolicy::FailFast`] the first failing case aborts the run:
    /// rows written so far are flushed and the summary row is not written.
    pub async fn run<W: Write, L: Write>(
        &mut self,
        cases: Vec<TestCase>,
        mut report: ReportWriter<W>,
        log: &mut L,
    ) -> CompareResult<RunSummary> {
        report.write_header()?;
        self.state = RunState::Running;

        info!(
            "Comparing {} cases: A={} B={} ({} concurrent)",
            cases.len(),
            self.endpoints.server_a,
            self.endpoints.server_b,
            self.concurrency
        );

        let timer = RunTimer::start();
        let started_at = timer.started_at();

        let tally = match self.process(&cases, &mut report, log).await {
            Ok(tally) => tally,
            Err(e) => {
                warn!("Run aborted after {} report rows", report.rows());
                if let Err(flush_err) = report.flush() {
                    warn!("Failed to flush report after abort: {}", flush_err);
                }
                return Err(e);
            }
        };

        let (elapsed, finished_at) = timer.stop();
        let elapsed_display = format_duration(elapsed);

        writeln!(log, "Test completed, time: {elapsed_display}").map_err(CompareError::Log)?;
        report.write_summary(&elapsed_display)?;
        report.finish()?;
        self.state = RunState::Done;

        let summary = RunSummary {
            total: cases.len(),
            matched: tally.matched,
            divergent: tally.divergent,
            failed: tally.failed,
            started_at,
            finished_at,
            elapsed_display,
            verdicts: tally.verdicts,
        };

        info!(
            "Run completed - ok: {}, divergent: {}, error: {} of {}",
            summary.matched, summary.divergent, summary.failed, summary.total
        );

        Ok(summary)
    }

    async fn process<W: Write, L: Write>(
        &self,
        cases: &[TestCase],
        report: &mut ReportWriter<W>,
        log: &mut L,
    ) -> CompareResult<Tally> {
        let mut tally = Tally::default();

        let mut outcomes = stream::iter(cases)
            .map(|case| self.compare_case(case))
            .buffered(self.concurrency);

        while let Some(outcome) = outcomes.next().await {
            let verdict = outcome.verdict();
            let line = outcome.log_line();

            match outcome {
                CaseOutcome::Compared { case_id, result } => {
                    if let Some(text) = result.diff_text() {
                        report.write_divergence(&case_id, text)?;
                    }
                    tally.record(case_id, verdict);
                }
                CaseOutcome::Failed { case_id, error } => match self.policy {
                    FailurePolicy::FailFast => return Err(error),
                    FailurePolicy::KeepGoing => {
                        warn!("Test {} failed ({}): {}", case_id, error.kind(), error);
                        report.write_failure(&case_id, &error.to_string())?;
                        tally.record(case_id, verdict);
                    }
                },
            }

            writeln!(log, "{line}").map_err(CompareError::Log)?;
        }

        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    type Handler = fn(&str) -> (StatusCode, String);

    /// Start a stub endpoint. A payload carrying `"delay_ms": n` is answered
    /// after sleeping n milliseconds.
    async fn spawn_endpoint(handler: Handler) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let app = Router::new().route(
            "/calc",
            post(move |body: String| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let delay = serde_json::from_str::<serde_json::Value>(&body)
                        .ok()
                        .and_then(|v| v.get("delay_ms").and_then(|d| d.as_u64()));
                    if let Some(ms) = delay {
                        tokio::time::sleep(Duration::from_millis(ms)).await;
                    }
                    handler(&body)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/calc"), hits)
    }

    fn echo(body: &str) -> (StatusCode, String) {
        (StatusCode::OK, body.to_string())
    }

    fn runner(a: &str, b: &str) -> ComparisonRunner {
        let client = EndpointClient::builder().build().unwrap();
        ComparisonRunner::new(client, Endpoints::new(a, b))
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    fn report_in(dir: &TempDir) -> (std::path::PathBuf, ReportWriter<std::fs::File>) {
        let path = dir.path().join("cases-out.csv");
        let report = ReportWriter::create(&path).unwrap();
        (path, report)
    }

    fn log_lines(log: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(log).lines().map(String::from).collect()
    }

    fn verdict_of(summary: &RunSummary, case_id: &str) -> Option<Verdict> {
        summary
            .verdicts
            .iter()
            .find(|(id, _)| id == case_id)
            .map(|(_, verdict)| *verdict)
    }

    #[tokio::test]
    async fn test_matching_responses_write_no_row() {
        let (a, _) = spawn_endpoint(|_| (StatusCode::OK, r#"{"a":1,"log":"x"}"#.into())).await;
        let (b, _) = spawn_endpoint(|_| {
            (StatusCode::OK, r#"{"log":"y","a":1.0,"dtES":"now"}"#.into())
        })
        .await;

        let dir = TempDir::new().unwrap();
        let (path, report) = report_in(&dir);
        let mut runner = runner(&a, &b);
        assert_eq!(runner.state(), RunState::Idle);

        let mut log = Vec::new();
        let cases = vec![TestCase::new("T1", r#"{"a":1}"#, "anything")];
        let summary = runner.run(cases, report, &mut log).await.unwrap();

        assert_eq!(runner.state(), RunState::Done);
        assert_eq!(verdict_of(&summary, "T1"), Some(Verdict::Ok));
        assert_eq!(summary.matched, summary.total);

        let lines = log_lines(&log);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Test ID: T1, ok");
        assert_eq!(
            lines[1],
            format!("Test completed, time: {}", summary.elapsed_display)
        );

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["CALCTEST ID", "TEST", "DIFERENCES"]);
        assert_eq!(rows[1].len(), 4);
        assert_eq!(rows[1][0], "END");
        assert_eq!(rows[1][1], summary.elapsed_display);
        assert!(!rows[1][1].is_empty());
    }

    #[tokio::test]
    async fn test_divergent_response_writes_row() {
        let (a, _) = spawn_endpoint(|_| (StatusCode::OK, r#"{"a":1,"log":"x"}"#.into())).await;
        let (b, _) = spawn_endpoint(|_| (StatusCode::OK, r#"{"a":2}"#.into())).await;

        let dir = TempDir::new().unwrap();
        let (path, report) = report_in(&dir);

        let mut log = Vec::new();
        let cases = vec![TestCase::new("T1", r#"{"a":1}"#, "")];
        let summary = runner(&a, &b).run(cases, report, &mut log).await.unwrap();

        assert_eq!(summary.divergent, 1);
        assert_eq!(verdict_of(&summary, "T1"), Some(Verdict::Divergent));
        assert_eq!(log_lines(&log)[0], "Test ID: T1, divergent");

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "T1");
        assert_eq!(rows[1][1], "");
        assert!(rows[1][2].contains("$.a"));
        assert_eq!(rows[2][0], "END");
    }

    #[tokio::test]
    async fn test_server_error_aborts_batch() {
        let (a, a_hits) = spawn_endpoint(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "{}".into())
        })
        .await;
        let (b, b_hits) = spawn_endpoint(echo).await;

        let dir = TempDir::new().unwrap();
        let (path, report) = report_in(&dir);

        let cases = vec![
            TestCase::new("T1", "{}", ""),
            TestCase::new("T2", "{}", ""),
        ];
        let mut log = Vec::new();
        let mut runner = runner(&a, &b);
        let err = runner.run(cases, report, &mut log).await.unwrap_err();

        assert!(matches!(
            err,
            CompareError::UnexpectedStatus { ref status, .. } if status == "500 Internal Server Error"
        ));
        assert_eq!(runner.state(), RunState::Running);
        assert_eq!(a_hits.load(Ordering::SeqCst), 1);
        assert_eq!(b_hits.load(Ordering::SeqCst), 0);
        assert!(log.is_empty());

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|row| row[0] != "END"));
    }

    #[tokio::test]
    async fn test_rows_before_abort_are_kept() {
        let (a, _) = spawn_endpoint(echo).await;
        let (b, _) = spawn_endpoint(|body| {
            if body.contains("fail") {
                (StatusCode::BAD_GATEWAY, String::new())
            } else {
                (StatusCode::OK, r#"{"a":99}"#.into())
            }
        })
        .await;

        let dir = TempDir::new().unwrap();
        let (path, report) = report_in(&dir);

        let cases = vec![
            TestCase::new("T1", r#"{"a":1}"#, ""),
            TestCase::new("T2", r#"{"fail":true}"#, ""),
            TestCase::new("T3", r#"{"a":1}"#, ""),
        ];
        let mut log = Vec::new();
        assert!(runner(&a, &b).run(cases, report, &mut log).await.is_err());
        assert_eq!(log_lines(&log), vec!["Test ID: T1, divergent"]);

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "T1");
    }

    #[tokio::test]
    async fn test_non_200_success_is_failure() {
        let (a, _) = spawn_endpoint(|_| (StatusCode::NO_CONTENT, String::new())).await;
        let (b, _) = spawn_endpoint(echo).await;

        let dir = TempDir::new().unwrap();
        let (_, report) = report_in(&dir);

        let cases = vec![TestCase::new("T1", "{}", "")];
        let err = runner(&a, &b)
            .run(cases, report, &mut std::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompareError::UnexpectedStatus { ref status, .. } if status == "204 No Content"
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_response_aborts() {
        let (a, _) = spawn_endpoint(echo).await;
        let (b, _) = spawn_endpoint(|_| (StatusCode::OK, "<html>".into())).await;

        let dir = TempDir::new().unwrap();
        let (_, report) = report_in(&dir);

        let cases = vec![TestCase::new("T1", "{}", "")];
        let err = runner(&a, &b)
            .run(cases, report, &mut std::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::MalformedJson { .. }));
    }

    #[tokio::test]
    async fn test_keep_going_records_failures() {
        let (a, _) = spawn_endpoint(echo).await;
        let (b, _) = spawn_endpoint(|body| {
            if body.contains("fail") {
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            } else {
                echo(body)
            }
        })
        .await;

        let dir = TempDir::new().unwrap();
        let (path, report) = report_in(&dir);

        let cases = vec![
            TestCase::new("T1", r#"{"fail":1}"#, ""),
            TestCase::new("T2", r#"{"a":1}"#, ""),
        ];
        let mut log = Vec::new();
        let summary = runner(&a, &b)
            .with_failure_policy(FailurePolicy::KeepGoing)
            .run(cases, report, &mut log)
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.matched, 1);
        assert_eq!(verdict_of(&summary, "T1"), Some(Verdict::Error));
        assert_eq!(
            log_lines(&log)[..2],
            ["Test ID: T1, error", "Test ID: T2, ok"]
        );

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "T1");
        assert_eq!(rows[1][1], "ERROR");
        assert!(rows[1][2].contains("500"));
        assert_eq!(rows[2][0], "END");
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_input_order() {
        let (a, _) = spawn_endpoint(echo).await;
        let (b, _) = spawn_endpoint(|body| {
            let mut value: serde_json::Value = serde_json::from_str(body).unwrap();
            value["changed"] = serde_json::Value::Bool(true);
            (StatusCode::OK, value.to_string())
        })
        .await;

        let dir = TempDir::new().unwrap();
        let (path, report) = report_in(&dir);

        let cases: Vec<_> = (0..4)
            .map(|i| {
                let payload = format!(r#"{{"delay_ms":{}}}"#, (4 - i) * 20);
                TestCase::new(format!("T{i}"), payload, "")
            })
            .collect();

        let mut log = Vec::new();
        let summary = runner(&a, &b)
            .with_concurrency(4)
            .run(cases, report, &mut log)
            .await
            .unwrap();

        let ids: Vec<_> = summary.verdicts.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["T0", "T1", "T2", "T3"]);
        assert_eq!(log_lines(&log)[3], "Test ID: T3, divergent");

        let rows = read_rows(&path);
        let row_ids: Vec<_> = rows[1..5].iter().map(|r| r[0].as_str()).collect();
        assert_eq!(row_ids, vec!["T0", "T1", "T2", "T3"]);
        assert!(rows[1][2].contains("$.changed"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dir = TempDir::new().unwrap();
        let (path, report) = report_in(&dir);

        let mut log = Vec::new();
        let summary = runner("http://127.0.0.1:1/a", "http://127.0.0.1:1/b")
            .run(Vec::new(), report, &mut log)
            .await
            .unwrap();

        assert_eq!(summary.total, 0);
        assert!(log_lines(&log)[0].starts_with("Test completed, time: "));
        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "END");
    }

    #[tokio::test]
    async fn test_compare_case_captures_failure() {
        let (a, _) = spawn_endpoint(|_| (StatusCode::NOT_FOUND, String::new())).await;
        let runner = runner(&a, &a);

        let outcome = runner.compare_case(&TestCase::new("T1", "{}", "")).await;
        assert_eq!(outcome.verdict(), Verdict::Error);
        assert_eq!(outcome.log_line(), "Test ID: T1, error");
    }
}
