//! End-to-end tests of the writer loop against scripted collaborators.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use covgen::domain::models::{
    CoverageReport, FileCoverage, LoopConfig, PlanEntry, Region, RegionKind, TestPlan,
};
use covgen::domain::ports::{
    AgentClient, CoverageMeasurer, Measurement, NullStatusSink, OutlineSource,
};
use covgen::domain::{DomainError, DomainResult};
use covgen::{EntryStatus, WriterLoop};

const PROD_REL: &str = "src/mod.py";

fn report_missing(lines: &[u32]) -> CoverageReport {
    let mut files = HashMap::new();
    files.insert(
        PROD_REL.to_string(),
        FileCoverage {
            missing_lines: lines.to_vec(),
            ..Default::default()
        },
    );
    CoverageReport { files }
}

fn measurement(ok: bool, missing: &[u32]) -> Measurement {
    let report = report_missing(missing);
    Measurement {
        ok,
        stdout: String::new(),
        stderr: String::new(),
        summary: Some(report.clone()),
        raw: Some(report),
        report_path: None,
    }
}

/// Measurer that replays a scripted sequence, repeating the last step.
struct ScriptedMeasurer {
    steps: Mutex<VecDeque<Measurement>>,
    last: Mutex<Option<Measurement>>,
}

impl ScriptedMeasurer {
    fn new(steps: Vec<Measurement>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CoverageMeasurer for ScriptedMeasurer {
    async fn measure(&self) -> DomainResult<Measurement> {
        let next = self.steps.lock().unwrap().pop_front();
        match next {
            Some(m) => {
                *self.last.lock().unwrap() = Some(m.clone());
                Ok(m)
            }
            None => Ok(self
                .last
                .lock()
                .unwrap()
                .clone()
                .expect("scripted measurer called before any step")),
        }
    }
}

/// Outline with a fixed region set.
struct FixedOutline {
    regions: Vec<Region>,
}

#[async_trait]
impl OutlineSource for FixedOutline {
    async fn regions_of(&self, _file_abs: &Path) -> DomainResult<Vec<Region>> {
        Ok(self.regions.clone())
    }
}

/// Agent that records every prompt and drain, emitting nothing.
#[derive(Default)]
struct RecordingAgent {
    prompts: Mutex<Vec<String>>,
    drains: Mutex<u32>,
}

impl RecordingAgent {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn drain_count(&self) -> u32 {
        *self.drains.lock().unwrap()
    }
}

#[async_trait]
impl AgentClient for RecordingAgent {
    async fn propose(&self, prompt: &str) -> DomainResult<()> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(())
    }

    async fn drain_output(&self, _timeout: Duration) -> String {
        *self.drains.lock().unwrap() += 1;
        String::new()
    }
}

struct Fixture {
    repo: tempfile::TempDir,
    plan: TestPlan,
    outline: FixedOutline,
}

fn fixture() -> Fixture {
    let repo = tempfile::tempdir().unwrap();
    let root = repo.path();
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::create_dir_all(root.join("test")).unwrap();

    let mut source = String::new();
    for i in 1..=40 {
        source.push_str(&format!("x{i} = {i}\n"));
    }
    std::fs::write(root.join(PROD_REL), source).unwrap();

    let plan = TestPlan::new(vec![PlanEntry {
        prod_rel: PROD_REL.to_string(),
        prod_abs: root.join(PROD_REL),
        test_abs: root.join("test/test_mod.py"),
    }]);

    let outline = FixedOutline {
        regions: vec![
            Region::module(40),
            Region::new("f", RegionKind::Function, 3, 12),
            Region::new("g", RegionKind::Function, 14, 30),
        ],
    };

    Fixture {
        repo,
        plan,
        outline,
    }
}

fn writer<'a>(
    fx: &'a Fixture,
    measurer: &'a ScriptedMeasurer,
    agent: &'a RecordingAgent,
    status: &'a NullStatusSink,
    config: LoopConfig,
) -> WriterLoop<'a> {
    WriterLoop::new(
        measurer,
        &fx.outline,
        agent,
        status,
        config,
        fx.repo.path().to_path_buf(),
        "test",
        Duration::from_millis(1),
    )
}

#[tokio::test]
async fn test_loop_converges_region_by_region() {
    let fx = fixture();
    let measurer = ScriptedMeasurer::new(vec![
        measurement(true, &[4, 5, 20]),
        measurement(true, &[20]),
        measurement(true, &[]),
    ]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let report = writer(&fx, &measurer, &agent, &status, LoopConfig::default())
        .run(&fx.plan)
        .await;

    assert!(report.all_converged());
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].generation_requests, 2);

    let prompts = agent.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("region f"));
    assert!(prompts[0].contains("4-5"));
    assert!(prompts[1].contains("region g"));
    assert!(prompts[1].contains("20-20"));
}

#[tokio::test]
async fn test_loop_stops_prompting_once_gap_is_closed() {
    let fx = fixture();
    // One broad edit closes everything after the first chunk.
    let measurer = ScriptedMeasurer::new(vec![
        measurement(true, &[4, 5, 20]),
        measurement(true, &[]),
    ]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let report = writer(&fx, &measurer, &agent, &status, LoopConfig::default())
        .run(&fx.plan)
        .await;

    assert!(report.all_converged());
    assert_eq!(report.outcomes[0].generation_requests, 1);
    assert_eq!(agent.prompts().len(), 1);
}

#[tokio::test]
async fn test_unchanged_gap_stalls_at_attempt_bound() {
    let fx = fixture();
    // Coverage never moves.
    let measurer = ScriptedMeasurer::new(vec![measurement(true, &[4, 5])]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let report = writer(&fx, &measurer, &agent, &status, LoopConfig::default())
        .run(&fx.plan)
        .await;

    assert!(!report.all_converged());
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.generation_requests, 8);
    match &outcome.status {
        EntryStatus::Stalled {
            signature,
            attempts,
            last_missing,
        } => {
            assert_eq!(signature, "4,5");
            assert_eq!(*attempts, 8);
            assert_eq!(last_missing, &vec![4, 5]);
        }
        other => panic!("expected stall, got {other:?}"),
    }

    // Stall writes the diagnostics snapshot.
    let diag =
        std::fs::read_to_string(fx.repo.path().join("test/_diagnostics.json")).unwrap();
    assert!(diag.contains("\"signature\": \"4,5\""));
}

#[tokio::test]
async fn test_smaller_attempt_budget_is_honored() {
    let fx = fixture();
    let measurer = ScriptedMeasurer::new(vec![measurement(true, &[4])]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let config = LoopConfig {
        max_gap_attempts: 2,
        write_diagnostics: false,
    };
    let report = writer(&fx, &measurer, &agent, &status, config)
        .run(&fx.plan)
        .await;

    assert_eq!(report.outcomes[0].generation_requests, 2);
    assert!(!fx.repo.path().join("test/_diagnostics.json").exists());
}

#[tokio::test]
async fn test_failed_rerun_triggers_one_remediation_prompt() {
    let fx = fixture();
    let measurer = ScriptedMeasurer::new(vec![
        measurement(true, &[4]),
        measurement(false, &[4]),
        measurement(true, &[]),
    ]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let report = writer(&fx, &measurer, &agent, &status, LoopConfig::default())
        .run(&fx.plan)
        .await;

    assert!(report.all_converged());
    // Two generation requests plus one remediation request in between.
    assert_eq!(report.outcomes[0].generation_requests, 2);
    let prompts = agent.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].starts_with("Tests failed."));
}

#[tokio::test]
async fn test_failed_first_run_still_reaches_convergence() {
    let fx = fixture();
    let measurer = ScriptedMeasurer::new(vec![
        Measurement {
            ok: false,
            stderr: "collection error".to_string(),
            ..measurement(true, &[4])
        },
        measurement(true, &[]),
    ]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let report = writer(&fx, &measurer, &agent, &status, LoopConfig::default())
        .run(&fx.plan)
        .await;

    assert!(report.all_converged());
    let prompts = agent.prompts();
    assert!(prompts[0].starts_with("Initial pytest run failed"));
    // Every prompt's streamed reply is drained before the next measurement,
    // the initial-failure prompt included.
    assert_eq!(agent.drain_count(), prompts.len() as u32);
}

#[tokio::test]
async fn test_missing_report_is_terminal_for_the_entry() {
    let fx = fixture();
    let measurer = ScriptedMeasurer::new(vec![Measurement {
        ok: true,
        report_path: Some(PathBuf::from("/tmp/coverage.json")),
        ..Measurement::default()
    }]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let report = writer(&fx, &measurer, &agent, &status, LoopConfig::default())
        .run(&fx.plan)
        .await;

    assert!(!report.all_converged());
    assert!(matches!(
        report.outcomes[0].status,
        EntryStatus::ReportUnreadable { .. }
    ));
    assert!(agent.prompts().is_empty());
}

#[tokio::test]
async fn test_mid_loop_report_loss_keeps_gap_and_request_count() {
    let fx = fixture();
    // A readable first report, then the artifact disappears after the first
    // generation request.
    let measurer = ScriptedMeasurer::new(vec![
        measurement(true, &[4, 5]),
        Measurement {
            ok: true,
            report_path: Some(PathBuf::from("/tmp/coverage.json")),
            ..Measurement::default()
        },
    ]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let report = writer(&fx, &measurer, &agent, &status, LoopConfig::default())
        .run(&fx.plan)
        .await;

    assert!(!report.all_converged());
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.generation_requests, 1);
    match &outcome.status {
        EntryStatus::ReportUnreadable { last_missing, .. } => {
            assert_eq!(last_missing, &vec![4, 5]);
        }
        other => panic!("expected report-unreadable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_outline_failure_does_not_abort_the_run() {
    struct BrokenOutline;

    #[async_trait]
    impl OutlineSource for BrokenOutline {
        async fn regions_of(&self, file_abs: &Path) -> DomainResult<Vec<Region>> {
            Err(DomainError::OutlineUnavailable {
                path: file_abs.to_path_buf(),
                reason: "interpreter missing".to_string(),
            })
        }
    }

    let fx = fixture();
    let measurer = ScriptedMeasurer::new(vec![measurement(true, &[4])]);
    let agent = RecordingAgent::default();
    let status = NullStatusSink;

    let writer = WriterLoop::new(
        &measurer,
        &BrokenOutline,
        &agent,
        &status,
        LoopConfig::default(),
        fx.repo.path().to_path_buf(),
        "test",
        Duration::from_millis(1),
    );
    let report = writer.run(&fx.plan).await;

    assert_eq!(report.outcomes.len(), 1);
    assert!(matches!(
        report.outcomes[0].status,
        EntryStatus::Failed { .. }
    ));
}
