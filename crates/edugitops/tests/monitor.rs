#![allow(missing_docs, unused_results)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use assert_matches::assert_matches;
use async_trait::async_trait;
use edugitops::{
    CommandOutput, CommandRunner, CommandSpec, EduGitOps, EduSettings, MonitorError, RunState,
    Step,
};

/// Records every command and fails the one at `fail_at`.
#[derive(Default)]
struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    fail_at: Option<(usize, i32)>,
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, MonitorError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(spec.clone());
        let exit_code = match self.fail_at {
            Some((at, code)) if at == index => code,
            _ => 0,
        };
        Ok(CommandOutput {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 1,
            timed_out: false,
        })
    }
}

const CATALOG: &str = "\
- id: grafana
  port: 3000
- id: mysql
  port: 3306
  protocol: tcp
";

fn setup(runner: FakeRunner) -> (tempfile::TempDir, EduGitOps<FakeRunner>) {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = EduSettings::default();
    settings.data.dir = Some(dir.path().to_string_lossy().into_owned());
    settings.remote.enabled = false;
    settings.monitor.scripts_dir = "/opt/scripts".into();
    std::fs::write(dir.path().join("catalogo-servicios.yaml"), CATALOG).unwrap();
    let app = EduGitOps::with_runner(&settings, runner).unwrap();
    app.upsert("001", "juan", vec!["grafana".into(), "mysql".into()])
        .unwrap();
    (dir, app)
}

fn env() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("CHECKMK_HOST_NAME".to_string(), "minikube".to_string()),
        ("CHECKMK_HOST_IP".to_string(), "192.168.49.2".to_string()),
    ])
}

fn calls(app: &EduGitOps<FakeRunner>) -> Vec<CommandSpec> {
    app.runner().calls.lock().unwrap().clone()
}

#[tokio::test]
async fn rebuilds_rules_for_every_student_app() {
    let (_dir, app) = setup(FakeRunner::default());

    let report = app.run_monitoring_sync_with_env(&env()).await.unwrap();
    assert_eq!(report.rules_created, 2);
    assert_eq!(report.commands_run, 7);
    assert_eq!(report.history.last(), Some(&RunState::Done));

    let calls = calls(&app);
    let names: Vec<String> = calls
        .iter()
        .map(|c| c.program.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "checkmk-borrar-reglas-http2.sh",
            "checkmk-borrar-reglas-tcp.sh",
            "checkmk-borrar-host.sh",
            "checkmk-crear-host.sh",
            "checkmk-crear-regla-http2.sh",
            "checkmk-crear-regla-tcp.sh",
            "checkmk-activar-cambios.sh",
        ]
    );
    assert!(calls[0].program.starts_with("/opt/scripts"));
    assert_eq!(
        calls[4].args,
        vec![
            "minikube",
            "http://grafana-service.juan.svc.cluster.local:3000",
            "juan-grafana",
        ]
    );
    assert_eq!(
        calls[5].args,
        vec!["minikube", "mysql-service.juan.svc.cluster.local", "3306", "juan-mysql"]
    );
    assert_eq!(calls[4].env.get("SKIP_ACTIVATE").map(String::as_str), Some("1"));
    assert!(!calls[6].env.contains_key("SKIP_ACTIVATE"));
    assert_eq!(
        calls[6].env.get("CHECKMK_HOST_IP").map(String::as_str),
        Some("192.168.49.2")
    );
}

#[tokio::test]
async fn failing_rule_stops_before_activation() {
    let runner = FakeRunner {
        fail_at: Some((4, 3)),
        ..FakeRunner::default()
    };
    let (_dir, app) = setup(runner);

    let err = app.run_monitoring_sync_with_env(&env()).await.unwrap_err();
    assert_matches!(
        err,
        MonitorError::Command { step: Step::CreateRules, exit_code: 3, .. }
    );
    assert_eq!(err.exit_code(), 3);
    assert_eq!(calls(&app).len(), 5);
}

#[tokio::test]
async fn missing_host_name_touches_nothing() {
    let (_dir, app) = setup(FakeRunner::default());

    let err = app
        .run_monitoring_sync_with_env(&BTreeMap::new())
        .await
        .unwrap_err();
    assert_matches!(err, MonitorError::MissingHostName);
    assert_eq!(err.exit_code(), 1);
    assert!(calls(&app).is_empty());
}
