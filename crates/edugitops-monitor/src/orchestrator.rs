//! The four-phase rule replacement run.
//!
//! Every run rebuilds the monitoring configuration from scratch:
//!
//! 1. wipe: delete HTTP rules, TCP rules and the monitored host
//! 2. recreate the monitored host
//! 3. create one rule per student app, each with `SKIP_ACTIVATE=1`
//! 4. activate once
//!
//! The first failing command aborts the run. Activation runs even when there
//! are no rules, so that the wipe takes effect.

use std::collections::BTreeMap;
use std::path::Path;

use edugitops_core::{Catalog, StudentRecord};
use edugitops_settings::MonitorSettings;
use tracing::{debug, info, warn};

use crate::env::{build_env, load_env_file, unicode_vars};
use crate::errors::MonitorError;
use crate::rules::{RuleSpec, plan_rules};
use crate::runner::{CommandRunner, CommandSpec};
use crate::state::{RunState, Step};

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Rules created in phase 3.
    pub rules_created: usize,
    /// Commands executed across all phases.
    pub commands_run: usize,
    /// Every state the run went through, starting at [`RunState::Idle`].
    pub history: Vec<RunState>,
}

/// Drives the Checkmk scripts through a [`CommandRunner`].
pub struct MonitorSync<R> {
    runner: R,
    settings: MonitorSettings,
}

impl<R: CommandRunner> MonitorSync<R> {
    /// Orchestrator using `runner` and the script layout in `settings`.
    pub fn new(runner: R, settings: MonitorSettings) -> Self {
        Self { runner, settings }
    }

    /// The command runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// The process environment layered with settings and the env file.
    pub fn command_env(&self) -> BTreeMap<String, String> {
        let file = self
            .settings
            .env_file
            .as_deref()
            .map(|path| load_env_file(Path::new(path)))
            .unwrap_or_default();
        build_env(unicode_vars(std::env::vars_os()), &self.settings, file)
    }

    /// Replace every monitoring rule with the set `roster` asks for.
    ///
    /// `env` is the complete environment for the scripts and must define
    /// `CHECKMK_HOST_NAME`.
    pub async fn run(
        &self,
        roster: &[StudentRecord],
        catalog: &Catalog,
        env: &BTreeMap<String, String>,
    ) -> Result<RunReport, MonitorError> {
        let host = env
            .get("CHECKMK_HOST_NAME")
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .ok_or(MonitorError::MissingHostName)?
            .to_string();

        let rules = plan_rules(roster, catalog);
        let scripts = &self.settings.scripts;
        let mut run = Run::new(self);

        info!(host = %host, "clearing previous Checkmk configuration");
        run.advance(RunState::Wiping);
        run.exec(Step::Wipe, &scripts.delete_http_rules, Vec::new(), env)
            .await?;
        run.exec(Step::Wipe, &scripts.delete_tcp_rules, Vec::new(), env)
            .await?;
        run.exec(Step::Wipe, &scripts.delete_host, Vec::new(), env)
            .await?;

        run.exec(Step::RecreateHost, &scripts.create_host, Vec::new(), env)
            .await?;
        run.advance(RunState::HostRecreated);

        info!(rules = rules.len(), "creating rules");
        let mut skip_activate = env.clone();
        let _ = skip_activate.insert("SKIP_ACTIVATE".to_string(), "1".to_string());
        for (i, rule) in rules.iter().enumerate() {
            let script = match rule {
                RuleSpec::Http { .. } => &scripts.create_http_rule,
                RuleSpec::Tcp { .. } => &scripts.create_tcp_rule,
            };
            let mut args = vec![host.clone()];
            args.extend(rule.args());
            run.exec(Step::CreateRules, script, args, &skip_activate)
                .await?;
            run.advance(RunState::RuleBatch(i + 1));
        }

        info!("activating pending changes");
        run.exec(Step::Activate, &scripts.activate, Vec::new(), env)
            .await?;
        run.advance(RunState::Activated);
        run.advance(RunState::Done);

        info!(
            rules = rules.len(),
            commands = run.commands,
            "Checkmk updated"
        );
        Ok(RunReport {
            rules_created: rules.len(),
            commands_run: run.commands,
            history: run.history,
        })
    }
}

/// Mutable state of one run.
struct Run<'a, R> {
    sync: &'a MonitorSync<R>,
    history: Vec<RunState>,
    commands: usize,
}

impl<'a, R: CommandRunner> Run<'a, R> {
    fn new(sync: &'a MonitorSync<R>) -> Self {
        Self {
            sync,
            history: vec![RunState::Idle],
            commands: 0,
        }
    }

    fn state(&self) -> RunState {
        self.history.last().cloned().unwrap_or(RunState::Idle)
    }

    fn advance(&mut self, next: RunState) {
        let current = self.state();
        debug_assert!(
            current.can_advance_to(&next),
            "illegal transition {current} -> {next}"
        );
        debug!(from = %current, to = %next, "monitor state");
        self.history.push(next);
    }

    async fn exec(
        &mut self,
        step: Step,
        script: &str,
        args: Vec<String>,
        env: &BTreeMap<String, String>,
    ) -> Result<(), MonitorError> {
        let spec = CommandSpec {
            program: self.sync.settings.script_path(script),
            args,
            env: env.clone(),
        };
        let command = spec.display_name();

        let output = match self.sync.runner.run(&spec).await {
            Ok(output) => output,
            Err(e) => {
                warn!(%step, command = %command, error = %e, "command could not run");
                self.advance(RunState::Failed {
                    step,
                    command,
                    exit_code: e.exit_code(),
                });
                return Err(e);
            }
        };
        self.commands += 1;

        if output.success() {
            debug!(%step, command = %command, duration_ms = output.duration_ms, "command succeeded");
            return Ok(());
        }

        warn!(
            %step,
            command = %command,
            exit_code = output.exit_code,
            timed_out = output.timed_out,
            stderr = %output.stderr.trim(),
            "command failed, aborting run"
        );
        self.advance(RunState::Failed {
            step,
            command: command.clone(),
            exit_code: output.exit_code,
        });
        Err(MonitorError::Command {
            step,
            command,
            exit_code: output.exit_code,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
