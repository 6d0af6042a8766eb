//! The evolution loop: propose → validate → apply → commit → log.
//!
//! Each iteration asks the generation collaborator for a whole-file
//! replacement, syntax-checks it in a temp sibling, applies it with an
//! atomic rename, commits it, and records the outcome in the history
//! log. Nothing in an iteration can touch the live file until the
//! candidate has passed validation.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use anyhow::Context as _;

use crate::domain::models::{
    Config, EvolutionConfig, HistoryEntry, IterationStatus, Proposal, ProposalContext,
};
use crate::domain::ports::{CodeGenerator, CommitOutcome, VersionControl};
use crate::infrastructure::gemini::ProposalParser;
use crate::services::context::ContextAssembler;
use crate::services::history_log::HistoryLog;
use crate::services::validator::{FileKind, ValidationError, Validator};

/// Drives evolution iterations against the collaborator ports.
pub struct EvolutionOrchestrator {
    config: EvolutionConfig,
    root: PathBuf,
    prompt_entries: usize,
    generator: Arc<dyn CodeGenerator>,
    vcs: Arc<dyn VersionControl>,
    validator: Validator,
    context: ContextAssembler,
    history: HistoryLog,
    shutdown: watch::Receiver<bool>,
}

impl EvolutionOrchestrator {
    /// `root` is the project directory proposal paths are resolved
    /// against.
    pub fn new(
        config: &Config,
        root: impl Into<PathBuf>,
        generator: Arc<dyn CodeGenerator>,
        vcs: Arc<dyn VersionControl>,
        history: HistoryLog,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config: config.evolution.clone(),
            root: root.into(),
            prompt_entries: config.history.prompt_entries,
            generator,
            vcs,
            validator: Validator::new(),
            context: ContextAssembler::new(&config.evolution.context),
            history,
            shutdown,
        }
    }

    #[must_use]
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Iterate until shutdown. History-log persistence failure is the
    /// only fatal error: outcomes that cannot be recorded must stop the
    /// loop.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!(recorded = self.history.len(), "evolution loop starting");
        let mut shutdown = self.shutdown.clone();

        while !*shutdown.borrow() {
            let iteration = self.history.next_iteration();
            info!(iteration, "starting evolution iteration");

            let entry = self.run_iteration(iteration).await;
            info!(
                iteration,
                status = %entry.status,
                reason = %entry.reason,
                "iteration finished"
            );
            self.history
                .append(entry)
                .await
                .context("failed to persist history log")?;

            if *shutdown.borrow() {
                break;
            }
            self.wait_for_next(&mut shutdown).await;
        }

        info!("evolution loop stopped");
        Ok(())
    }

    /// One full iteration. Never fails: every failure mode maps to a
    /// history entry.
    pub async fn run_iteration(&mut self, iteration: u64) -> HistoryEntry {
        let user_request = self.take_user_request().await;

        let source_context = match self.context.assemble().await {
            Ok(context) => context,
            Err(err) => {
                return HistoryEntry::new(
                    iteration,
                    IterationStatus::ExecutionFailed,
                    format!("context assembly failed: {err}"),
                );
            }
        };

        let ctx = ProposalContext {
            source_context,
            history_summary: self.history.recent_summary(self.prompt_entries),
            user_request,
        };

        match self.request_proposal(&ctx).await {
            Ok(proposal) => {
                let (status, reason) = self.apply(&proposal).await;
                HistoryEntry::new(iteration, status, reason)
            }
            Err(reason) => HistoryEntry::new(iteration, IterationStatus::NoProposal, reason),
        }
    }

    /// Bounded proposal retry with a fixed inter-attempt delay.
    async fn request_proposal(&self, ctx: &ProposalContext) -> Result<Proposal, String> {
        let max = self.config.max_proposal_attempts;
        let mut last_failure = String::new();

        for attempt in 1..=max {
            debug!(attempt, max, "requesting proposal");
            match self.generator.propose(ctx).await {
                Ok(raw) => match ProposalParser::parse(&raw) {
                    Ok(proposal) => {
                        info!(
                            filepath = %proposal.filepath,
                            description = %proposal.description,
                            "proposal received"
                        );
                        return Ok(proposal);
                    }
                    Err(err) => {
                        last_failure = format!("response did not contain a usable proposal: {err}");
                    }
                },
                Err(err) => last_failure = format!("generation request failed: {err}"),
            }

            warn!(attempt, max, failure = %last_failure, "proposal attempt failed");
            if attempt < max {
                tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
            }
        }

        Err(format!(
            "no proposal after {max} attempts; last failure: {last_failure}"
        ))
    }

    /// Validate and apply a proposal, then commit it. The live file is
    /// only ever replaced by an already-validated temp sibling.
    async fn apply(&self, proposal: &Proposal) -> (IterationStatus, String) {
        let relative = PathBuf::from(&proposal.filepath);
        if relative.is_absolute()
            || relative
                .components()
                .any(|part| matches!(part, Component::ParentDir))
        {
            return (
                IterationStatus::ExecutionFailed,
                format!(
                    "refusing proposal for a path outside the project: {}",
                    proposal.filepath
                ),
            );
        }
        let target = self.root.join(&relative);

        let current = tokio::fs::read(&target).await.unwrap_or_default();
        if current == proposal.content.as_bytes() {
            return (
                IterationStatus::NoProposal,
                "proposal content is identical to the live file; nothing to apply".to_string(),
            );
        }

        // The temp sibling carries a .tmp suffix, so the file kind must
        // come from the target path.
        let kind = FileKind::from_path(&target);
        let Some(file_name) = target.file_name().map(|name| name.to_os_string()) else {
            return (
                IterationStatus::ExecutionFailed,
                format!("proposal path has no file name: {}", proposal.filepath),
            );
        };
        let mut tmp_name = file_name;
        tmp_name.push(".tmp");
        let tmp = target.with_file_name(tmp_name);

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = tokio::fs::create_dir_all(parent).await {
                    return (
                        IterationStatus::ExecutionFailed,
                        format!("could not create target directory: {err}"),
                    );
                }
            }
        }

        if let Err(err) = tokio::fs::write(&tmp, &proposal.content).await {
            return (
                IterationStatus::ExecutionFailed,
                format!("could not write candidate file: {err}"),
            );
        }

        match self.validator.validate(&tmp, kind).await {
            Ok(()) => {}
            Err(ValidationError::Syntax(detail)) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                info!(filepath = %proposal.filepath, "proposal rejected by validator");
                return (IterationStatus::RejectedValidationFailed, detail);
            }
            Err(err @ ValidationError::Io(_)) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return (IterationStatus::ExecutionFailed, err.to_string());
            }
        }

        if let Err(err) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return (
                IterationStatus::ExecutionFailed,
                format!("failed to apply validated content: {err}"),
            );
        }
        info!(filepath = %proposal.filepath, "live file replaced with validated proposal");

        if let Err(err) = self.vcs.add(&target).await {
            return (
                IterationStatus::ExecutionFailed,
                format!("`add` failed after the live file was replaced: {err}"),
            );
        }

        let message = format!("feat(evolve): {}", proposal.description);
        match self.vcs.commit(&message).await {
            Ok(CommitOutcome::Committed) => {
                (IterationStatus::Committed, proposal.description.clone())
            }
            Ok(CommitOutcome::NothingToCommit) => (
                IterationStatus::Committed,
                format!(
                    "{} (no content change relative to HEAD; nothing committed)",
                    proposal.description
                ),
            ),
            Err(err) => (
                IterationStatus::ExecutionFailed,
                format!("commit failed after the live file was replaced: {err}"),
            ),
        }
    }

    /// Sleep until the next iteration, or wait for the trigger artifact
    /// in interactive mode.
    async fn wait_for_next(&self, shutdown: &mut watch::Receiver<bool>) {
        if !self.config.interactive {
            debug!(secs = self.config.interval_secs, "sleeping until next iteration");
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(self.config.interval_secs)) => {}
                _ = shutdown.changed() => {}
            }
            return;
        }

        info!(trigger = %self.config.trigger_path, "waiting for trigger file");
        let trigger = Path::new(&self.config.trigger_path);
        loop {
            if *shutdown.borrow() {
                return;
            }
            if tokio::fs::try_exists(trigger).await.unwrap_or(false) {
                if let Err(err) = tokio::fs::remove_file(trigger).await {
                    warn!(%err, "could not consume trigger file");
                }
                info!("trigger consumed; starting next iteration");
                return;
            }
            tokio::select! {
                () = tokio::time::sleep(Duration::from_millis(500)) => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    /// Read and delete the pending user-request file, if present.
    async fn take_user_request(&self) -> Option<String> {
        let path = Path::new(&self.config.request_path);
        let text = tokio::fs::read_to_string(path).await.ok()?;
        if let Err(err) = tokio::fs::remove_file(path).await {
            warn!(%err, "could not delete consumed request file");
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            info!("picked up pending user request");
            Some(trimmed.to_string())
        }
    }
}
