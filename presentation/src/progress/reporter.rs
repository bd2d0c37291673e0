//! Progress reporting for document evaluation

use colored::Colorize;
use docquorum_application::ports::progress::EvaluationProgress;
use docquorum_domain::{ChunkPlan, ConsensusDecision, ResolutionPhase};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Reports progress during an evaluation with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    providers_bar: Mutex<Option<ProgressBar>>,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            providers_bar: Mutex::new(None),
            phase_bar: Mutex::new(None),
        }
    }

    fn providers_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn phase_display_name(phase: ResolutionPhase) -> &'static str {
        match phase {
            ResolutionPhase::Pending => "Waiting for answers",
            ResolutionPhase::Consensus => "Answers agree",
            ResolutionPhase::Arbitrating => "Arbitrating",
            ResolutionPhase::Resolved => "Resolved",
        }
    }

    fn chunk_summary(provider: &str, plan: &ChunkPlan) -> String {
        format!(
            "{} {}: {} chunk(s), {} strategy, {} of {} bytes",
            "->".cyan(),
            provider.bold(),
            plan.chunks.len(),
            plan.strategy.kind,
            plan.total_bytes(),
            plan.document_len
        )
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationProgress for ProgressReporter {
    fn on_evaluation_start(&self, providers: &[String]) {
        let pb = self.multi.add(ProgressBar::new(providers.len() as u64));
        pb.set_style(Self::providers_style());
        pb.set_prefix("Providers");
        pb.set_message("Asking...");
        pb.enable_steady_tick(Duration::from_millis(120));

        *self
            .providers_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_chunked(&self, provider: &str, plan: &ChunkPlan) {
        let _ = self.multi.println(Self::chunk_summary(provider, plan));
    }

    fn on_provider_complete(&self, provider: &str, success: bool) {
        let guard = self
            .providers_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            let status = if success {
                format!("{} {}", "v".green(), provider)
            } else {
                format!("{} {}", "x".red(), provider)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_phase(&self, phase: ResolutionPhase) {
        if let Some(pb) = self
            .providers_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message(format!("{}", "answers in".green()));
        }

        let mut phase_bar = self.phase_bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = phase_bar.take() {
            pb.finish_and_clear();
        }
        if phase == ResolutionPhase::Resolved {
            return;
        }

        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(Self::phase_display_name(phase));
        pb.enable_steady_tick(Duration::from_millis(120));
        *phase_bar = Some(pb);
    }

    fn on_decision(&self, decision: &ConsensusDecision) {
        if let Some(pb) = self
            .phase_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
        let _ = self.multi.println(format!(
            "{} {} ({})",
            "Decided:".green().bold(),
            decision.selected_source,
            format!("{:.2}", decision.final_confidence).dimmed()
        ));
    }
}

/// Simple text-based progress on stderr (no fancy UI)
pub struct SimpleProgress;

impl EvaluationProgress for SimpleProgress {
    fn on_evaluation_start(&self, providers: &[String]) {
        eprintln!(
            "{} {} ({} providers)",
            "->".cyan(),
            "Asking".bold(),
            providers.len()
        );
    }

    fn on_chunked(&self, provider: &str, plan: &ChunkPlan) {
        eprintln!("{}", ProgressReporter::chunk_summary(provider, plan));
    }

    fn on_provider_complete(&self, provider: &str, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), provider);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), provider);
        }
    }

    fn on_phase(&self, phase: ResolutionPhase) {
        eprintln!(
            "{} {}",
            "->".cyan(),
            ProgressReporter::phase_display_name(phase).bold()
        );
    }

    fn on_decision(&self, _decision: &ConsensusDecision) {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    fn hidden() -> ProgressReporter {
        ProgressReporter {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            providers_bar: Mutex::new(None),
            phase_bar: Mutex::new(None),
        }
    }

    #[test]
    fn test_provider_bar_counts_completions() {
        let reporter = hidden();
        reporter.on_evaluation_start(&["alpha".to_string(), "beta".to_string()]);
        reporter.on_provider_complete("alpha", true);
        reporter.on_provider_complete("beta", false);

        let guard = reporter.providers_bar.lock().unwrap();
        let pb = guard.as_ref().unwrap();
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(2));
    }

    #[test]
    fn test_phases_replace_spinner() {
        let reporter = hidden();
        reporter.on_evaluation_start(&["alpha".to_string()]);
        reporter.on_phase(ResolutionPhase::Arbitrating);
        assert!(reporter.providers_bar.lock().unwrap().is_none());
        assert!(reporter.phase_bar.lock().unwrap().is_some());

        reporter.on_phase(ResolutionPhase::Resolved);
        assert!(reporter.phase_bar.lock().unwrap().is_none());
    }
}
