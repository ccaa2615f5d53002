use geoprobe_core::api::{OutputRendererPlugin, RenderEvent};

/// Human-readable progress lines on stderr; stdout is left for the final
/// summary.
pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn mark(&self, ok: bool) -> &'static str {
        match (ok, self.ascii_only) {
            (true, true) => "OK",
            (false, true) => "FAIL",
            (true, false) => "✓",
            (false, false) => "✗",
        }
    }

    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        let line = match event {
            RenderEvent::RunStart {
                run_id,
                kind,
                subject,
            } => format!("RUN START {run_id} ({kind}: {subject})"),
            RenderEvent::PhaseStart {
                phase, description, ..
            } => format!("PHASE {phase}: {description}"),
            RenderEvent::PhaseSkipped { phase, reason, .. } => {
                format!("PHASE {phase} skipped ({reason})")
            }
            RenderEvent::PhaseEnd {
                phase, duration_ms, ..
            } => format!("PHASE {phase} done in {duration_ms}ms"),
            RenderEvent::TaskComplete {
                provider,
                query_id,
                iteration,
                success,
                latency_ms,
                attempts,
                done,
                total,
                ..
            } => {
                // Only failures and retried tasks are worth a line; the
                // progress bar covers the rest.
                if *success && *attempts <= 1 {
                    return None;
                }
                format!(
                    "  [{done}/{total}] {} {provider} {query_id}#{iteration} ({latency_ms}ms, attempts {attempts})",
                    self.mark(*success)
                )
            }
            RenderEvent::BrandAnalyzed {
                brand,
                overall_score,
                ..
            } => format!("  analyzed {brand}: {overall_score:.3}"),
            RenderEvent::Stopped { after, .. } => format!("STOPPED after {after}"),
            RenderEvent::RunEnd {
                run_id,
                status,
                duration_ms,
                errors,
            } => {
                let mut line = format!("RUN END {run_id} ({status}, {duration_ms}ms)");
                for err in errors {
                    line.push_str(&format!("\n  {} {err}", self.mark(false)));
                }
                line
            }
        };
        Some(line)
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(line) = self.format_event(event) {
            eprintln!("{line}");
        }
    }
}
