use chrono::Local;
use geoprobe_core::api::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

/// One JSON object per event on stdout, for piping into other tools.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_type(event: &RenderEvent) -> &'static str {
        match event {
            RenderEvent::RunStart { .. } => "run.start",
            RenderEvent::PhaseStart { .. } => "phase.start",
            RenderEvent::PhaseSkipped { .. } => "phase.skipped",
            RenderEvent::PhaseEnd { .. } => "phase.end",
            RenderEvent::TaskComplete { .. } => "task.end",
            RenderEvent::BrandAnalyzed { .. } => "brand.analyzed",
            RenderEvent::Stopped { .. } => "run.stopped",
            RenderEvent::RunEnd { .. } => "run.end",
        }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        // The serde tag is replaced by the envelope's event_type; everything
        // else lands under metadata.
        let mut metadata = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
        if let Some(obj) = metadata.as_object_mut() {
            obj.remove("type");
            obj.remove("run_id");
        }
        json!({
            "v": 1,
            "event_type": Self::event_type(event),
            "ts": Local::now().to_rfc3339(),
            "run_id": event.run_id(),
            "metadata": metadata,
        })
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunStart {
            run_id: "run".to_string(),
            kind: "leaderboard".to_string(),
            subject: "CRM software".to_string(),
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["run_id"], "run");
        assert_eq!(value["metadata"]["subject"], "CRM software");
        assert!(value["metadata"].get("type").is_none());
    }

    #[test]
    fn test_jsonl_renderer_task_complete() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            provider: "openai".to_string(),
            query_id: "q1".to_string(),
            iteration: 2,
            success: false,
            latency_ms: 12,
            attempts: 3,
            done: 1,
            total: 6,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["metadata"]["attempts"], 3);
        assert_eq!(value["metadata"]["success"], false);
    }

    #[test]
    fn test_jsonl_renderer_run_end() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunEnd {
            run_id: "run".to_string(),
            status: "completed".to_string(),
            duration_ms: 100,
            errors: Vec::new(),
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["metadata"]["status"], "completed");
        assert_eq!(value["metadata"]["duration_ms"], 100);
    }
}
