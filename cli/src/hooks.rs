//! Interactive review after `research` and `query-generation`.
//!
//! The operator sees the artifact just persisted and may continue, abort,
//! or edit the JSON file on disk and have it reloaded into the run.
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use geoprobe_core::api::{
    layout, BrandProfile, GeoError, PipelineHook, QuerySet, RunContext, Storage, StorageExt,
};
use geoprobe_core::stages::{QUERY_GENERATION, RESEARCH};

/// Prints a prompt and returns the operator's answer line.
pub type LineReader = Arc<dyn Fn(&str) -> std::io::Result<String> + Send + Sync>;

pub struct ReviewHook {
    storage: Arc<dyn Storage>,
    read_line: LineReader,
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Continue,
    Edit,
    Abort,
}

fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "c" | "continue" | "y" | "yes" => Some(Choice::Continue),
        "e" | "edit" => Some(Choice::Edit),
        "a" | "abort" | "q" | "n" | "no" => Some(Choice::Abort),
        _ => None,
    }
}

impl ReviewHook {
    pub fn new(storage: Arc<dyn Storage>, read_line: LineReader) -> Self {
        Self { storage, read_line }
    }

    pub fn stdin(storage: Arc<dyn Storage>) -> Self {
        Self::new(
            storage,
            Arc::new(|prompt: &str| {
                eprint!("{prompt}");
                std::io::stderr().flush()?;
                let mut line = String::new();
                std::io::stdin().read_line(&mut line)?;
                Ok(line)
            }),
        )
    }

    async fn ask(&self, prompt: String) -> Result<String, GeoError> {
        let read_line = self.read_line.clone();
        tokio::task::spawn_blocking(move || read_line(&prompt))
            .await
            .map_err(|e| GeoError::Aborted(format!("input task failed: {e}")))?
            .map_err(|e| GeoError::Aborted(format!("cannot read input: {e}")))
    }

    /// Reloads the artifact behind `stage` into `ctx`; returns a message
    /// when the file is missing or does not parse.
    async fn reload(&self, stage: &str, ctx: &mut RunContext) -> Result<(), String> {
        let run_id = ctx.run_id().to_string();
        match stage {
            RESEARCH => match self.storage.load::<BrandProfile>(&run_id, layout::BRAND_PROFILE).await {
                Ok(Some(profile)) => ctx.brand_profile = Some(profile),
                Ok(None) => return Err(format!("{} is missing", layout::BRAND_PROFILE)),
                Err(e) => return Err(e.to_string()),
            },
            QUERY_GENERATION => match self.storage.load::<QuerySet>(&run_id, layout::QUERIES).await {
                Ok(Some(set)) if !set.queries.is_empty() => ctx.query_set = Some(set),
                Ok(Some(_)) => return Err("query list is empty".to_string()),
                Ok(None) => return Err(format!("{} is missing", layout::QUERIES)),
                Err(e) => return Err(e.to_string()),
            },
            _ => {}
        }
        Ok(())
    }
}

fn artifact_for(stage: &str) -> Option<&'static str> {
    match stage {
        RESEARCH => Some(layout::BRAND_PROFILE),
        QUERY_GENERATION => Some(layout::QUERIES),
        _ => None,
    }
}

fn describe(stage: &str, ctx: &RunContext) -> String {
    match stage {
        RESEARCH => match &ctx.brand_profile {
            Some(p) => format!(
                "Brand profile for {}\n  category:    {}\n  industry:    {}\n  competitors: {}\n  keywords:    {}",
                p.name,
                p.category,
                p.industry,
                p.competitors.join(", "),
                p.keywords.join(", ")
            ),
            None => "No brand profile".to_string(),
        },
        QUERY_GENERATION => match &ctx.query_set {
            Some(set) => {
                let mut out = format!("{} queries", set.queries.len());
                for (i, q) in set.queries.iter().enumerate() {
                    out.push_str(&format!("\n  {:>3}. [{}] {}", i + 1, q.strategy.as_str(), q.text));
                }
                out
            }
            None => "No queries".to_string(),
        },
        other => format!("Stage {other} finished"),
    }
}

#[async_trait]
impl PipelineHook for ReviewHook {
    async fn after_stage(&self, stage: &str, ctx: &mut RunContext) -> Result<(), GeoError> {
        let Some(rel) = artifact_for(stage) else {
            return Ok(());
        };
        eprintln!("\n{}\n", describe(stage, ctx));

        loop {
            let answer = self.ask("[c]ontinue, [e]dit, [a]bort? ".to_string()).await?;
            match parse_choice(&answer) {
                Some(Choice::Continue) => return Ok(()),
                Some(Choice::Abort) => {
                    return Err(GeoError::Aborted(format!("stopped by operator after {stage}")))
                }
                Some(Choice::Edit) => {
                    let path = self.storage.run_dir(ctx.run_id()).join(rel);
                    self.ask(format!("Edit {} and press Enter to reload ", path.display()))
                        .await?;
                    match self.reload(stage, ctx).await {
                        Ok(()) => eprintln!("\n{}\n", describe(stage, ctx)),
                        Err(msg) => eprintln!("reload failed: {msg}"),
                    }
                }
                None => eprintln!("please answer c, e or a"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use geoprobe_core::api::{AppConfig, FileSystemStorage};

    fn scripted(answers: &[&str]) -> LineReader {
        let queue = Mutex::new(answers.iter().map(|s| s.to_string()).collect::<VecDeque<_>>());
        Arc::new(move |_prompt: &str| {
            Ok(queue
                .lock()
                .map_err(|_| std::io::Error::other("poisoned"))?
                .pop_front()
                .unwrap_or_else(|| "a".to_string()))
        })
    }

    async fn setup() -> (tempfile::TempDir, Arc<dyn Storage>, RunContext) {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(FileSystemStorage::new(dir.path()));
        storage.create_run_dir("run-1").await.unwrap();
        let mut ctx = RunContext::new("run-1", "Acme", Arc::new(AppConfig::default()));
        ctx.brand_profile = Some(BrandProfile {
            name: "Acme".into(),
            ..BrandProfile::default()
        });
        (dir, storage, ctx)
    }

    #[test]
    fn choices() {
        assert_eq!(parse_choice("\n"), Some(Choice::Continue));
        assert_eq!(parse_choice(" E "), Some(Choice::Edit));
        assert_eq!(parse_choice("abort"), Some(Choice::Abort));
        assert_eq!(parse_choice("maybe"), None);
    }

    #[tokio::test]
    async fn abort_stops_the_run() {
        let (_dir, storage, mut ctx) = setup().await;
        let hook = ReviewHook::new(storage, scripted(&["?", "a"]));
        let err = hook.after_stage(RESEARCH, &mut ctx).await.unwrap_err();
        assert!(matches!(err, GeoError::Aborted(_)));
    }

    #[tokio::test]
    async fn edit_reloads_profile_from_disk() {
        let (_dir, storage, mut ctx) = setup().await;
        let edited = BrandProfile {
            name: "Acme".into(),
            competitors: vec!["Globex".into()],
            ..BrandProfile::default()
        };
        storage.save("run-1", layout::BRAND_PROFILE, &edited).await.unwrap();

        let hook = ReviewHook::new(storage, scripted(&["e", "", "c"]));
        hook.after_stage(RESEARCH, &mut ctx).await.unwrap();
        assert_eq!(ctx.brand_profile.unwrap().competitors, vec!["Globex".to_string()]);
    }

    #[tokio::test]
    async fn other_stages_pass_through() {
        let (_dir, storage, mut ctx) = setup().await;
        let hook = ReviewHook::new(storage, scripted(&[]));
        hook.after_stage("execution", &mut ctx).await.unwrap();
    }
}
