//! Podcast Command Handlers
//!
//! 流程: 校验输入 → 三阶段脚本生成 → 规范化 → 逐句合成与拼接 → 导出

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::commands::podcast_commands::*;
use crate::application::error::ApplicationError;
use crate::application::services::{AudioAssembler, ScriptGenerator};
use crate::domain::script::{CompanyName, NormalizedScript, RunId, ScriptNormalizer};

/// Generate Podcast Handler
pub struct GeneratePodcastHandler {
    generator: Arc<ScriptGenerator>,
    normalizer: ScriptNormalizer,
    assembler: Arc<AudioAssembler>,
    timeout: Duration,
    /// 输出文件只能位于该目录之下
    output_root: PathBuf,
}

impl GeneratePodcastHandler {
    pub fn new(
        generator: Arc<ScriptGenerator>,
        normalizer: ScriptNormalizer,
        assembler: Arc<AudioAssembler>,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            normalizer,
            assembler,
            timeout,
            output_root: PathBuf::from("."),
        }
    }

    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// 执行一次完整的播客生成
    ///
    /// 取消或超时会丢弃正在运行的流水线，临时目录在最后一个租约释放时删除
    pub async fn handle(
        &self,
        cmd: GeneratePodcast,
        cancel: CancellationToken,
    ) -> Result<PodcastReport, ApplicationError> {
        let (companies, output_file) = validate(cmd, &self.output_root)?;
        let run_id = RunId::new();

        tracing::info!(
            run_id = %run_id,
            companies = ?companies.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            output = %output_file.display(),
            "Podcast generation started"
        );

        let run = self.run(run_id, &companies, output_file);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApplicationError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, run) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ApplicationError::Timeout(self.timeout.as_secs())),
            },
        };

        match &result {
            Ok(report) => tracing::info!(
                run_id = %run_id,
                utterances = report.utterances,
                duration_ms = report.duration_ms,
                "Podcast generation completed"
            ),
            Err(e) => tracing::warn!(run_id = %run_id, error = %e, "Podcast generation failed"),
        }

        result
    }

    async fn run(
        &self,
        run_id: RunId,
        companies: &[CompanyName],
        output_file: PathBuf,
    ) -> Result<PodcastReport, ApplicationError> {
        let draft = self.generator.run(companies).await?;

        let utterances = match self.normalizer.normalize(draft.raw) {
            NormalizedScript::Script(utterances) => utterances,
            NormalizedScript::Empty => return Err(ApplicationError::EmptyConversation),
            NormalizedScript::Malformed(e) => return Err(ApplicationError::MalformedScript(e)),
        };

        tracing::info!(
            run_id = %run_id,
            utterances = utterances.len(),
            "Script normalized, synthesizing audio"
        );

        let assembly = self
            .assembler
            .assemble(run_id, &utterances, &output_file)
            .await?;

        Ok(PodcastReport {
            run_id,
            output_file: assembly.output_file,
            format: assembly.format,
            utterances: utterances.len(),
            duration_ms: assembly.duration_ms,
        })
    }
}

fn validate(
    cmd: GeneratePodcast,
    output_root: &Path,
) -> Result<(Vec<CompanyName>, PathBuf), ApplicationError> {
    if cmd.companies.is_empty() {
        return Err(ApplicationError::validation("No companies provided"));
    }

    let companies = cmd
        .companies
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            CompanyName::new(name).map_err(|e| {
                ApplicationError::validation(format!("Invalid company at position {}: {}", i, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let output_file = resolve_output(output_root, &cmd.output_file)?;

    Ok((companies, output_file))
}

/// 将请求的输出路径解析到输出根目录下
///
/// 只接受相对路径，且不得包含 `..`
fn resolve_output(output_root: &Path, requested: &Path) -> Result<PathBuf, ApplicationError> {
    if requested.as_os_str().is_empty() {
        return Err(ApplicationError::validation("Output file cannot be empty"));
    }

    let mut relative = PathBuf::new();
    for component in requested.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ApplicationError::validation(format!(
                    "Output file {:?} must be a relative path inside the output directory",
                    requested.display().to_string()
                )));
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(ApplicationError::validation("Output file cannot be empty"));
    }

    Ok(output_root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::AudioFormat;
    use crate::application::services::{AgentSettings, AssemblerConfig, VoiceSettings};
    use crate::infrastructure::adapters::{
        FakeLanguageModel, FakeTtsClient, FakeTtsClientConfig, FakeWebSearch, FileScratchStorage,
        SymphoniaCodec,
    };
    use tempfile::{tempdir, TempDir};
    use tokio::sync::Semaphore;

    struct Harness {
        dir: TempDir,
        llm: Arc<FakeLanguageModel>,
        search: Arc<FakeWebSearch>,
        tts: Arc<FakeTtsClient>,
        handler: GeneratePodcastHandler,
    }

    impl Harness {
        fn scratch_dir(&self) -> PathBuf {
            self.dir.path().join("tmp")
        }

        fn output(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        /// 被中止的分段写入结束后目录才会删除，短暂轮询
        async fn scratch_is_empty(&self) -> bool {
            for _ in 0..100 {
                let empty = std::fs::read_dir(self.scratch_dir())
                    .map(|mut entries| entries.next().is_none())
                    .unwrap_or(true);
                if empty {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            false
        }
    }

    async fn harness(
        script: &str,
        tts_config: FakeTtsClientConfig,
        timeout: Duration,
    ) -> Harness {
        let dir = tempdir().unwrap();
        let llm = Arc::new(FakeLanguageModel::scripted(vec![
            "Apple research report",
            "Apple analysis",
            script,
        ]));
        let search = Arc::new(FakeWebSearch::new());
        let tts = Arc::new(FakeTtsClient::new(tts_config));
        let scratch = Arc::new(FileScratchStorage::new(dir.path().join("tmp")).await.unwrap());

        let generator = Arc::new(ScriptGenerator::new(
            llm.clone(),
            search.clone(),
            AgentSettings::default(),
        ));
        let assembler = Arc::new(AudioAssembler::new(
            AssemblerConfig {
                voice: VoiceSettings::default(),
                max_concurrent: 4,
            },
            tts.clone(),
            Arc::new(SymphoniaCodec::default()),
            scratch,
            Arc::new(Semaphore::new(8)),
        ));

        let handler = GeneratePodcastHandler::new(
            generator,
            ScriptNormalizer::default(),
            assembler,
            timeout,
        )
        .with_output_root(dir.path());

        Harness {
            dir,
            llm,
            search,
            tts,
            handler,
        }
    }

    const HI_HELLO: &str = r#"[("Host", "Hi"), ("Guest", "Hello")]"#;

    #[tokio::test]
    async fn test_end_to_end_apple() {
        let h = harness(HI_HELLO, FakeTtsClientConfig::default(), Duration::from_secs(30)).await;
        let output = h.output("company_podcast.mp3");

        let report = h
            .handler
            .handle(
                GeneratePodcast::new(vec!["Apple".to_string()])
                    .with_output_file("company_podcast.mp3"),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.utterances, 2);
        assert_eq!(h.tts.call_count(), 2);
        assert_eq!(
            report.duration_ms,
            h.tts.duration_for("Hi") + 500 + h.tts.duration_for("Hello")
        );
        assert_eq!(report.output_file, output);
        assert_eq!(report.format, AudioFormat::Mp3);
        assert!(output.exists());
        assert!(h.scratch_is_empty().await);

        assert_eq!(h.llm.requests().len(), 3);
        assert_eq!(h.search.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_companies_makes_no_upstream_calls() {
        let h = harness(HI_HELLO, FakeTtsClientConfig::default(), Duration::from_secs(30)).await;

        let err = h
            .handler
            .handle(GeneratePodcast::new(Vec::new()), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(err.to_string(), "No companies provided");
        assert!(h.llm.requests().is_empty());
        assert!(h.search.queries().is_empty());
        assert_eq!(h.tts.call_count(), 0);
    }

    #[tokio::test]
    async fn test_output_outside_root_rejected() {
        let h = harness(HI_HELLO, FakeTtsClientConfig::default(), Duration::from_secs(30)).await;
        let outside = h.dir.path().parent().unwrap().join("escaped.mp3");

        for requested in [
            PathBuf::from("../escaped.mp3"),
            PathBuf::from("nested/../../escaped.mp3"),
            outside.clone(),
        ] {
            let err = h
                .handler
                .handle(
                    GeneratePodcast::new(vec!["Apple".to_string()]).with_output_file(&requested),
                    CancellationToken::new(),
                )
                .await
                .unwrap_err();
            assert!(
                matches!(err, ApplicationError::Validation(_)),
                "{:?} should be rejected",
                requested
            );
        }

        assert!(!outside.exists());
        assert!(h.llm.requests().is_empty());
        assert_eq!(h.tts.call_count(), 0);
    }

    #[test]
    fn test_resolve_output_under_root() {
        let root = Path::new("/srv/podcasts");
        assert_eq!(
            resolve_output(root, Path::new("./shows/apple.mp3")).unwrap(),
            root.join("shows/apple.mp3")
        );
        assert!(resolve_output(root, Path::new("")).is_err());
        assert!(resolve_output(root, Path::new(".")).is_err());
    }

    #[tokio::test]
    async fn test_blank_company_rejected() {
        let h = harness(HI_HELLO, FakeTtsClientConfig::default(), Duration::from_secs(30)).await;

        let err = h
            .handler
            .handle(
                GeneratePodcast::new(vec!["Apple".to_string(), "  ".to_string()]),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Validation(_)));
        assert!(h.llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_script_aborts_before_synthesis() {
        let h = harness("[]", FakeTtsClientConfig::default(), Duration::from_secs(30)).await;

        let err = h
            .handler
            .handle(
                GeneratePodcast::new(vec!["Apple".to_string()])
                    .with_output_file("out.wav"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::EmptyConversation));
        assert_eq!(h.tts.call_count(), 0);
        assert!(!h.output("out.wav").exists());
    }

    #[tokio::test]
    async fn test_malformed_script_aborts_before_synthesis() {
        let h = harness(
            r#"Sure! Here is the script: [("Host", "Hi"),"#,
            FakeTtsClientConfig::default(),
            Duration::from_secs(30),
        )
        .await;

        let err = h
            .handler
            .handle(
                GeneratePodcast::new(vec!["Apple".to_string()])
                    .with_output_file("out.wav"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::MalformedScript(_)));
        assert_eq!(h.tts.call_count(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_surfaces_and_cleans_up() {
        let h = harness(
            HI_HELLO,
            FakeTtsClientConfig {
                fail_on: Some("Hello".to_string()),
                ..Default::default()
            },
            Duration::from_secs(30),
        )
        .await;

        let err = h
            .handler
            .handle(
                GeneratePodcast::new(vec!["Apple".to_string()])
                    .with_output_file("out.wav"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Assembly(_)));
        assert!(!h.output("out.wav").exists());
        assert!(h.scratch_is_empty().await);
    }

    #[tokio::test]
    async fn test_timeout_cleans_up() {
        let h = harness(
            HI_HELLO,
            FakeTtsClientConfig {
                latency_ms: 500,
                ..Default::default()
            },
            Duration::from_millis(100),
        )
        .await;

        let err = h
            .handler
            .handle(
                GeneratePodcast::new(vec!["Apple".to_string()])
                    .with_output_file("out.wav"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Timeout(_)));
        assert!(!h.output("out.wav").exists());
        assert!(h.scratch_is_empty().await);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let h = harness(HI_HELLO, FakeTtsClientConfig::default(), Duration::from_secs(30)).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = h
            .handler
            .handle(GeneratePodcast::new(vec!["Apple".to_string()]), cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Cancelled));
        assert_eq!(h.tts.call_count(), 0);
    }
}
