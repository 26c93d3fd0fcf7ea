//! Script Generator - 三阶段内容流水线驱动
//!
//! 按顺序执行阶段描述列表：每个阶段的完整输出作为下一个阶段的上下文，
//! 最后一个阶段的输出作为原始脚本返回，交给规范化处理。

use futures_util::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::application::ports::{
    format_search_hits, CompletionRequest, LanguageModelPort, LlmError, SearchError,
    WebSearchPort,
};
use crate::domain::pipeline::{podcast_pipeline, Capability, PipelineStage};
use crate::domain::script::{CompanyName, RawModelOutput};

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline has no stages")]
    NoStages,

    #[error("Stage '{stage}' failed: {source}")]
    Generation {
        stage: String,
        #[source]
        source: LlmError,
    },

    #[error("Stage '{stage}' web search failed: {source}")]
    Search {
        stage: String,
        #[source]
        source: SearchError,
    },
}

/// 文本生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// 模型标识，如 `openai/gpt-4o`
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o".to_string(),
            temperature: 0.8,
            max_tokens: 1500,
        }
    }
}

/// 单个阶段的输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub role: String,
    pub text: String,
}

/// 一次流水线运行的结果
#[derive(Debug, Clone)]
pub struct ScriptDraft {
    /// 每个阶段的输出，按执行顺序
    pub stages: Vec<StageOutput>,
    /// 最后一个阶段的原始输出
    pub raw: RawModelOutput,
}

/// 脚本生成器
pub struct ScriptGenerator {
    stages: Vec<PipelineStage>,
    llm: Arc<dyn LanguageModelPort>,
    search: Arc<dyn WebSearchPort>,
    settings: AgentSettings,
}

impl ScriptGenerator {
    /// 使用默认的三阶段播客流水线
    pub fn new(
        llm: Arc<dyn LanguageModelPort>,
        search: Arc<dyn WebSearchPort>,
        settings: AgentSettings,
    ) -> Self {
        Self::with_stages(podcast_pipeline(), llm, search, settings)
    }

    pub fn with_stages(
        stages: Vec<PipelineStage>,
        llm: Arc<dyn LanguageModelPort>,
        search: Arc<dyn WebSearchPort>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            stages,
            llm,
            search,
            settings,
        }
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// 顺序执行全部阶段
    pub async fn run(&self, companies: &[CompanyName]) -> Result<ScriptDraft, PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::NoStages);
        }

        let companies: Vec<String> = companies.iter().map(|c| c.to_string()).collect();
        let mut outputs: Vec<StageOutput> = Vec::with_capacity(self.stages.len());

        for (position, stage) in self.stages.iter().enumerate() {
            let mut context = Vec::new();
            if let Some(previous) = outputs.last() {
                context.push(previous.text.clone());
            }
            if stage.has_capability(Capability::WebSearch) {
                context.extend(self.gather_search_context(stage, &companies).await?);
            }

            tracing::info!(
                stage = %stage.role(),
                position = position + 1,
                total = self.stages.len(),
                "Running pipeline stage"
            );

            let request = CompletionRequest {
                system: stage.system_prompt(),
                user: stage.user_prompt(&companies, &context),
                model: self.settings.model.clone(),
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            };

            let text = self.llm.complete(request).await.map_err(|e| {
                tracing::error!(stage = %stage.role(), error = %e, "Pipeline stage failed");
                PipelineError::Generation {
                    stage: stage.role().to_string(),
                    source: e,
                }
            })?;

            tracing::debug!(
                stage = %stage.role(),
                output_chars = text.len(),
                "Pipeline stage completed"
            );

            outputs.push(StageOutput {
                role: stage.role().to_string(),
                text,
            });
        }

        let raw = outputs
            .last()
            .map(|o| RawModelOutput::Text(o.text.clone()))
            .unwrap_or_else(|| RawModelOutput::Text(String::new()));

        Ok(ScriptDraft {
            stages: outputs,
            raw,
        })
    }

    /// 每个公司执行一次搜索，结果格式化为提示上下文
    async fn gather_search_context(
        &self,
        stage: &PipelineStage,
        companies: &[String],
    ) -> Result<Vec<String>, PipelineError> {
        let queries: Vec<String> = companies
            .iter()
            .map(|c| format!("{} stock price trend dividends market cap earnings news", c))
            .collect();

        let results = try_join_all(queries.iter().map(|q| self.search.search(q)))
            .await
            .map_err(|e| {
                tracing::error!(stage = %stage.role(), error = %e, "Web search failed");
                PipelineError::Search {
                    stage: stage.role().to_string(),
                    source: e,
                }
            })?;

        tracing::debug!(
            stage = %stage.role(),
            queries = queries.len(),
            hits = results.iter().map(|r| r.len()).sum::<usize>(),
            "Web search completed"
        );

        Ok(queries
            .iter()
            .zip(results.iter())
            .map(|(q, hits)| format_search_hits(q, hits))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{FakeLanguageModel, FakeWebSearch};

    fn companies(names: &[&str]) -> Vec<CompanyName> {
        names.iter().map(|n| CompanyName::new(*n).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_stages_run_in_order_and_chain_context() {
        let llm = Arc::new(FakeLanguageModel::scripted(vec![
            "research notes",
            "analysis summary",
            r#"[("Host", "Hi"), ("Guest", "Hello")]"#,
        ]));
        let search = Arc::new(FakeWebSearch::new());
        let generator = ScriptGenerator::new(llm.clone(), search.clone(), AgentSettings::default());

        let draft = generator.run(&companies(&["Apple"])).await.unwrap();

        assert_eq!(draft.stages.len(), 3);
        assert_eq!(draft.stages[0].role, "Company Researcher");
        assert_eq!(
            draft.raw,
            RawModelOutput::Text(r#"[("Host", "Hi"), ("Guest", "Hello")]"#.to_string())
        );

        let requests = llm.requests();
        assert_eq!(requests.len(), 3);
        // 调研阶段带有搜索结果
        assert!(requests[0].user.contains("Research the following companies: Apple."));
        assert!(requests[0].user.contains("Search results for \"Apple"));
        // 后续阶段拿到上一阶段的完整输出
        assert!(requests[1].user.ends_with("research notes"));
        assert!(requests[2].user.ends_with("analysis summary"));
        assert!(!requests[2].user.contains("research notes"));
        assert_eq!(requests[0].model, "openai/gpt-4o");
        assert_eq!(requests[0].max_tokens, 1500);

        assert_eq!(search.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_one_search_per_company() {
        let llm = Arc::new(FakeLanguageModel::scripted(vec!["a", "b", "[]"]));
        let search = Arc::new(FakeWebSearch::new());
        let generator = ScriptGenerator::new(llm, search.clone(), AgentSettings::default());

        generator
            .run(&companies(&["Apple", "Google"]))
            .await
            .unwrap();

        let queries = search.queries();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].starts_with("Apple"));
        assert!(queries[1].starts_with("Google"));
    }

    #[tokio::test]
    async fn test_stage_failure_stops_pipeline() {
        let llm = Arc::new(FakeLanguageModel::scripted(vec!["research notes"]));
        let search = Arc::new(FakeWebSearch::new());
        let generator = ScriptGenerator::new(llm.clone(), search, AgentSettings::default());

        let err = generator.run(&companies(&["Apple"])).await.unwrap_err();
        match err {
            PipelineError::Generation { stage, .. } => assert_eq!(stage, "Technical Analyst"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_search_failure_surfaces_before_generation() {
        let llm = Arc::new(FakeLanguageModel::scripted(vec!["a", "b", "c"]));
        let search = Arc::new(FakeWebSearch::failing());
        let generator = ScriptGenerator::new(llm.clone(), search, AgentSettings::default());

        let err = generator.run(&companies(&["Apple"])).await.unwrap_err();
        assert!(matches!(err, PipelineError::Search { .. }));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_pipeline_rejected() {
        let generator = ScriptGenerator::with_stages(
            Vec::new(),
            Arc::new(FakeLanguageModel::scripted(Vec::<String>::new())),
            Arc::new(FakeWebSearch::new()),
            AgentSettings::default(),
        );
        assert!(matches!(
            generator.run(&companies(&["Apple"])).await,
            Err(PipelineError::NoStages)
        ));
    }
}
