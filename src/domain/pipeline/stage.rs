//! Pipeline Context - 阶段描述

use serde::{Deserialize, Serialize};

/// 阶段可使用的外部能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    WebSearch,
}

/// 流水线中的一个阶段
///
/// 不变量: 构造后不可变，由编排驱动只读消费
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    role: String,
    goal: String,
    backstory: String,
    capabilities: Vec<Capability>,
    input_template: String,
    expected_output: String,
}

impl PipelineStage {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        input_template: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            capabilities: Vec::new(),
            input_template: input_template.into(),
            expected_output: expected_output.into(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// 阶段的系统提示：角色、目标、背景
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }

    /// 渲染任务描述，替换 `{companies}` 占位符
    pub fn render_task(&self, companies: &[String]) -> String {
        self.input_template
            .replace("{companies}", &companies.join(", "))
    }

    /// 阶段的用户提示：任务、期望输出，以及上游上下文
    pub fn user_prompt(&self, companies: &[String], context: &[String]) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.render_task(companies),
            self.expected_output
        );

        let context: Vec<&str> = context
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(&context.join("\n\n"));
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> PipelineStage {
        PipelineStage::new(
            "Tester",
            "Test things.",
            "An experienced tester.",
            "Check {companies} carefully.",
            "A list of findings.",
        )
    }

    #[test]
    fn test_render_task_interpolates_companies() {
        let companies = vec!["Apple".to_string(), "Google".to_string()];
        assert_eq!(stage().render_task(&companies), "Check Apple, Google carefully.");
    }

    #[test]
    fn test_user_prompt_includes_context() {
        let companies = vec!["Apple".to_string()];
        let prompt = stage().user_prompt(&companies, &["previous output".to_string()]);
        assert!(prompt.contains("Check Apple carefully."));
        assert!(prompt.contains("A list of findings."));
        assert!(prompt.ends_with("previous output"));
    }

    #[test]
    fn test_user_prompt_without_context() {
        let prompt = stage().user_prompt(&["Apple".to_string()], &["  ".to_string()]);
        assert!(!prompt.contains("context you're working with"));
    }

    #[test]
    fn test_capabilities() {
        let stage = stage()
            .with_capability(Capability::WebSearch)
            .with_capability(Capability::WebSearch);
        assert!(stage.has_capability(Capability::WebSearch));
        assert_eq!(stage.capabilities.len(), 1);
    }

    #[test]
    fn test_system_prompt() {
        let prompt = stage().system_prompt();
        assert!(prompt.starts_with("You are Tester."));
        assert!(prompt.contains("Test things."));
    }
}
