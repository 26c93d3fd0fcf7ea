//! 播客脚本流水线的三个标准阶段：调研 → 分析 → 脚本

use super::stage::{Capability, PipelineStage};

/// 脚本阶段中嵌入的格式示例
pub const SCRIPT_FORMAT_EXAMPLE: &str = r#"[
    ("Host", "Welcome to our podcast! Today, we're discussing Apple's recent stock performance."),
    ("Guest", "Thanks for having me! Apple's stock is currently trading at around $245.55."),
    ("Host", "That's impressive growth. What's driving this bullish trend?"),
    ("Guest", "The stock's bullish trend is supported by strong upward momentum.")
]"#;

/// 调研阶段（可使用网络搜索）
pub fn research_stage() -> PipelineStage {
    PipelineStage::new(
        "Company Researcher",
        "Research companies and gather relevant information.",
        "Expert researcher for company information.",
        "Research the following companies: {companies}. Gather detailed information on \
         stock prices, trends, news, and other relevant metrics.",
        "A detailed report on each company including:\n\
         - Stock price\n\
         - Stock trend\n\
         - Dividends\n\
         - Market cap\n\
         - Next financial earnings\n\
         - Trending news (at least 1 minute worth of reading material)",
    )
    .with_capability(Capability::WebSearch)
}

/// 分析阶段
pub fn analysis_stage() -> PipelineStage {
    PipelineStage::new(
        "Technical Analyst",
        "Analyze and refine the information gathered by the researcher into a concise summary.",
        "You are a technical analyst with expertise in interpreting financial data and trends.",
        "Analyze the research data and refine it into a concise summary. Highlight key \
         trends, insights, and notable events.",
        "A refined summary of the research data, highlighting key points and trends.",
    )
}

/// 脚本阶段
pub fn script_stage() -> PipelineStage {
    PipelineStage::new(
        "Podcast Creator",
        "Create an engaging podcast script based on the analyzed information, including \
         questions and jokes.",
        "You are a creative podcast host who turns complex information into entertaining \
         and informative content.",
        format!(
            "Create a podcast script based on the analyzed data. Include interesting \
             questions, jokes, and a conversational tone.\n\
             The script should be structured as a list of tuples, where each tuple contains \
             the speaker's role (\"Host\" or \"Guest\") and their dialogue.\n\
             Example format:\n{}\n\
             Ensure the script is engaging, informative, and entertaining.",
            SCRIPT_FORMAT_EXAMPLE
        ),
        format!(
            "A podcast script structured as a list of tuples, where each tuple contains the \
             speaker's role and their dialogue. Return only the list, without any other text. \
             Example:\n{}",
            SCRIPT_FORMAT_EXAMPLE
        ),
    )
}

/// 默认的三阶段流水线，按执行顺序排列
pub fn podcast_pipeline() -> Vec<PipelineStage> {
    vec![research_stage(), analysis_stage(), script_stage()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::parse_pair_list;

    #[test]
    fn test_pipeline_order() {
        let roles: Vec<String> = podcast_pipeline()
            .iter()
            .map(|s| s.role().to_string())
            .collect();
        assert_eq!(
            roles,
            vec!["Company Researcher", "Technical Analyst", "Podcast Creator"]
        );
    }

    #[test]
    fn test_only_research_uses_search() {
        let stages = podcast_pipeline();
        assert!(stages[0].has_capability(Capability::WebSearch));
        assert!(!stages[1].has_capability(Capability::WebSearch));
        assert!(!stages[2].has_capability(Capability::WebSearch));
    }

    #[test]
    fn test_format_example_is_parseable() {
        let pairs = parse_pair_list(SCRIPT_FORMAT_EXAMPLE).unwrap();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0].0, "Host");
    }
}
