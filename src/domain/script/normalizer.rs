//! 脚本规范化
//!
//! 将最后一个阶段的原始输出转换为强类型的对白序列。
//! 规范化永远不会失败到调用方：格式错误被记录并以 `NormalizedScript::Malformed` 返回。

use super::errors::{ParseErrorKind, ScriptParseError};
use super::literal::parse_pair_list;
use super::value_objects::{UnknownSpeakerPolicy, Utterance};

/// 日志中保留的原始文本预览长度
const PREVIEW_CHARS: usize = 200;

/// 最后一个阶段产出的原始结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawModelOutput {
    /// 自由文本（通常是列表字面量）
    Text(String),
    /// 已经结构化的 (角色, 台词) 列表
    Pairs(Vec<(String, String)>),
}

impl From<String> for RawModelOutput {
    fn from(text: String) -> Self {
        RawModelOutput::Text(text)
    }
}

impl From<&str> for RawModelOutput {
    fn from(text: &str) -> Self {
        RawModelOutput::Text(text.to_string())
    }
}

/// 规范化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedScript {
    /// 非空对白序列
    Script(Vec<Utterance>),
    /// 格式正确但没有任何对白
    Empty,
    /// 无法解析
    Malformed(ScriptParseError),
}

impl NormalizedScript {
    /// 尽力而为：任何失败都降级为空序列
    pub fn into_utterances(self) -> Vec<Utterance> {
        match self {
            NormalizedScript::Script(utterances) => utterances,
            NormalizedScript::Empty | NormalizedScript::Malformed(_) => Vec::new(),
        }
    }
}

/// 脚本规范化器
#[derive(Debug, Clone, Default)]
pub struct ScriptNormalizer {
    unknown_speaker: UnknownSpeakerPolicy,
}

impl ScriptNormalizer {
    pub fn new(unknown_speaker: UnknownSpeakerPolicy) -> Self {
        Self { unknown_speaker }
    }

    pub fn normalize(&self, raw: RawModelOutput) -> NormalizedScript {
        let pairs = match raw {
            RawModelOutput::Pairs(pairs) => pairs,
            RawModelOutput::Text(text) => {
                let cleaned = strip_code_fences(&text);
                match parse_pair_list(&cleaned) {
                    Ok(pairs) => pairs,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            preview = %preview(&cleaned),
                            "Failed to parse conversation script"
                        );
                        return NormalizedScript::Malformed(e);
                    }
                }
            }
        };

        self.to_utterances(pairs)
    }

    fn to_utterances(&self, pairs: Vec<(String, String)>) -> NormalizedScript {
        let mut utterances = Vec::with_capacity(pairs.len());

        for (entry, (label, text)) in pairs.into_iter().enumerate() {
            let speaker = match self.unknown_speaker.resolve(&label) {
                Some(speaker) => speaker,
                None => {
                    let e = ScriptParseError {
                        kind: ParseErrorKind::UnknownSpeaker(label),
                        offset: 0,
                        entry: Some(entry),
                    };
                    tracing::warn!(error = %e, "Rejected conversation entry");
                    return NormalizedScript::Malformed(e);
                }
            };

            let text = text.trim();
            if text.is_empty() {
                tracing::warn!(entry, speaker = %speaker, "Dropping blank utterance");
                continue;
            }

            utterances.push(Utterance::new(speaker, text));
        }

        if utterances.is_empty() {
            tracing::warn!("Conversation script contains no utterances");
            NormalizedScript::Empty
        } else {
            tracing::debug!(count = utterances.len(), "Conversation script normalized");
            NormalizedScript::Script(utterances)
        }
    }
}

/// 去掉 Markdown 代码围栏（```、```python 等）和首尾空白
///
/// 只删除独占一行的围栏和末尾紧贴内容的闭合围栏，对白中的 ``` 原样保留
pub fn strip_code_fences(text: &str) -> String {
    let kept: Vec<&str> = text.lines().filter(|line| !is_fence_line(line)).collect();
    let joined = kept.join("\n");
    let trimmed = joined.trim();
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim().to_string()
}

/// ``` 加可选的语言标记
fn is_fence_line(line: &str) -> bool {
    line.trim().strip_prefix("```").is_some_and(|tag| {
        tag.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
    })
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push('…');
    }
    preview
}
