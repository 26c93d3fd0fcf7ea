//! Script Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 单次生成任务的唯一标识
///
/// 所有临时资源（分段音频文件）都以 RunId 命名空间隔离，并发运行互不冲突
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 公司名称
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyName(String);

impl CompanyName {
    pub fn new(name: impl Into<String>) -> Result<Self, &'static str> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err("company name cannot be empty");
        }
        if name.len() > 200 {
            return Err("company name cannot exceed 200 characters");
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompanyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 对话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Host,
    Guest,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Host => "Host",
            Speaker::Guest => "Guest",
        }
    }

    /// 精确匹配角色标签（忽略大小写和首尾空白）
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("host") {
            Some(Speaker::Host)
        } else if label.eq_ignore_ascii_case("guest") {
            Some(Speaker::Guest)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知角色标签的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownSpeakerPolicy {
    /// 归为 Guest
    #[default]
    Guest,
    /// 归为 Host
    Host,
    /// 视为格式错误
    Reject,
}

impl UnknownSpeakerPolicy {
    /// 解析角色标签，`None` 表示该标签被拒绝
    pub fn resolve(&self, label: &str) -> Option<Speaker> {
        Speaker::from_label(label).or(match self {
            UnknownSpeakerPolicy::Guest => Some(Speaker::Guest),
            UnknownSpeakerPolicy::Host => Some(Speaker::Host),
            UnknownSpeakerPolicy::Reject => None,
        })
    }
}

/// 一句对白
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
}

impl Utterance {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn host(text: impl Into<String>) -> Self {
        Self::new(Speaker::Host, text)
    }

    pub fn guest(text: impl Into<String>) -> Self {
        Self::new(Speaker::Guest, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_from_label() {
        assert_eq!(Speaker::from_label("Host"), Some(Speaker::Host));
        assert_eq!(Speaker::from_label(" guest "), Some(Speaker::Guest));
        assert_eq!(Speaker::from_label("Narrator"), None);
    }

    #[test]
    fn test_unknown_speaker_policy() {
        assert_eq!(
            UnknownSpeakerPolicy::Guest.resolve("Narrator"),
            Some(Speaker::Guest)
        );
        assert_eq!(
            UnknownSpeakerPolicy::Host.resolve("Narrator"),
            Some(Speaker::Host)
        );
        assert_eq!(UnknownSpeakerPolicy::Reject.resolve("Narrator"), None);
        // 已知标签不受策略影响
        assert_eq!(
            UnknownSpeakerPolicy::Reject.resolve("Host"),
            Some(Speaker::Host)
        );
        assert_eq!(
            UnknownSpeakerPolicy::Host.resolve("Guest"),
            Some(Speaker::Guest)
        );
    }

    #[test]
    fn test_company_name_validation() {
        assert!(CompanyName::new("  ").is_err());
        assert_eq!(CompanyName::new(" Apple ").unwrap().as_str(), "Apple");
    }

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
