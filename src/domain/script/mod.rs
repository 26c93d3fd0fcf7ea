//! Script Context - 对白脚本上下文
//!
//! 职责:
//! - 对白的值对象（角色、台词、运行标识）
//! - 列表字面量解析
//! - 原始模型输出的规范化

mod errors;
mod literal;
mod normalizer;
mod value_objects;

pub use errors::{ParseErrorKind, ScriptParseError};
pub use literal::parse_pair_list;
pub use normalizer::{strip_code_fences, NormalizedScript, RawModelOutput, ScriptNormalizer};
pub use value_objects::{CompanyName, RunId, Speaker, UnknownSpeakerPolicy, Utterance};
