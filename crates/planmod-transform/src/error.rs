//! 替换错误定义
//!
//! 规则按顺序生效且不回滚，错误里带着出错前已经应用的规则数。

use planmod_file::FileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubstitutionError {
    #[error("Missing base drawing")]
    MissingDrawing,

    #[error("Unreadable base drawing: {0}")]
    Drawing(#[source] FileError),

    #[error("Invalid rule '{rule}': {reason} ({applied} rules already applied)")]
    InvalidRule {
        rule: String,
        reason: String,
        applied: usize,
    },

    #[error("Failed to serialize drawing after {applied} rules: {source}")]
    Serialize {
        #[source]
        source: FileError,
        applied: usize,
    },
}

impl SubstitutionError {
    /// 出错前已完成的规则数
    pub fn applied(&self) -> usize {
        match self {
            SubstitutionError::MissingDrawing | SubstitutionError::Drawing(_) => 0,
            SubstitutionError::InvalidRule { applied, .. }
            | SubstitutionError::Serialize { applied, .. } => *applied,
        }
    }
}

pub type SubstitutionResult<T> = Result<T, SubstitutionError>;
