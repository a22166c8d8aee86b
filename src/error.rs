//! ライブラリのエラー型

use thiserror::Error;

/// 人型モデル読み込みの失敗
///
/// 読み込みに失敗しても、既に読み込まれているモデルは影響を受けない。
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model file is not a valid humanoid description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model lacks required humanoid bones: {}", .0.join(", "))]
    MissingBones(Vec<String>),

    #[error("unknown humanoid bone name: {0}")]
    UnknownBone(String),

    #[error("unknown expression name: {0}")]
    UnknownExpression(String),
}

/// モード名・スタイル名の解析失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} name: {name:?}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

pub type Result<T> = std::result::Result<T, ModelLoadError>;
