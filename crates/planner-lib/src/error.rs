//! Error taxonomy for the planning pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by loading, analysis and export
#[derive(Error, Debug)]
pub enum PlannerError {
    /// A pool string is not in `physical_cluster/iaas_cluster` form
    #[error("资源池格式错误，请使用'Physical Cluster/IaaS Cluster'格式: {0:?}")]
    InvalidPool(String),

    #[error("缺少必要参数: {0}")]
    MissingParameter(&'static str),

    /// A column the analysis depends on is absent from the whole table
    #[error("数据中缺少字段: {0}")]
    MissingColumn(String),

    #[error("没有找到{idc}机房{pool}资源池中的数据")]
    NoDataForScope { idc: String, pool: String },

    #[error("数据文件不存在: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("加载数据文件失败 {}: {reason}", .path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("不支持的数据文件类型: {}", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("报告文件已存在: {}", .0.display())]
    ExportTargetExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PlannerError {
    /// Stable label for metrics and API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PlannerError::InvalidPool(_) => "invalid_pool",
            PlannerError::MissingParameter(_) => "missing_parameter",
            PlannerError::MissingColumn(_) => "missing_column",
            PlannerError::NoDataForScope { .. } => "no_data_for_scope",
            PlannerError::SourceNotFound(_) => "source_not_found",
            PlannerError::SourceUnreadable { .. } => "source_unreadable",
            PlannerError::UnsupportedSource(_) => "unsupported_source",
            PlannerError::ExportTargetExists(_) => "export_target_exists",
            PlannerError::Io(_) => "io",
            PlannerError::Json(_) => "json",
            PlannerError::Csv(_) => "csv",
        }
    }

    /// True when the failure comes from the caller's parameters rather than the data
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            PlannerError::InvalidPool(_) | PlannerError::MissingParameter(_)
        )
    }

    /// True when the inventory file itself could not be opened or parsed
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            PlannerError::SourceNotFound(_)
                | PlannerError::SourceUnreadable { .. }
                | PlannerError::UnsupportedSource(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
