// ==========================================
// 供应链发运分析系统 - 存储模块错误类型
// ==========================================

use thiserror::Error;

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("输出位置已被另一提取进程锁定: {0}")]
    Locked(String),

    #[error("数据集尚未发布: {0}")]
    NotPublished(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 读写失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("元数据序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result 类型别名
pub type StoreResult<T> = Result<T, StoreError>;
