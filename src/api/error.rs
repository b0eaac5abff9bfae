// ==========================================
// 供应链发运分析系统 - API 层错误类型
// ==========================================

use crate::extractor::ExtractError;
use crate::store::StoreError;
use thiserror::Error;

/// API 层错误类型: 汇聚提取与存储错误,供展示层统一呈现
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
