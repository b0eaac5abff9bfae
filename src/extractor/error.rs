// ==========================================
// 供应链发运分析系统 - 提取模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 提取模块错误类型
#[derive(Error, Debug)]
pub enum ExtractError {
    // ===== 致命错误: 中止提取,不发布任何输出 =====
    #[error("源工作簿不存在: {0}")]
    SourceUnavailable(String),

    #[error("工作簿 {workbook} 缺少预期工作表: {sheet}")]
    SheetNotFound { workbook: String, sheet: String },

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("工作表 {sheet} 数据区为空")]
    EmptySheet { sheet: String },

    // ===== 通用错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::FileReadError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ExtractError {
    fn from(err: calamine::XlsxError) -> Self {
        ExtractError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ExtractResult<T> = Result<T, ExtractError>;
