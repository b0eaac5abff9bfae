// ==========================================
// 供应链发运分析系统 - 核心库
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 系统总览
// 技术栈: Rust + calamine + CSV 落盘
// 系统定位: 发运/销售月度快照的提取、清洗与 KPI 计算管道
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与数据集
pub mod domain;

// 提取层 - 工作簿读取/日期归一化/记录清洗
pub mod extractor;

// 引擎层 - KPI 计算与数据集过滤
pub mod engine;

// 存储层 - 提取结果落盘（CSV + 元数据）
pub mod store;

// 配置层 - 源文件路径与输出位置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 展示层调用入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DeliveryStatus, FilterDimension, TopMetric};

// 领域实体
pub use domain::{
    Dataset, ExtractionMeta, QualityReport, RawTable, SalesRecord, SalesTable, ShipmentRecord,
};

// 提取层
pub use extractor::{ShipmentExtractor, SourcePaths};

// 引擎
pub use engine::filter::{DateRange, DimensionFilters, FilterApplier};
pub use engine::kpi::KpiEngine;

// 存储
pub use store::DatasetStore;

// API
pub use api::DashboardApi;

// 配置
pub use config::PipelineConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应链发运分析系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
