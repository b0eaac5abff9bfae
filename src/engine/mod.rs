// ==========================================
// 供应链发运分析系统 - 引擎层
// ==========================================
// KPI 计算与数据集过滤; 全部为 Dataset 的纯函数
// ==========================================

pub mod filter;
pub mod kpi;

pub use filter::{DateRange, DimensionFilters, FilterApplier, ResolvedDateRange};
pub use kpi::{
    BreakdownSort, ChannelBreakdownRow, DailyRollupRow, GroupBreakdownRow, IouBreakdownRow,
    KpiEngine, KpiSummary, OverallRates, SalesKpis, TopGroupRow,
};
