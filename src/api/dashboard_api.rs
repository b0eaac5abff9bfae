// ==========================================
// 供应链发运分析系统 - 看板 API
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 4. 展示层调用契约
// 契约: extract → 输出位置; load → Dataset; filter → Dataset;
//       KPI 操作均为传入 Dataset 的纯计算
// 红线: 无"当前数据集"会话单例; 展示层每次显式传入 Dataset
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::dataset::Dataset;
use crate::domain::types::{FilterDimension, TopMetric};
use crate::engine::filter::{DateRange, DimensionFilters, FilterApplier};
use crate::engine::kpi::{
    BreakdownSort, ChannelBreakdownRow, DailyRollupRow, GroupBreakdownRow, IouBreakdownRow,
    KpiEngine, KpiSummary, OverallRates, SalesKpis, TopGroupRow,
};
use crate::extractor::{ShipmentExtractor, SourcePaths};
use crate::store::DatasetStore;
use std::path::{Path, PathBuf};
use tracing::info;

// ==========================================
// DashboardApi
// ==========================================
pub struct DashboardApi {
    config: PipelineConfig,
    extractor: ShipmentExtractor,
    store: DatasetStore,
    filter: FilterApplier,
    kpi: KpiEngine,
}

impl DashboardApi {
    pub fn new(config: PipelineConfig) -> Self {
        let store = DatasetStore::new(&config.output_dir);
        Self {
            config,
            extractor: ShipmentExtractor::new(),
            store,
            filter: FilterApplier,
            kpi: KpiEngine,
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.store.output_dir()
    }

    /// 按需提取并发布
    ///
    /// 已发布且未开启 force_refresh 时直接复用既有输出
    /// (以输出位置为键的"是否已存在"检查,配合存储层锁文件,
    /// 保证并发会话下至多一次提取)
    pub fn refresh(&self) -> crate::api::ApiResult<PathBuf> {
        if self.store.is_published() && !self.config.force_refresh {
            info!(out_dir = %self.store.output_dir().display(), "输出已存在,跳过提取");
            return Ok(self.store.output_dir().to_path_buf());
        }

        let sources = SourcePaths {
            shipment_workbook: self.config.shipment_workbook.clone(),
            sales_workbook: self.config.sales_workbook.clone(),
        };
        let dataset = self.extractor.extract(&sources)?;
        let out_dir = self.store.publish(&dataset)?;
        Ok(out_dir)
    }

    /// 从已发布位置加载数据集
    pub fn load(&self) -> crate::api::ApiResult<Dataset> {
        Ok(self.store.load()?)
    }

    /// 过滤出派生数据集 (原数据集不变)
    pub fn filter(
        &self,
        dataset: &Dataset,
        date_range: &DateRange,
        filters: &DimensionFilters,
    ) -> Dataset {
        self.filter.apply(dataset, date_range, filters)
    }

    // ===== KPI 操作 (纯计算透传) =====

    pub fn overall_rates(&self, dataset: &Dataset) -> OverallRates {
        self.kpi.overall_rates(dataset)
    }

    pub fn average_delay_for_late(&self, dataset: &Dataset) -> f64 {
        self.kpi.average_delay_for_late(dataset)
    }

    pub fn group_breakdown(
        &self,
        dataset: &Dataset,
        dimension: FilterDimension,
        sort: BreakdownSort,
    ) -> Vec<GroupBreakdownRow> {
        self.kpi.group_breakdown(dataset, dimension, sort)
    }

    pub fn daily_rollup(&self, dataset: &Dataset) -> Vec<DailyRollupRow> {
        self.kpi.daily_rollup(dataset)
    }

    pub fn sales_kpis(&self, dataset: &Dataset) -> SalesKpis {
        self.kpi.sales_kpis(dataset)
    }

    pub fn top_n(&self, dataset: &Dataset, n: usize, metric: TopMetric) -> Vec<TopGroupRow> {
        self.kpi.top_n(dataset, n, metric)
    }

    pub fn kpi_summary(&self, dataset: &Dataset) -> KpiSummary {
        self.kpi.kpi_summary(dataset)
    }

    pub fn sales_channel_breakdown(&self, dataset: &Dataset) -> Vec<ChannelBreakdownRow> {
        self.kpi.sales_channel_breakdown(dataset)
    }

    pub fn iou_breakdown(&self, dataset: &Dataset) -> Vec<IouBreakdownRow> {
        self.kpi.iou_breakdown(dataset)
    }
}
