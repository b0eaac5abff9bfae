// ==========================================
// 供应链发运分析系统 - 数据集过滤器 (FilterApplier)
// ==========================================
// 依据: KPI_Spec_v1.0.md - 过滤口径
// 红线 (全系统最关键的正确性规则):
// - "全时段"与相对区间的锚点取自数据自身的实际发运日期范围,
//   绝不取墙钟"今天": 快照可能包含晚于今天的合法记录,
//   以今天为隐式上界会静默排除它们,使比率偏差数个百分点
// - "全时段"不施加任何日期谓词,因此对任何数据集幂等
// - 非平凡日期区间排除实际发运日期缺失的行 (未到期发运本就没有该日期)
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::shipment::ShipmentRecord;
use crate::domain::types::FilterDimension;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

// ==========================================
// DateRange - 日期约束
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRange {
    /// 全时段: 不施加日期谓词
    AllTime,
    /// 最近 N 天: 锚定到数据最大实际发运日期,下界收缩到数据最小日期
    LastDays(i64),
    /// 闭区间 [start, end]
    Between(NaiveDate, NaiveDate),
}

/// 针对具体数据集解析后的日期约束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDateRange {
    /// 平凡约束: 不施加日期谓词
    Trivial,
    /// 闭区间 [start, end]
    Bounded(NaiveDate, NaiveDate),
    /// 非平凡约束但数据集无任何实际发运日期: 无可匹配行
    Unanchored,
}

impl DateRange {
    /// 针对具体数据集解析; 相对区间的锚点取自数据自身
    pub fn resolve(&self, dataset: &Dataset) -> ResolvedDateRange {
        match self {
            DateRange::AllTime => ResolvedDateRange::Trivial,
            DateRange::Between(start, end) => ResolvedDateRange::Bounded(*start, *end),
            DateRange::LastDays(days) => match dataset.actual_date_span() {
                Some((data_min, data_max)) => {
                    let start = data_max - Duration::days(*days);
                    ResolvedDateRange::Bounded(start.max(data_min), data_max)
                }
                None => ResolvedDateRange::Unanchored,
            },
        }
    }
}

// ==========================================
// DimensionFilters - 维度约束
// ==========================================
// 列名 → 允许值集合; 未出现的维度不施加约束。
// 行通过的条件: 对每个出现的维度,行的取值在允许集合内
// (维度值缺失的行不通过该维度,与源报表多选口径一致)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionFilters {
    allowed: BTreeMap<FilterDimension, BTreeSet<String>>,
}

impl DimensionFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个维度约束
    pub fn allow<I, S>(mut self, dimension: FilterDimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .entry(dimension)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    fn matches(&self, record: &ShipmentRecord) -> bool {
        self.allowed.iter().all(|(dimension, values)| {
            record
                .dimension_value(*dimension)
                .map(|v| values.contains(v))
                .unwrap_or(false)
        })
    }
}

// ==========================================
// FilterApplier
// ==========================================
pub struct FilterApplier;

impl FilterApplier {
    /// 过滤出派生数据集
    ///
    /// 发运行按日期区间与维度约束取子集; 销售表与辅助表
    /// 整体透传 (销售与发运的过滤维度在本域相互独立);
    /// 元数据保留提取来源信息不变
    pub fn apply(
        &self,
        dataset: &Dataset,
        date_range: &DateRange,
        filters: &DimensionFilters,
    ) -> Dataset {
        let resolved = date_range.resolve(dataset);

        let shipments: Vec<ShipmentRecord> = dataset
            .shipments
            .iter()
            .filter(|record| match resolved {
                // 平凡约束: 不看日期,缺失日期的行同样保留
                ResolvedDateRange::Trivial => true,
                // 非平凡区间: 实际发运日期缺失的行排除
                ResolvedDateRange::Bounded(start, end) => match record.actual_ship_date {
                    Some(d) => d >= start && d <= end,
                    None => false,
                },
                ResolvedDateRange::Unanchored => false,
            })
            .filter(|record| filters.matches(record))
            .cloned()
            .collect();

        debug!(
            input_rows = dataset.shipment_count(),
            output_rows = shipments.len(),
            date_range = ?resolved,
            "数据集过滤完成"
        );

        Dataset {
            shipments,
            sales: dataset.sales.clone(),
            aux: dataset.aux.clone(),
            meta: dataset.meta.clone(),
            quality: dataset.quality.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{AuxTables, ExtractionMeta};
    use crate::domain::quality::QualityReport;
    use crate::domain::types::DeliveryStatus;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn shipment(id: u64, category: &str, actual: Option<NaiveDate>) -> ShipmentRecord {
        ShipmentRecord {
            transaction_id: id,
            plant: None,
            source_warehouse: None,
            category: Some(category.to_string()),
            master_brand: None,
            brand: None,
            planning_level: None,
            quantity: None,
            requested_ship_date: None,
            actual_ship_date: actual,
            delay_days: None,
            delivery_status: if actual.is_some() {
                DeliveryStatus::OnTime
            } else {
                DeliveryStatus::NotDue
            },
        }
    }

    fn dataset(shipments: Vec<ShipmentRecord>) -> Dataset {
        Dataset {
            shipments,
            sales: None,
            aux: AuxTables::default(),
            meta: ExtractionMeta {
                batch_id: "test".to_string(),
                extracted_at: Utc::now(),
                shipment_rows_raw: 0,
                shipment_rows_clean: 0,
                sales_rows: 0,
            },
            quality: QualityReport::new("test".to_string()),
        }
    }

    #[test]
    fn test_all_time_is_trivial_and_idempotent() {
        let ds = dataset(vec![
            shipment(1, "Haircare", Some(d(2025, 7, 1))),
            shipment(2, "Haircare", None), // 未到期,无日期
            shipment(3, "Oralcare", Some(d(2025, 8, 15))),
        ]);

        let applier = FilterApplier;
        let out = applier.apply(&ds, &DateRange::AllTime, &DimensionFilters::new());
        assert_eq!(out.shipment_count(), ds.shipment_count());
    }

    #[test]
    fn test_between_excludes_dateless_rows() {
        let ds = dataset(vec![
            shipment(1, "Haircare", Some(d(2025, 7, 1))),
            shipment(2, "Haircare", None),
            shipment(3, "Haircare", Some(d(2025, 7, 31))),
        ]);

        let applier = FilterApplier;
        let out = applier.apply(
            &ds,
            &DateRange::Between(d(2025, 7, 1), d(2025, 7, 15)),
            &DimensionFilters::new(),
        );
        assert_eq!(out.shipment_count(), 1);
        assert_eq!(out.shipments[0].transaction_id, 1);
    }

    #[test]
    fn test_last_days_anchored_to_data_max_not_wall_clock() {
        // 数据最大日期远在未来; 锚点必须取数据而非今天
        let ds = dataset(vec![
            shipment(1, "Haircare", Some(d(2099, 12, 1))),
            shipment(2, "Haircare", Some(d(2099, 12, 25))),
            shipment(3, "Haircare", Some(d(2099, 12, 31))),
        ]);

        let resolved = DateRange::LastDays(7).resolve(&ds);
        assert_eq!(
            resolved,
            ResolvedDateRange::Bounded(d(2099, 12, 24), d(2099, 12, 31))
        );

        let applier = FilterApplier;
        let out = applier.apply(&ds, &DateRange::LastDays(7), &DimensionFilters::new());
        assert_eq!(out.shipment_count(), 2);
    }

    #[test]
    fn test_last_days_clamped_to_data_min() {
        let ds = dataset(vec![
            shipment(1, "Haircare", Some(d(2025, 7, 10))),
            shipment(2, "Haircare", Some(d(2025, 7, 12))),
        ]);
        let resolved = DateRange::LastDays(90).resolve(&ds);
        assert_eq!(
            resolved,
            ResolvedDateRange::Bounded(d(2025, 7, 10), d(2025, 7, 12))
        );
    }

    #[test]
    fn test_dimension_filter_missing_value_fails() {
        let ds = dataset(vec![
            shipment(1, "Haircare", Some(d(2025, 7, 1))),
            shipment(2, "Oralcare", Some(d(2025, 7, 2))),
        ]);

        let filters =
            DimensionFilters::new().allow(FilterDimension::Category, ["Haircare"]);
        let applier = FilterApplier;
        let out = applier.apply(&ds, &DateRange::AllTime, &filters);

        assert_eq!(out.shipment_count(), 1);
        assert_eq!(out.shipments[0].category.as_deref(), Some("Haircare"));
    }

    #[test]
    fn test_sales_and_aux_carried_through() {
        use crate::domain::sales::SalesTable;
        let mut ds = dataset(vec![shipment(1, "Haircare", Some(d(2025, 7, 1)))]);
        ds.sales = Some(SalesTable::default());

        let filters = DimensionFilters::new().allow(FilterDimension::Category, ["Oralcare"]);
        let applier = FilterApplier;
        let out = applier.apply(&ds, &DateRange::AllTime, &filters);

        // 发运子集为空,销售表仍在
        assert_eq!(out.shipment_count(), 0);
        assert!(out.sales.is_some());
    }

    #[test]
    fn test_last_days_on_dateless_dataset_matches_nothing() {
        let ds = dataset(vec![shipment(1, "Haircare", None)]);
        let applier = FilterApplier;
        let out = applier.apply(&ds, &DateRange::LastDays(30), &DimensionFilters::new());
        // 无任何实际发运日期: 相对区间无锚点,安全解析为不匹配
        assert_eq!(out.shipment_count(), 0);
    }
}
