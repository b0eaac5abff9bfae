// ==========================================
// 供应链发运分析系统 - KPI 计算引擎
// ==========================================
// 依据: KPI_Spec_v1.0.md - 全部指标口径
// 红线:
// - 全部为 Dataset 的纯函数,无隐藏全局状态
// - 除法一律分母保护: 分母为 0 → 比率为 0,并以独立标记区分
//   "无数据"与真实 0%
// - 百分比统一四舍五入到 1 位小数,不截断
// - 空数据集返回定义良好的零值/空表,不抛错,不产生 NaN
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::types::{DeliveryStatus, FilterDimension, TopMetric};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Top-N 延迟率排名的最小样本量分位: 组规模低于全组第 10 百分位的
// 组不参与延迟率排名,避免小样本噪声占据榜首
pub const TOP_N_MIN_VOLUME_QUANTILE: f64 = 0.10;

/// 四舍五入到 1 位小数 (远离零方向)
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// 分母保护除法: 分母为 0 → 0.0; 调用方另行携带"无数据"标记
pub fn safe_rate(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        round1(numerator as f64 / denominator as f64 * 100.0)
    }
}

// ==========================================
// 结果结构
// ==========================================

/// 整体交付率
///
/// 不变量: 每行恰好计入一个状态,四率之和 ≈ 100 (±0.1 舍入误差);
/// has_data=false 时四率均为 0,区别于真实 0%
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallRates {
    pub total_count: usize,
    pub late_rate: f64,
    pub on_time_rate: f64,
    pub advanced_rate: f64,
    pub not_due_rate: f64,
    pub has_data: bool,
}

impl OverallRates {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            late_rate: 0.0,
            on_time_rate: 0.0,
            advanced_rate: 0.0,
            not_due_rate: 0.0,
            has_data: false,
        }
    }
}

/// 分维度状态统计行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBreakdownRow {
    pub key: String,
    pub advanced: usize,
    pub on_time: usize,
    pub late: usize,
    pub not_due: usize,
    pub total: usize,
    pub late_rate: f64,
}

/// 分维度统计排序口径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownSort {
    LateRateDesc, // 默认: 延迟率降序
    TotalDesc,    // 品牌视图惯用: 总量降序
}

/// 按日汇总行 (零发运日省略,不补零)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRollupRow {
    pub date: NaiveDate,
    pub advanced: usize,
    pub on_time: usize,
    pub late: usize,
    pub not_due: usize,
    pub total: usize,
    pub late_rate: f64,
}

/// 销售 KPI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesKpis {
    pub total_sales: f64,
    pub total_target: f64,
    pub achievement_pct: f64, // 无目标时为 0,由 no_target 区分
    pub no_target: bool,
    pub has_data: bool, // false = 数据集无销售表或销售表为空
}

impl SalesKpis {
    pub fn empty() -> Self {
        Self {
            total_sales: 0.0,
            total_target: 0.0,
            achievement_pct: 0.0,
            no_target: true,
            has_data: false,
        }
    }
}

/// Top-N 排名行 (计划层级粒度)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopGroupRow {
    pub planning_level: String,
    pub late_count: usize,
    pub total_count: usize,
    pub late_rate: f64,
    pub total_quantity: f64,
}

/// 渠道聚合行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBreakdownRow {
    pub channel: String,
    pub sales: f64,
    pub target: f64,
    pub shipped: f64,
    pub late: f64,
    pub achievement_pct: f64,
    pub no_target: bool,
    pub late_rate: f64, // late / shipped
    pub no_shipped: bool,
}

/// 欠单 (IOU) 聚合行: 品类 × 渠道
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IouBreakdownRow {
    pub category: String,
    pub channel: String,
    pub iou_total: f64,
    pub record_count: usize,
    pub iou_mean: f64,
    pub sales_total: f64,
    pub iou_vs_sales_pct: f64,
    pub no_sales: bool,
}

/// 汇总看板 KPI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub rates: OverallRates,
    pub avg_delay_days: f64, // 延迟行平均延迟天数; 无延迟行为 0
    pub worst_category: Option<String>,
    pub worst_category_late_rate: f64,
    pub sales: SalesKpis,
}

// ==========================================
// KpiEngine
// ==========================================
pub struct KpiEngine;

impl KpiEngine {
    /// 整体交付率
    pub fn overall_rates(&self, dataset: &Dataset) -> OverallRates {
        let total = dataset.shipment_count();
        if total == 0 {
            return OverallRates::empty();
        }

        let mut advanced = 0usize;
        let mut on_time = 0usize;
        let mut late = 0usize;
        let mut not_due = 0usize;
        for record in &dataset.shipments {
            match record.delivery_status {
                DeliveryStatus::Advanced => advanced += 1,
                DeliveryStatus::OnTime => on_time += 1,
                DeliveryStatus::Late => late += 1,
                DeliveryStatus::NotDue => not_due += 1,
            }
        }

        OverallRates {
            total_count: total,
            late_rate: safe_rate(late, total),
            on_time_rate: safe_rate(on_time, total),
            advanced_rate: safe_rate(advanced, total),
            not_due_rate: safe_rate(not_due, total),
            has_data: true,
        }
    }

    /// 延迟行的平均延迟天数; 无延迟行返回 0 ("无延迟发运"而非错误)
    pub fn average_delay_for_late(&self, dataset: &Dataset) -> f64 {
        let delays: Vec<i64> = dataset
            .shipments
            .iter()
            .filter(|r| r.delivery_status == DeliveryStatus::Late)
            .filter_map(|r| r.delay_days)
            .collect();

        if delays.is_empty() {
            return 0.0;
        }
        round1(delays.iter().sum::<i64>() as f64 / delays.len() as f64)
    }

    /// 分维度状态统计
    ///
    /// 维度值缺失的行不参与分组 (与源报表口径一致);
    /// 整体率的分母守恒只约束 overall_rates
    pub fn group_breakdown(
        &self,
        dataset: &Dataset,
        dimension: FilterDimension,
        sort: BreakdownSort,
    ) -> Vec<GroupBreakdownRow> {
        let mut groups: BTreeMap<String, [usize; 4]> = BTreeMap::new();
        for record in &dataset.shipments {
            let Some(key) = record.dimension_value(dimension) else {
                continue;
            };
            let counts = groups.entry(key.to_string()).or_insert([0; 4]);
            match record.delivery_status {
                DeliveryStatus::Advanced => counts[0] += 1,
                DeliveryStatus::OnTime => counts[1] += 1,
                DeliveryStatus::Late => counts[2] += 1,
                DeliveryStatus::NotDue => counts[3] += 1,
            }
        }

        let mut rows: Vec<GroupBreakdownRow> = groups
            .into_iter()
            .map(|(key, [advanced, on_time, late, not_due])| {
                let total = advanced + on_time + late + not_due;
                GroupBreakdownRow {
                    key,
                    advanced,
                    on_time,
                    late,
                    not_due,
                    total,
                    late_rate: safe_rate(late, total),
                }
            })
            .collect();

        match sort {
            BreakdownSort::LateRateDesc => rows.sort_by(|a, b| {
                b.late_rate
                    .partial_cmp(&a.late_rate)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.key.cmp(&b.key))
            }),
            BreakdownSort::TotalDesc => {
                rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)))
            }
        }
        rows
    }

    /// 按日汇总 (以实际发运日期为索引)
    ///
    /// 策略: 零发运日省略,不补零; 无实际发运日期的行不可按日归属,
    /// 不进入本表。全程单一策略,下游不再需要 min_periods 之类补丁
    pub fn daily_rollup(&self, dataset: &Dataset) -> Vec<DailyRollupRow> {
        let mut days: BTreeMap<NaiveDate, [usize; 4]> = BTreeMap::new();
        for record in &dataset.shipments {
            let Some(date) = record.actual_ship_date else {
                continue;
            };
            let counts = days.entry(date).or_insert([0; 4]);
            match record.delivery_status {
                DeliveryStatus::Advanced => counts[0] += 1,
                DeliveryStatus::OnTime => counts[1] += 1,
                DeliveryStatus::Late => counts[2] += 1,
                DeliveryStatus::NotDue => counts[3] += 1,
            }
        }

        days.into_iter()
            .map(|(date, [advanced, on_time, late, not_due])| {
                let total = advanced + on_time + late + not_due;
                DailyRollupRow {
                    date,
                    advanced,
                    on_time,
                    late,
                    not_due,
                    total,
                    late_rate: safe_rate(late, total),
                }
            })
            .collect()
    }

    /// 销售 KPI (总销售/总目标/达成率)
    pub fn sales_kpis(&self, dataset: &Dataset) -> SalesKpis {
        let Some(sales_table) = &dataset.sales else {
            return SalesKpis::empty();
        };
        if sales_table.is_empty() {
            return SalesKpis::empty();
        }

        // 缺失值按 0 参与求和
        let total_sales: f64 = sales_table.records.iter().filter_map(|r| r.sales).sum();
        let total_target: f64 = sales_table.records.iter().filter_map(|r| r.target).sum();

        let (achievement_pct, no_target) = if total_target > 0.0 {
            (round1(total_sales / total_target * 100.0), false)
        } else {
            (0.0, true)
        };

        SalesKpis {
            total_sales: (total_sales * 100.0).round() / 100.0,
            total_target: (total_target * 100.0).round() / 100.0,
            achievement_pct,
            no_target,
            has_data: true,
        }
    }

    /// Top-N 排名 (计划层级粒度)
    ///
    /// metric=LateRate 时排除组规模低于第 10 百分位
    /// (TOP_N_MIN_VOLUME_QUANTILE) 的组
    pub fn top_n(&self, dataset: &Dataset, n: usize, metric: TopMetric) -> Vec<TopGroupRow> {
        let mut groups: BTreeMap<String, (usize, usize, f64)> = BTreeMap::new();
        for record in &dataset.shipments {
            let Some(key) = record.planning_level.as_deref() else {
                continue;
            };
            let entry = groups.entry(key.to_string()).or_insert((0, 0, 0.0));
            entry.0 += 1;
            if record.delivery_status == DeliveryStatus::Late {
                entry.1 += 1;
            }
            entry.2 += record.quantity.unwrap_or(0.0);
        }

        let mut rows: Vec<TopGroupRow> = groups
            .into_iter()
            .map(|(planning_level, (total, late, quantity))| TopGroupRow {
                planning_level,
                late_count: late,
                total_count: total,
                late_rate: safe_rate(late, total),
                total_quantity: quantity,
            })
            .collect();

        match metric {
            TopMetric::LateCount => rows.sort_by(|a, b| {
                b.late_count
                    .cmp(&a.late_count)
                    .then_with(|| a.planning_level.cmp(&b.planning_level))
            }),
            TopMetric::TotalQuantity => rows.sort_by(|a, b| {
                b.total_quantity
                    .partial_cmp(&a.total_quantity)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.planning_level.cmp(&b.planning_level))
            }),
            TopMetric::LateRate => {
                let threshold = min_volume_threshold(&rows);
                rows.retain(|r| r.total_count >= threshold);
                rows.sort_by(|a, b| {
                    b.late_rate
                        .partial_cmp(&a.late_rate)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.planning_level.cmp(&b.planning_level))
                });
            }
        }

        rows.truncate(n);
        rows
    }

    /// 汇总看板 KPI (整体率 + 平均延迟 + 最差品类 + 销售)
    pub fn kpi_summary(&self, dataset: &Dataset) -> KpiSummary {
        let rates = self.overall_rates(dataset);
        let by_category =
            self.group_breakdown(dataset, FilterDimension::Category, BreakdownSort::LateRateDesc);
        let worst = by_category.first();

        KpiSummary {
            rates,
            avg_delay_days: self.average_delay_for_late(dataset),
            worst_category: worst.map(|r| r.key.clone()),
            worst_category_late_rate: worst.map(|r| r.late_rate).unwrap_or(0.0),
            sales: self.sales_kpis(dataset),
        }
    }

    /// 渠道聚合 (销售表能力,缺失返回空表)
    pub fn sales_channel_breakdown(&self, dataset: &Dataset) -> Vec<ChannelBreakdownRow> {
        let Some(sales_table) = &dataset.sales else {
            return Vec::new();
        };

        let mut groups: BTreeMap<String, (f64, f64, f64, f64)> = BTreeMap::new();
        for record in &sales_table.records {
            let Some(channel) = record.channel.as_deref() else {
                continue;
            };
            let entry = groups.entry(channel.to_string()).or_insert((0.0, 0.0, 0.0, 0.0));
            entry.0 += record.sales.unwrap_or(0.0);
            entry.1 += record.target.unwrap_or(0.0);
            entry.2 += record.shipped.unwrap_or(0.0);
            entry.3 += record.late.unwrap_or(0.0);
        }

        groups
            .into_iter()
            .map(|(channel, (sales, target, shipped, late))| {
                let (achievement_pct, no_target) = if target > 0.0 {
                    (round1(sales / target * 100.0), false)
                } else {
                    (0.0, true)
                };
                let (late_rate, no_shipped) = if shipped > 0.0 {
                    (round1(late / shipped * 100.0), false)
                } else {
                    (0.0, true)
                };
                ChannelBreakdownRow {
                    channel,
                    sales,
                    target,
                    shipped,
                    late,
                    achievement_pct,
                    no_target,
                    late_rate,
                    no_shipped,
                }
            })
            .collect()
    }

    /// 欠单聚合: 品类 × 渠道, 按欠单总量降序
    pub fn iou_breakdown(&self, dataset: &Dataset) -> Vec<IouBreakdownRow> {
        let Some(sales_table) = &dataset.sales else {
            return Vec::new();
        };

        let mut groups: BTreeMap<(String, String), (f64, usize, f64)> = BTreeMap::new();
        for record in &sales_table.records {
            let (Some(category), Some(channel)) =
                (record.category.as_deref(), record.channel.as_deref())
            else {
                continue;
            };
            let entry = groups
                .entry((category.to_string(), channel.to_string()))
                .or_insert((0.0, 0, 0.0));
            entry.0 += record.ious.unwrap_or(0.0);
            entry.1 += 1;
            entry.2 += record.sales.unwrap_or(0.0);
        }

        let mut rows: Vec<IouBreakdownRow> = groups
            .into_iter()
            .map(|((category, channel), (iou_total, count, sales_total))| {
                let iou_mean = if count > 0 {
                    round1(iou_total / count as f64)
                } else {
                    0.0
                };
                let (iou_vs_sales_pct, no_sales) = if sales_total > 0.0 {
                    (round1(iou_total / sales_total * 100.0), false)
                } else {
                    (0.0, true)
                };
                IouBreakdownRow {
                    category,
                    channel,
                    iou_total,
                    record_count: count,
                    iou_mean,
                    sales_total,
                    iou_vs_sales_pct,
                    no_sales,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.iou_total
                .partial_cmp(&a.iou_total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (a.category.clone(), a.channel.clone()).cmp(&(b.category.clone(), b.channel.clone())))
        });
        rows
    }
}

/// 延迟率排名的最小样本量门槛
///
/// 取全部组规模的第 10 百分位 (最近秩法,下取整);
/// 组数为 0 时门槛为 0
fn min_volume_threshold(rows: &[TopGroupRow]) -> usize {
    if rows.is_empty() {
        return 0;
    }
    let mut totals: Vec<usize> = rows.iter().map(|r| r.total_count).collect();
    totals.sort_unstable();
    let idx = ((totals.len() - 1) as f64 * TOP_N_MIN_VOLUME_QUANTILE).floor() as usize;
    totals[idx]
}
