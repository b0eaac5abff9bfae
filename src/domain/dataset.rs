// ==========================================
// 供应链发运分析系统 - 数据集
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 2.3 Dataset
// 红线: 显式传值,无全局"当前数据集"单例;
//       过滤产生新 Dataset,原值不被修改
// ==========================================

use crate::domain::quality::QualityReport;
use crate::domain::sales::SalesTable;
use crate::domain::shipment::ShipmentRecord;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// RawTable - 原始辅助表
// ==========================================
// 透传给图表/统计/ML 等下游消费者的只读表格,
// 管道内不解释其内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// AuxTables - 辅助表集合
// ==========================================
// 发运工作簿的透视/计算/参考/过滤设置区块,
// 以及销售工作簿的 TOP 10 / Pivot 页
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuxTables {
    pub shipping_pivot: RawTable,
    pub shipping_calc: RawTable,
    pub shipping_ref: RawTable,
    pub shipping_filters: RawTable,
    pub sales_top10: RawTable,
    pub sales_pivot: RawTable,
}

// ==========================================
// ExtractionMeta - 提取元数据
// ==========================================
// 落盘契约的一部分: 加列兼容,改名/删列破坏下游
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMeta {
    pub batch_id: String,
    pub extracted_at: DateTime<Utc>,
    pub shipment_rows_raw: usize,   // 清洗前行数
    pub shipment_rows_clean: usize, // 清洗后行数
    pub sales_rows: usize,          // 销售明细行数 (无销售表时为 0)
}

// ==========================================
// Dataset - 内存数据集
// ==========================================
// 过滤的最小单位; sales 为可选能力,一次性判定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub shipments: Vec<ShipmentRecord>,
    pub sales: Option<SalesTable>,
    pub aux: AuxTables,
    pub meta: ExtractionMeta,
    pub quality: QualityReport,
}

impl Dataset {
    pub fn shipment_count(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }

    /// 数据自身的实际发运日期范围 [min, max]
    ///
    /// 过滤层"全时段"与相对区间的锚点只能取自这里,
    /// 绝不取墙钟时间: 数据快照可能包含晚于"今天"的日期
    pub fn actual_date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut span: Option<(NaiveDate, NaiveDate)> = None;
        for record in &self.shipments {
            if let Some(d) = record.actual_ship_date {
                span = Some(match span {
                    None => (d, d),
                    Some((min, max)) => (min.min(d), max.max(d)),
                });
            }
        }
        span
    }
}
