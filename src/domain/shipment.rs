// ==========================================
// 供应链发运分析系统 - 发运领域模型
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 2.1 发运记录
// 依据: Workbook_Layout_v2.md - 发运跟踪工作簿主表列序
// ==========================================

use crate::domain::types::{DeliveryStatus, FilterDimension};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ShipmentRecord - 清洗后的发运记录
// ==========================================
// 用途: 提取层写入,引擎层只读
// 生命周期: 每次提取整表替换,无增量合并
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRecord {
    // ===== 主键 =====
    pub transaction_id: u64, // 提取时按最终行序连续分配,非源字段

    // ===== 分类维度 =====
    pub plant: Option<String>,            // 工厂 (源列 SLS_Plant)
    pub source_warehouse: Option<String>, // 发货仓 (源列 Source)
    pub category: Option<String>,         // 品类
    pub master_brand: Option<String>,     // 主品牌
    pub brand: Option<String>,            // 品牌
    pub planning_level: Option<String>,   // 计划层级 (SKU 口径)

    // ===== 数量 =====
    pub quantity: Option<f64>, // 非负; 源值非法时置缺失,不抛错

    // ===== 日期 =====
    pub requested_ship_date: Option<NaiveDate>, // 要求发运日期
    pub actual_ship_date: Option<NaiveDate>,    // 实际发运日期

    // ===== 派生字段 =====
    pub delay_days: Option<i64>,        // actual - requested (天); 任一日期缺失则为 None
    pub delivery_status: DeliveryStatus, // 四值封闭枚举,清洗层保证与 delay_days 符号一致
}

impl ShipmentRecord {
    /// 按过滤维度取分类值
    pub fn dimension_value(&self, dim: FilterDimension) -> Option<&str> {
        let v = match dim {
            FilterDimension::Plant => &self.plant,
            FilterDimension::SourceWarehouse => &self.source_warehouse,
            FilterDimension::Category => &self.category,
            FilterDimension::MasterBrand => &self.master_brand,
            FilterDimension::Brand => &self.brand,
            FilterDimension::PlanningLevel => &self.planning_level,
        };
        v.as_deref()
    }

    /// 精确去重键: transaction_id 以外的全部列
    ///
    /// 去重发生在分配 transaction_id 之前,因此键覆盖整行内容
    pub fn dedup_key(row: &RawShipmentRow) -> String {
        // 0x1F 单元分隔符,避免字段拼接歧义
        let sep = '\u{1f}';
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let date = |v: &Option<NaiveDate>| v.map(|d| d.to_string()).unwrap_or_default();
        format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
            opt(&row.plant),
            opt(&row.source_warehouse),
            opt(&row.category),
            opt(&row.master_brand),
            opt(&row.brand),
            opt(&row.planning_level),
            row.quantity.map(|q| format!("{q:?}")).unwrap_or_default(),
            date(&row.requested_ship_date),
            date(&row.actual_ship_date),
            opt(&row.delivery_status_raw),
        )
    }
}

// ==========================================
// RawShipmentRow - 提取中间结构体
// ==========================================
// 用途: 提取管道中间产物（定位取数 → 日期归一化 → 字段映射 → 此结构 → 清洗）
// 生命周期: 仅在提取流程内
#[derive(Debug, Clone)]
pub struct RawShipmentRow {
    pub row_number: usize, // 工作簿内 1-based 行号,用于数据质量追溯

    pub plant: Option<String>,
    pub source_warehouse: Option<String>,
    pub category: Option<String>,
    pub master_brand: Option<String>,
    pub brand: Option<String>,
    pub planning_level: Option<String>,

    pub quantity: Option<f64>, // 已强制为非负小数,失败置 None 并计数

    pub requested_ship_date: Option<NaiveDate>, // 已由 DateNormalizer 归一化
    pub actual_ship_date: Option<NaiveDate>,

    pub delivery_status_raw: Option<String>, // 源状态文本,清洗层校验
}
