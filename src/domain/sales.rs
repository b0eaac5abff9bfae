// ==========================================
// 供应链发运分析系统 - 销售领域模型
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 2.2 销售记录
// 依据: Workbook_Layout_v2.md - 销售明细工作簿 Data 页列序
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// SalesRecord - 渠道/品类/品牌/计划层级粒度的销售行
// ==========================================
// 数值字段: 源值非法时置缺失; 聚合求和按 0 处理,
// 比率分母为 0 时由引擎层单独打"无数据"标记
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    // ===== 渠道维度 =====
    pub channel_group: Option<String>, // 渠道大类 (源列 Channel1)
    pub sub_channel: Option<String>,   // 渠道细分 (源列 Channel2)
    pub code: Option<String>,          // 渠道编码
    pub principal: Option<String>,     // 负责人
    pub channel: Option<String>,       // 渠道 (聚合主维度)

    // ===== 产品维度 =====
    pub category: Option<String>,       // 品类
    pub master_brand: Option<String>,   // 主品牌
    pub brand: Option<String>,          // 品牌
    pub planning_level: Option<String>, // 计划层级

    // ===== 度量 =====
    pub target: Option<f64>,          // 目标
    pub sales: Option<f64>,           // 销售
    pub shipped: Option<f64>,         // 已发运
    pub late: Option<f64>,            // 延迟量
    pub not_due: Option<f64>,         // 未到期量
    pub yesterday_sales: Option<f64>, // 昨日销售
    pub ious: Option<f64>,            // 欠单量 (IOU,未履约订单)

    // ===== 派生字段 =====
    // 仅当 target > 0 时有值; None 表示"无目标",与真实 0% 区分
    pub achievement_pct: Option<f64>,
}

// ==========================================
// SalesTable - 销售明细表
// ==========================================
// Dataset 的可选能力: 有则整体存在,无则整体不存在,
// 边界处一次性判定,业务逻辑内不做逐处防御
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
