// ==========================================
// 供应链发运分析系统 - 领域类型定义
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 2. 数据模型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 交付状态 (Delivery Status)
// ==========================================
// 红线: 四值封闭枚举,清洗后不允许出现域外状态
// 序列化格式: SCREAMING_SNAKE_CASE (与落盘 CSV 一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Advanced, // 提前发运 (delay_days < 0)
    OnTime,   // 准时发运 (delay_days = 0)
    Late,     // 延迟发运 (delay_days > 0)
    NotDue,   // 未到期 (无实际发运日期)
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Advanced => write!(f, "ADVANCED"),
            DeliveryStatus::OnTime => write!(f, "ON_TIME"),
            DeliveryStatus::Late => write!(f, "LATE"),
            DeliveryStatus::NotDue => write!(f, "NOT_DUE"),
        }
    }
}

impl DeliveryStatus {
    /// 从源工作簿的状态文本解析
    ///
    /// 源布局中的合法取值: "Advanced" / "On Time" / "Late" / "Not Due"
    /// 域外文本返回 None,由清洗层计数并丢弃
    pub fn from_source_str(s: &str) -> Option<Self> {
        match s.trim() {
            "Advanced" => Some(DeliveryStatus::Advanced),
            "On Time" => Some(DeliveryStatus::OnTime),
            "Late" => Some(DeliveryStatus::Late),
            "Not Due" => Some(DeliveryStatus::NotDue),
            _ => None,
        }
    }

    /// 由延迟天数符号派生状态
    ///
    /// # 规则
    /// - delay_days < 0 → Advanced
    /// - delay_days = 0 → OnTime
    /// - delay_days > 0 → Late
    pub fn from_delay_days(delay_days: i64) -> Self {
        match delay_days.cmp(&0) {
            std::cmp::Ordering::Less => DeliveryStatus::Advanced,
            std::cmp::Ordering::Equal => DeliveryStatus::OnTime,
            std::cmp::Ordering::Greater => DeliveryStatus::Late,
        }
    }
}

// ==========================================
// 过滤维度 (Filter Dimension)
// ==========================================
// 发运表的可过滤分类维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterDimension {
    Plant,           // 工厂
    SourceWarehouse, // 发货仓
    Category,        // 品类
    MasterBrand,     // 主品牌
    Brand,           // 品牌
    PlanningLevel,   // 计划层级 (SKU 口径)
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterDimension::Plant => write!(f, "PLANT"),
            FilterDimension::SourceWarehouse => write!(f, "SOURCE_WAREHOUSE"),
            FilterDimension::Category => write!(f, "CATEGORY"),
            FilterDimension::MasterBrand => write!(f, "MASTER_BRAND"),
            FilterDimension::Brand => write!(f, "BRAND"),
            FilterDimension::PlanningLevel => write!(f, "PLANNING_LEVEL"),
        }
    }
}

// ==========================================
// Top-N 排名指标 (Top Metric)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopMetric {
    LateCount,     // 延迟单数
    TotalQuantity, // 发运总量
    LateRate,      // 延迟率 (受最小样本量门槛约束)
}

impl fmt::Display for TopMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopMetric::LateCount => write!(f, "LATE_COUNT"),
            TopMetric::TotalQuantity => write!(f, "TOTAL_QUANTITY"),
            TopMetric::LateRate => write!(f, "LATE_RATE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_from_source_str() {
        assert_eq!(
            DeliveryStatus::from_source_str("On Time"),
            Some(DeliveryStatus::OnTime)
        );
        assert_eq!(
            DeliveryStatus::from_source_str("  Late  "),
            Some(DeliveryStatus::Late)
        );
        // 表头泄漏文本与域外文本均不可解析
        assert_eq!(DeliveryStatus::from_source_str("Status"), None);
        assert_eq!(DeliveryStatus::from_source_str("Delivered"), None);
        assert_eq!(DeliveryStatus::from_source_str(""), None);
    }

    #[test]
    fn test_delivery_status_from_delay_days() {
        assert_eq!(DeliveryStatus::from_delay_days(-3), DeliveryStatus::Advanced);
        assert_eq!(DeliveryStatus::from_delay_days(0), DeliveryStatus::OnTime);
        assert_eq!(DeliveryStatus::from_delay_days(7), DeliveryStatus::Late);
    }
}
