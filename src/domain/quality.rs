// ==========================================
// 供应链发运分析系统 - 数据质量报告
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 6. 错误分级
// 职责: 每次提取生成一份可查询的质量报告,
//       替代散落在日志文本里的丢弃/强转记录
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 质量问题级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Info,    // 信息: 不影响口径
    Warning, // 警告: 口径可用但有质量缺口
    Error,   // 错误: 对应数据未进入清洗结果
}

// ==========================================
// 质量警告条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityWarning {
    pub level: DqLevel,
    pub field: String,   // 涉及的字段/列名
    pub message: String, // 人读描述
}

// ==========================================
// 行级拒绝计数 (RowRejected)
// ==========================================
// 每个丢弃原因单独计数,总量可复核
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub missing_status: usize,  // 状态缺失
    pub header_leakage: usize,  // 表头泄漏行 (如字面量 "Status")
    pub invalid_status: usize,  // 状态文本域外
    pub status_mismatch: usize, // 状态与延迟天数符号矛盾且无法归因于日期缺失
    pub duplicate: usize,       // 精确重复行
}

impl RejectionCounts {
    pub fn total(&self) -> usize {
        self.missing_status
            + self.header_leakage
            + self.invalid_status
            + self.status_mismatch
            + self.duplicate
    }
}

// ==========================================
// 质量报告汇总
// ==========================================
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QualitySummary {
    pub source_rows: usize,    // 定位取数得到的原始行数
    pub cleaned_rows: usize,   // 清洗后行数
    pub rejected_rows: usize,  // 拒绝行数 (= RejectionCounts::total)
    pub coerced_values: usize, // 字段级强转失败置缺失的总次数
}

// ==========================================
// QualityReport - 单次提取的数据质量报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub batch_id: String,

    pub summary: QualitySummary,
    pub rejections: RejectionCounts,

    // 字段级强转计数
    pub quantity_coerced: usize,                  // 发运数量强转失败次数
    pub sales_values_coerced: usize,              // 销售数值列强转失败次数
    pub unparseable_dates: BTreeMap<String, usize>, // 按日期列名计数的不可解析值
    pub not_due_recoded: usize,                   // 因缺失实际发运日期改记 NotDue 的行数

    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    pub fn new(batch_id: String) -> Self {
        Self {
            batch_id,
            summary: QualitySummary::default(),
            rejections: RejectionCounts::default(),
            quantity_coerced: 0,
            sales_values_coerced: 0,
            unparseable_dates: BTreeMap::new(),
            not_due_recoded: 0,
            warnings: Vec::new(),
        }
    }

    /// 记录某日期列的一次不可解析值
    pub fn count_unparseable_date(&mut self, column: &str) {
        *self.unparseable_dates.entry(column.to_string()).or_insert(0) += 1;
    }

    /// 追加一条警告
    pub fn warn(&mut self, level: DqLevel, field: &str, message: String) {
        self.warnings.push(QualityWarning {
            level,
            field: field.to_string(),
            message,
        });
    }

    /// 汇总收尾: 在清洗结束后回填 summary
    pub fn finalize(&mut self, source_rows: usize, cleaned_rows: usize) {
        self.summary.source_rows = source_rows;
        self.summary.cleaned_rows = cleaned_rows;
        self.summary.rejected_rows = self.rejections.total();
        self.summary.coerced_values = self.quantity_coerced
            + self.sales_values_coerced
            + self.unparseable_dates.values().sum::<usize>();
    }
}
