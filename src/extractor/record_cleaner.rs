// ==========================================
// 供应链发运分析系统 - 记录清洗器 (RecordCleaner)
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 3.3 清洗规则 (顺序固定)
// 职责: 表头泄漏/域外状态过滤 → 延迟天数重算 → 状态对账 →
//       精确去重 → transaction_id 分配
// 每个丢弃/改写步骤计数,供质量报告复核
// ==========================================

use crate::domain::quality::QualityReport;
use crate::domain::shipment::{RawShipmentRow, ShipmentRecord};
use crate::domain::types::DeliveryStatus;
use std::collections::HashSet;
use tracing::info;

// 表头泄漏令牌: 源工作簿部分导出代际会把表头行混入数据区
const HEADER_TOKENS: &[&str] = &["Status", "Delivery Status"];

pub struct RecordCleaner;

impl RecordCleaner {
    /// 清洗主流程
    ///
    /// 输出保证:
    /// - delivery_status 只会是四值枚举之一
    /// - 两日期齐全的行,状态与 delay_days 符号一致
    /// - 无精确重复行; transaction_id 按最终行序 1..n 连续分配
    /// 同一输入重复清洗,行数与 id 分配完全一致 (确定性)
    pub fn clean(
        &self,
        rows: Vec<RawShipmentRow>,
        report: &mut QualityReport,
    ) -> Vec<ShipmentRecord> {
        let source_rows = rows.len();
        let mut seen = HashSet::new();
        let mut records: Vec<ShipmentRecord> = Vec::with_capacity(source_rows);

        for row in rows {
            // 步骤 1: 状态缺失 / 表头泄漏 / 域外状态
            let status_raw = match row.delivery_status_raw.as_deref() {
                None | Some("") => {
                    report.rejections.missing_status += 1;
                    continue;
                }
                Some(s) => s,
            };
            if HEADER_TOKENS.contains(&status_raw) {
                report.rejections.header_leakage += 1;
                continue;
            }
            let stated = match DeliveryStatus::from_source_str(status_raw) {
                Some(s) => s,
                None => {
                    report.rejections.invalid_status += 1;
                    continue;
                }
            };

            // 步骤 2: 重算延迟天数 (两日期齐全时)
            let delay_days = match (row.actual_ship_date, row.requested_ship_date) {
                (Some(actual), Some(requested)) => {
                    Some(actual.signed_duration_since(requested).num_days())
                }
                _ => None,
            };

            // 步骤 3: 状态对账
            // - 实际发运日期缺失 → NotDue (源状态不一致时改记并计数)
            // - 两日期齐全 → 按符号派生; 与源状态矛盾则丢弃
            // - 仅要求日期缺失 → 延迟不可得,保留源状态
            let status = match (row.actual_ship_date, delay_days) {
                (None, _) => {
                    if stated != DeliveryStatus::NotDue {
                        report.not_due_recoded += 1;
                    }
                    DeliveryStatus::NotDue
                }
                (Some(_), Some(days)) => {
                    let derived = DeliveryStatus::from_delay_days(days);
                    if derived != stated {
                        report.rejections.status_mismatch += 1;
                        continue;
                    }
                    derived
                }
                (Some(_), None) => stated,
            };

            // 步骤 5: 精确去重 (全列相等,保留首次出现)
            // 注: 数量在映射层已强转 (步骤 4),此处直接使用
            if !seen.insert(ShipmentRecord::dedup_key(&row)) {
                report.rejections.duplicate += 1;
                continue;
            }

            records.push(ShipmentRecord {
                transaction_id: 0, // 步骤 6 统一回填
                plant: row.plant,
                source_warehouse: row.source_warehouse,
                category: row.category,
                master_brand: row.master_brand,
                brand: row.brand,
                planning_level: row.planning_level,
                quantity: row.quantity,
                requested_ship_date: row.requested_ship_date,
                actual_ship_date: row.actual_ship_date,
                delay_days,
                delivery_status: status,
            });
        }

        // 步骤 6: transaction_id 按最终行序连续分配
        for (idx, record) in records.iter_mut().enumerate() {
            record.transaction_id = (idx + 1) as u64;
        }

        report.finalize(source_rows, records.len());
        info!(
            source_rows,
            cleaned_rows = records.len(),
            missing_status = report.rejections.missing_status,
            header_leakage = report.rejections.header_leakage,
            invalid_status = report.rejections.invalid_status,
            status_mismatch = report.rejections.status_mismatch,
            duplicates = report.rejections.duplicate,
            not_due_recoded = report.not_due_recoded,
            "发运记录清洗完成"
        );

        records
    }
}
