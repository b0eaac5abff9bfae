// ==========================================
// 供应链发运分析系统 - 字段映射器
// ==========================================
// 依据: Workbook_Layout_v2.md - 主表/Data 页列序 (按位置,无表头推断)
// 职责: 定位取数结果 → 领域中间结构; 数值字段强转,失败置缺失并计数
// ==========================================

use crate::domain::quality::QualityReport;
use crate::domain::sales::SalesRecord;
use crate::domain::shipment::RawShipmentRow;
use crate::engine::kpi::round1;
use crate::extractor::workbook::{CellTable, RawCell};
use chrono::NaiveDate;
use tracing::debug;

// ==========================================
// 发运主表列序 (A:O 区块内 0-based)
// ==========================================
// 0 Date1 / 1 Date2 / 12 Month: 源表辅助列,不进入记录
// 3 DLV_Shipping_Status: 与 Delivery_Status 重复的源列,不进入记录
// 7 L_I: 源表标志列,不进入记录
const COL_PLANT: usize = 2;
const COL_CATEGORY: usize = 4;
const COL_MASTER_BRAND: usize = 5;
const COL_BRAND: usize = 6;
const COL_PLANNING_LEVEL: usize = 8;
const COL_QUANTITY: usize = 9;
const COL_SOURCE_WAREHOUSE: usize = 10;
pub const COL_ACTUAL_SHIP_DATE: usize = 11;
pub const COL_REQUESTED_SHIP_DATE: usize = 13;
const COL_DELIVERY_STATUS: usize = 14;

// ==========================================
// 销售 Data 页列序 (前 25 列区块内 0-based; 8 L_I 不进入记录)
// ==========================================
const SALES_COL_CHANNEL_GROUP: usize = 0;
const SALES_COL_SUB_CHANNEL: usize = 1;
const SALES_COL_CODE: usize = 2;
const SALES_COL_PRINCIPAL: usize = 3;
const SALES_COL_CHANNEL: usize = 4;
const SALES_COL_CATEGORY: usize = 5;
const SALES_COL_MASTER_BRAND: usize = 6;
const SALES_COL_BRAND: usize = 7;
const SALES_COL_PLANNING_LEVEL: usize = 9;
const SALES_COL_TARGET: usize = 10;
const SALES_COL_SALES: usize = 11;
const SALES_COL_SHIPPED: usize = 12;
const SALES_COL_LATE: usize = 13;
const SALES_COL_NOT_DUE: usize = 14;
const SALES_COL_YESTERDAY_SALES: usize = 15;
const SALES_COL_IOUS: usize = 16;

pub struct FieldMapper;

impl FieldMapper {
    /// 发运主表 → RawShipmentRow
    ///
    /// 日期列已由 DateNormalizer 按列归一化,以等长向量传入
    pub fn map_shipment_rows(
        &self,
        table: &CellTable,
        actual_dates: &[Option<NaiveDate>],
        requested_dates: &[Option<NaiveDate>],
        report: &mut QualityReport,
    ) -> Vec<RawShipmentRow> {
        let mut rows = Vec::with_capacity(table.len());

        for (idx, row) in table.rows.iter().enumerate() {
            let cell = |col: usize| row.cells.get(col).cloned().unwrap_or(RawCell::Empty);

            let quantity = coerce_non_negative(&cell(COL_QUANTITY), &mut report.quantity_coerced);

            rows.push(RawShipmentRow {
                row_number: row.row_number,
                plant: text_value(&cell(COL_PLANT)),
                source_warehouse: text_value(&cell(COL_SOURCE_WAREHOUSE)),
                category: text_value(&cell(COL_CATEGORY)),
                master_brand: text_value(&cell(COL_MASTER_BRAND)),
                brand: text_value(&cell(COL_BRAND)),
                planning_level: text_value(&cell(COL_PLANNING_LEVEL)),
                quantity,
                requested_ship_date: requested_dates.get(idx).copied().flatten(),
                actual_ship_date: actual_dates.get(idx).copied().flatten(),
                delivery_status_raw: text_value(&cell(COL_DELIVERY_STATUS)),
            });
        }

        debug!(rows = rows.len(), "发运主表字段映射完成");
        rows
    }

    /// 销售 Data 页 → SalesRecord
    pub fn map_sales_rows(&self, table: &CellTable, report: &mut QualityReport) -> Vec<SalesRecord> {
        let mut records = Vec::with_capacity(table.len());

        for row in &table.rows {
            let cell = |col: usize| row.cells.get(col).cloned().unwrap_or(RawCell::Empty);

            let mut coerced = 0usize;
            let mut num = |col: usize| coerce_non_negative(&cell(col), &mut coerced);

            let target = num(SALES_COL_TARGET);
            let sales = num(SALES_COL_SALES);

            // 达成率仅在 target > 0 时有定义; None 表示"无目标"
            let achievement_pct = match (sales, target) {
                (Some(s), Some(t)) if t > 0.0 => Some(round1(s / t * 100.0)),
                _ => None,
            };

            let shipped = num(SALES_COL_SHIPPED);
            let late = num(SALES_COL_LATE);
            let not_due = num(SALES_COL_NOT_DUE);
            let yesterday_sales = num(SALES_COL_YESTERDAY_SALES);
            let ious = num(SALES_COL_IOUS);
            report.sales_values_coerced += coerced;

            records.push(SalesRecord {
                channel_group: text_value(&cell(SALES_COL_CHANNEL_GROUP)),
                sub_channel: text_value(&cell(SALES_COL_SUB_CHANNEL)),
                code: text_value(&cell(SALES_COL_CODE)),
                principal: text_value(&cell(SALES_COL_PRINCIPAL)),
                channel: text_value(&cell(SALES_COL_CHANNEL)),
                category: text_value(&cell(SALES_COL_CATEGORY)),
                master_brand: text_value(&cell(SALES_COL_MASTER_BRAND)),
                brand: text_value(&cell(SALES_COL_BRAND)),
                planning_level: text_value(&cell(SALES_COL_PLANNING_LEVEL)),
                target,
                sales,
                shipped,
                late,
                not_due,
                yesterday_sales,
                ious,
                achievement_pct,
            });
        }

        debug!(rows = records.len(), "销售明细字段映射完成");
        records
    }
}

/// 分类字段的文本视图 (数值型编码一并转文本)
fn text_value(cell: &RawCell) -> Option<String> {
    cell.as_text().filter(|s| !s.is_empty())
}

/// 非负小数强转; 失败置缺失并计数,绝不抛错
fn coerce_non_negative(cell: &RawCell, counter: &mut usize) -> Option<f64> {
    match cell {
        RawCell::Empty => None,
        RawCell::Number(n) if n.is_finite() && *n >= 0.0 => Some(*n),
        RawCell::Text(s) => {
            // 千分位逗号容错
            match s.replace(',', "").trim().parse::<f64>() {
                Ok(n) if n.is_finite() && n >= 0.0 => Some(n),
                _ => {
                    *counter += 1;
                    None
                }
            }
        }
        _ => {
            *counter += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::workbook::CellRow;

    fn main_row(row_number: usize, cells: Vec<RawCell>) -> CellRow {
        // 主表区块共 15 列,短行由取列侧补空
        CellRow { row_number, cells }
    }

    #[test]
    fn test_coerce_non_negative() {
        let mut count = 0usize;
        assert_eq!(coerce_non_negative(&RawCell::Number(2.5), &mut count), Some(2.5));
        assert_eq!(coerce_non_negative(&RawCell::Text("1,250.5".to_string()), &mut count), Some(1250.5));
        assert_eq!(coerce_non_negative(&RawCell::Empty, &mut count), None);
        assert_eq!(count, 0);

        // 负值与非数值文本: 置缺失并计数
        assert_eq!(coerce_non_negative(&RawCell::Number(-3.0), &mut count), None);
        assert_eq!(coerce_non_negative(&RawCell::Text("N/A".to_string()), &mut count), None);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_map_shipment_rows_positions() {
        let mut cells = vec![RawCell::Empty; 15];
        cells[COL_PLANT] = RawCell::Text("PL01".to_string());
        cells[COL_CATEGORY] = RawCell::Text("Haircare".to_string());
        cells[COL_QUANTITY] = RawCell::Number(120.0);
        cells[COL_SOURCE_WAREHOUSE] = RawCell::Text("WH-A".to_string());
        cells[COL_DELIVERY_STATUS] = RawCell::Text("Late".to_string());

        let table = CellTable {
            rows: vec![main_row(14, cells)],
        };
        let mut report = QualityReport::new("t".to_string());
        let d = NaiveDate::from_ymd_opt(2025, 7, 3);

        let mapper = FieldMapper;
        let rows = mapper.map_shipment_rows(&table, &[d], &[None], &mut report);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.plant.as_deref(), Some("PL01"));
        assert_eq!(row.category.as_deref(), Some("Haircare"));
        assert_eq!(row.quantity, Some(120.0));
        assert_eq!(row.source_warehouse.as_deref(), Some("WH-A"));
        assert_eq!(row.actual_ship_date, d);
        assert_eq!(row.requested_ship_date, None);
        assert_eq!(row.delivery_status_raw.as_deref(), Some("Late"));
    }

    #[test]
    fn test_map_sales_rows_achievement() {
        let mut with_target = vec![RawCell::Empty; 25];
        with_target[SALES_COL_CHANNEL] = RawCell::Text("Modern Trade".to_string());
        with_target[SALES_COL_TARGET] = RawCell::Number(200.0);
        with_target[SALES_COL_SALES] = RawCell::Number(150.0);

        let mut no_target = vec![RawCell::Empty; 25];
        no_target[SALES_COL_CHANNEL] = RawCell::Text("E-Commerce".to_string());
        no_target[SALES_COL_TARGET] = RawCell::Number(0.0);
        no_target[SALES_COL_SALES] = RawCell::Number(80.0);

        let table = CellTable {
            rows: vec![main_row(2, with_target), main_row(3, no_target)],
        };
        let mut report = QualityReport::new("t".to_string());

        let mapper = FieldMapper;
        let records = mapper.map_sales_rows(&table, &mut report);

        assert_eq!(records[0].achievement_pct, Some(75.0));
        // 无目标: 达成率未定义,区别于真实 0%
        assert_eq!(records[1].achievement_pct, None);
    }
}
