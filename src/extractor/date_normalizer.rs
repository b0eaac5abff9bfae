// ==========================================
// 供应链发运分析系统 - 日期归一化器 (DateNormalizer)
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 3.2 日期归一化策略
// 职责: 把混合表示的日期列 (序列号/文本/已类型化时间/带时区值)
//       归一为统一的 NaiveDate; 解析失败置缺失,绝不伪造
// ==========================================
// 优先级 (逐单元格):
//   1. 已类型化的时间值 → 直接保留,时区剥离为本地日期
//   2. 文本 → 按格式清单解析; 失败且文本为纯数字时转入 3
//   3. 数值 → 按表格纪元 1899-12-30 的天偏移解释 (序列号窗口内)
//   4. 整列归一化后全缺失 → 质量警告,不生成占位日期
// 同一列可能跨导出代际混用文本与序列号,因此 3 只能在 2 失败后
// 尝试,不能取代 2
// ==========================================

use crate::domain::quality::{DqLevel, QualityReport};
use crate::extractor::workbook::RawCell;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

// 表格纪元: 1899-12-30 (序列号 0 对应日)
// 序列号合法窗口: 1 (1899-12-31) ..= 2_958_465 (9999-12-31)
const SERIAL_MIN: f64 = 1.0;
const SERIAL_MAX: f64 = 2_958_465.0;

// 文本日期格式清单 (按源数据出现频率排序; 月/日序先于日/月序)
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

pub struct DateNormalizer;

impl DateNormalizer {
    /// 归一化一整列日期
    ///
    /// 返回与输入等长的向量; 不可解析值计入质量报告的对应列计数,
    /// 整列全缺失追加 Warning
    pub fn normalize_column(
        &self,
        column_name: &str,
        cells: &[RawCell],
        report: &mut QualityReport,
    ) -> Vec<Option<NaiveDate>> {
        let mut out = Vec::with_capacity(cells.len());
        let mut non_empty = 0usize;

        for cell in cells {
            if !cell.is_empty() {
                non_empty += 1;
            }
            match self.normalize_cell(cell) {
                Normalized::Date(d) => out.push(Some(d)),
                Normalized::Missing => out.push(None),
                Normalized::Unparseable => {
                    report.count_unparseable_date(column_name);
                    out.push(None);
                }
            }
        }

        let parsed = out.iter().filter(|d| d.is_some()).count();
        debug!(
            column = column_name,
            total = cells.len(),
            non_empty,
            parsed,
            "日期列归一化完成"
        );

        if parsed == 0 && !cells.is_empty() {
            let message = if non_empty == 0 {
                format!("日期列 {column_name} 在源区块中整列为空")
            } else {
                format!("日期列 {column_name} 共 {non_empty} 个非空值,无一可解析为日期")
            };
            report.warn(DqLevel::Warning, column_name, message);
        }

        out
    }

    /// 单元格级归一化
    fn normalize_cell(&self, cell: &RawCell) -> Normalized {
        match cell {
            RawCell::Empty | RawCell::Bool(_) => Normalized::Missing,

            // 优先级 1: 已类型化时间值
            RawCell::DateTimeSerial(serial) => match from_serial(*serial) {
                Some(d) => Normalized::Date(d),
                None => Normalized::Unparseable,
            },
            RawCell::DateTimeText(s) => match parse_text(s) {
                Some(d) => Normalized::Date(d),
                None => Normalized::Unparseable,
            },

            // 优先级 2: 文本解析; 纯数字文本回落到序列号
            RawCell::Text(s) => {
                if let Some(d) = parse_text(s) {
                    return Normalized::Date(d);
                }
                if let Ok(n) = s.trim().parse::<f64>() {
                    return match from_serial(n) {
                        Some(d) => Normalized::Date(d),
                        None => Normalized::Unparseable,
                    };
                }
                Normalized::Unparseable
            }

            // 优先级 3: 数值按序列号解释
            RawCell::Number(n) => match from_serial(*n) {
                Some(d) => Normalized::Date(d),
                None => Normalized::Unparseable,
            },
        }
    }
}

enum Normalized {
    Date(NaiveDate),
    Missing,
    Unparseable,
}

/// 序列号 → 日期 (小数部分为时刻,截断)
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// 文本 → 日期; 带时区值剥离到本地日期
fn parse_text(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    // RFC 3339 (带时区): 剥离时区取日期部分
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local().date());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_from_serial_epoch_reference() {
        // 45839 = 2025-07-01
        assert_eq!(from_serial(45839.0), Some(d(2025, 7, 1)));
        // 序列号 1 = 1899-12-31
        assert_eq!(from_serial(1.0), Some(d(1899, 12, 31)));
        // 时刻小数截断
        assert_eq!(from_serial(45839.75), Some(d(2025, 7, 1)));
    }

    #[test]
    fn test_from_serial_window() {
        assert_eq!(from_serial(0.0), None);
        assert_eq!(from_serial(-5.0), None);
        assert_eq!(from_serial(3_000_000.0), None);
        assert_eq!(from_serial(f64::NAN), None);
    }

    #[test]
    fn test_parse_text_formats() {
        assert_eq!(parse_text("2025-07-15"), Some(d(2025, 7, 15)));
        assert_eq!(parse_text("2025/07/15"), Some(d(2025, 7, 15)));
        assert_eq!(parse_text("07/15/2025"), Some(d(2025, 7, 15)));
        assert_eq!(parse_text("2025-07-15 08:30:00"), Some(d(2025, 7, 15)));
        // 带时区: 剥离为本地日期
        assert_eq!(parse_text("2025-07-15T08:30:00+08:00"), Some(d(2025, 7, 15)));
        assert_eq!(parse_text("not a date"), None);
    }

    #[test]
    fn test_mixed_column_text_and_serial() {
        // 同一列混用文本与序列号 (跨导出代际)
        let normalizer = DateNormalizer;
        let mut report = QualityReport::new("t".to_string());
        let cells = vec![
            RawCell::Text("2025-07-01".to_string()),
            RawCell::Number(45840.0),              // 2025-07-02
            RawCell::Text("45841".to_string()),    // 纯数字文本 → 序列号
            RawCell::Empty,
            RawCell::Text("garbage".to_string()),
        ];
        let out = normalizer.normalize_column("actual_ship_date", &cells, &mut report);

        assert_eq!(out[0], Some(d(2025, 7, 1)));
        assert_eq!(out[1], Some(d(2025, 7, 2)));
        assert_eq!(out[2], Some(d(2025, 7, 3)));
        assert_eq!(out[3], None);
        assert_eq!(out[4], None);
        assert_eq!(report.unparseable_dates.get("actual_ship_date"), Some(&1));
    }

    #[test]
    fn test_all_missing_column_warns_without_fabrication() {
        let normalizer = DateNormalizer;
        let mut report = QualityReport::new("t".to_string());
        let cells = vec![RawCell::Empty, RawCell::Empty];
        let out = normalizer.normalize_column("requested_ship_date", &cells, &mut report);

        // 不生成占位日期
        assert!(out.iter().all(|v| v.is_none()));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "requested_ship_date");
    }

    #[test]
    fn test_typed_datetime_kept() {
        let normalizer = DateNormalizer;
        let mut report = QualityReport::new("t".to_string());
        let cells = vec![RawCell::DateTimeSerial(45839.5)];
        let out = normalizer.normalize_column("actual_ship_date", &cells, &mut report);
        assert_eq!(out[0], Some(d(2025, 7, 1)));
    }
}
