// ==========================================
// 供应链发运分析系统 - 工作簿读取器 (SourceReader)
// ==========================================
// 依据: Workbook_Layout_v2.md - 两个源工作簿的固定区块布局
// 职责: 按固定行列范围定位取数,列名按位置分配(表头行在源文件中时有时无,
//       不做表头推断); 布局漂移大声失败,不做静默重解释
// ==========================================

use crate::domain::dataset::RawTable;
use crate::extractor::error::{ExtractError, ExtractResult};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

// ==========================================
// 发运跟踪工作簿布局 (固定契约)
// ==========================================
// 工作表: Sheet1
// 主表:       A:O 列, 第 14 行起 (第 13 行为表头)
// 透视区块:   P:U 列, 同行段
// 计算区块:   Y:AF 列, 同行段
// 参考区块:   AG:AM 列, 第 1-100 行
// 过滤设置:   A:B 列, 第 4-11 行
pub const SHIPMENT_SHEET: &str = "Sheet1";
const MAIN_HEADER_ROW: u32 = 12; // 0-based; 即第 13 行
const MAIN_DATA_START: u32 = 13; // 0-based; 即第 14 行
const MAIN_COLS: std::ops::Range<u32> = 0..15; // A:O
const PIVOT_COLS: std::ops::Range<u32> = 15..21; // P:U
const CALC_COLS: std::ops::Range<u32> = 24..32; // Y:AF
const REF_COLS: std::ops::Range<u32> = 32..39; // AG:AM
const REF_ROWS: std::ops::Range<u32> = 0..100;
const FILTER_ROWS: std::ops::Range<u32> = 3..11; // 第 4-11 行
const FILTER_COLS: std::ops::Range<u32> = 0..2; // A:B

// ==========================================
// 销售明细工作簿布局 (固定契约)
// ==========================================
// Data 页仅取前 25 列; TOP 10 / Pivot 页整页透传
pub const SALES_DATA_SHEET: &str = "Data";
pub const SALES_TOP10_SHEET: &str = "TOP 10";
pub const SALES_PIVOT_SHEET: &str = "Pivot";
const SALES_DATA_COLS: std::ops::Range<u32> = 0..25;

// ==========================================
// RawCell - 保留类型信息的原始单元格
// ==========================================
// 日期列的归一化策略依赖类型区分: 已类型化的时间值、
// 文本、数值(可能是序列号)走不同的解析优先级
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTimeSerial(f64), // 工作簿内已标记为日期格式的序列号
    DateTimeText(String), // ISO 8601 文本形式的时间值
}

impl RawCell {
    pub fn from_sheet_cell(cell: &Data) -> Self {
        match cell {
            Data::Empty => RawCell::Empty,
            Data::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(trimmed.to_string())
                }
            }
            Data::Float(f) => RawCell::Number(*f),
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Bool(b) => RawCell::Bool(*b),
            Data::DateTime(dt) => RawCell::DateTimeSerial(dt.as_f64()),
            Data::DateTimeIso(s) => RawCell::DateTimeText(s.clone()),
            // 错误单元格与时长等一律按空处理
            _ => RawCell::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    /// 文本视图 (清洗层的分类字段走这里)
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Number(n) => Some(format!("{n}")),
            _ => None,
        }
    }
}

// ==========================================
// CellRow / CellTable - 定位取数结果
// ==========================================
#[derive(Debug, Clone)]
pub struct CellRow {
    pub row_number: usize, // 工作表内 1-based 行号
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, Default)]
pub struct CellTable {
    pub rows: Vec<CellRow>,
}

impl CellTable {
    /// 抽取一整列 (按区块内列下标)
    pub fn column(&self, col_idx: usize) -> Vec<RawCell> {
        self.rows
            .iter()
            .map(|row| row.cells.get(col_idx).cloned().unwrap_or(RawCell::Empty))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// 读取结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ShipmentWorkbook {
    pub main: CellTable,          // 主交易表 (类型保留,供归一化/清洗)
    pub pivot: RawTable,          // 透视区块 (透传)
    pub calc: RawTable,           // 计算区块 (透传)
    pub reference: RawTable,      // 参考区块 (透传)
    pub filter_settings: RawTable, // 过滤设置区块 (透传)
}

#[derive(Debug, Clone)]
pub struct SalesWorkbook {
    pub data: CellTable, // Data 页 (类型保留,供映射)
    pub top10: RawTable, // TOP 10 页 (透传)
    pub pivot: RawTable, // Pivot 页 (透传)
}

// ==========================================
// WorkbookReader - 工作簿读取器
// ==========================================
pub struct WorkbookReader;

impl WorkbookReader {
    /// 读取发运跟踪工作簿的全部区块
    pub fn read_shipment_workbook(&self, path: &Path) -> ExtractResult<ShipmentWorkbook> {
        let mut workbook = open_xlsx(path)?;
        let range = sheet_range(&mut workbook, path, SHIPMENT_SHEET)?;

        let end_row = range
            .end()
            .map(|(r, _)| r)
            .ok_or(ExtractError::EmptySheet {
                sheet: SHIPMENT_SHEET.to_string(),
            })?;

        if end_row < MAIN_DATA_START {
            return Err(ExtractError::EmptySheet {
                sheet: SHIPMENT_SHEET.to_string(),
            });
        }

        let main = cell_block(&range, MAIN_DATA_START, end_row, MAIN_COLS);
        debug!(rows = main.len(), "发运主表定位取数完成");

        let pivot = string_block(
            &range,
            "shipping_pivot",
            header_names(&range, MAIN_HEADER_ROW, PIVOT_COLS),
            MAIN_DATA_START,
            end_row,
            PIVOT_COLS,
        );
        let calc = string_block(
            &range,
            "shipping_calc",
            header_names(&range, MAIN_HEADER_ROW, CALC_COLS),
            MAIN_DATA_START,
            end_row,
            CALC_COLS,
        );
        let reference = string_block(
            &range,
            "shipping_ref",
            header_names(&range, REF_ROWS.start, REF_COLS),
            REF_ROWS.start + 1,
            (REF_ROWS.end - 1).min(end_row),
            REF_COLS,
        );
        let filter_settings = string_block(
            &range,
            "shipping_filters",
            vec!["Filter_Name".to_string(), "Filter_Value".to_string()],
            FILTER_ROWS.start,
            (FILTER_ROWS.end - 1).min(end_row),
            FILTER_COLS,
        );

        Ok(ShipmentWorkbook {
            main,
            pivot,
            calc,
            reference,
            filter_settings,
        })
    }

    /// 读取销售明细工作簿的预期页
    ///
    /// 预期页缺失是致命错误 (SheetNotFound): 下游 KPI 口径
    /// 依赖完整输入,不允许静默跳过
    pub fn read_sales_workbook(&self, path: &Path) -> ExtractResult<SalesWorkbook> {
        let mut workbook = open_xlsx(path)?;

        let data_range = sheet_range(&mut workbook, path, SALES_DATA_SHEET)?;
        let (data_start, data_end) = match (data_range.start(), data_range.end()) {
            (Some((start, _)), Some((end, _))) => (start, end),
            _ => {
                return Err(ExtractError::EmptySheet {
                    sheet: SALES_DATA_SHEET.to_string(),
                })
            }
        };
        // 首个使用行为表头,数据自下一行起
        let data = cell_block(&data_range, data_start + 1, data_end, SALES_DATA_COLS);
        debug!(rows = data.len(), "销售明细 Data 页定位取数完成");

        let top10 = whole_sheet(&mut workbook, path, SALES_TOP10_SHEET, "sales_top10")?;
        let pivot = whole_sheet(&mut workbook, path, SALES_PIVOT_SHEET, "sales_pivot")?;

        Ok(SalesWorkbook { data, top10, pivot })
    }
}

// ==========================================
// 内部工具
// ==========================================

fn open_xlsx(path: &Path) -> ExtractResult<Xlsx<BufReader<File>>> {
    if !path.exists() {
        return Err(ExtractError::SourceUnavailable(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "xlsx" && ext != "xls" {
        return Err(ExtractError::UnsupportedFormat(ext));
    }

    let workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e: calamine::XlsxError| ExtractError::ExcelParseError(e.to_string()))?;
    Ok(workbook)
}

fn sheet_range(
    workbook: &mut Xlsx<BufReader<File>>,
    path: &Path,
    sheet: &str,
) -> ExtractResult<calamine::Range<Data>> {
    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(ExtractError::SheetNotFound {
            workbook: path.display().to_string(),
            sheet: sheet.to_string(),
        });
    }
    workbook
        .worksheet_range(sheet)
        .map_err(|e| ExtractError::ExcelParseError(e.to_string()))
}

fn stringify(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// 类型保留的区块取数; 跳过整行为空的行
fn cell_block(
    range: &calamine::Range<Data>,
    row_start: u32,
    row_end: u32,
    cols: std::ops::Range<u32>,
) -> CellTable {
    let mut rows = Vec::new();
    for r in row_start..=row_end {
        let cells: Vec<RawCell> = cols
            .clone()
            .map(|c| {
                range
                    .get_value((r, c))
                    .map(RawCell::from_sheet_cell)
                    .unwrap_or(RawCell::Empty)
            })
            .collect();

        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(CellRow {
            row_number: (r + 1) as usize,
            cells,
        });
    }
    CellTable { rows }
}

/// 表头行的位置化列名; 空表头按列序补名
fn header_names(
    range: &calamine::Range<Data>,
    header_row: u32,
    cols: std::ops::Range<u32>,
) -> Vec<String> {
    cols.clone()
        .enumerate()
        .map(|(i, c)| {
            let name = range.get_value((header_row, c)).map(stringify).unwrap_or_default();
            if name.is_empty() {
                format!("col_{}", i + 1)
            } else {
                name
            }
        })
        .collect()
}

/// 字符串化的透传区块
fn string_block(
    range: &calamine::Range<Data>,
    name: &str,
    columns: Vec<String>,
    row_start: u32,
    row_end: u32,
    cols: std::ops::Range<u32>,
) -> RawTable {
    let mut table = RawTable::new(name);
    table.columns = columns;
    for r in row_start..=row_end {
        let row: Vec<String> = cols
            .clone()
            .map(|c| range.get_value((r, c)).map(stringify).unwrap_or_default())
            .collect();
        if row.iter().all(|v| v.is_empty()) {
            continue;
        }
        table.rows.push(row);
    }
    table
}

/// 整页透传 (首个使用行作为列名行)
fn whole_sheet(
    workbook: &mut Xlsx<BufReader<File>>,
    path: &Path,
    sheet: &str,
    name: &str,
) -> ExtractResult<RawTable> {
    let range = sheet_range(workbook, path, sheet)?;
    let mut table = RawTable::new(name);

    let mut rows_iter = range.rows();
    if let Some(header) = rows_iter.next() {
        table.columns = header
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let s = stringify(c);
                if s.is_empty() {
                    format!("col_{}", i + 1)
                } else {
                    s
                }
            })
            .collect();
    }
    for row in rows_iter {
        let values: Vec<String> = row.iter().map(stringify).collect();
        if values.iter().all(|v| v.is_empty()) {
            continue;
        }
        table.rows.push(values);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_workbook_is_source_unavailable() {
        let reader = WorkbookReader;
        let result = reader.read_shipment_workbook(Path::new("no_such_workbook.xlsx"));
        assert!(matches!(result, Err(ExtractError::SourceUnavailable(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        // 扩展名在打开前校验,文件需真实存在
        let tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let result = open_xlsx(tmp.path());
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_raw_cell_from_sheet_cell() {
        assert_eq!(
            RawCell::from_sheet_cell(&Data::String("  Late ".to_string())),
            RawCell::Text("Late".to_string())
        );
        assert_eq!(
            RawCell::from_sheet_cell(&Data::String("   ".to_string())),
            RawCell::Empty
        );
        assert_eq!(RawCell::from_sheet_cell(&Data::Float(45123.0)), RawCell::Number(45123.0));
        assert_eq!(RawCell::from_sheet_cell(&Data::Int(7)), RawCell::Number(7.0));
        assert_eq!(RawCell::from_sheet_cell(&Data::Empty), RawCell::Empty);
    }

    #[test]
    fn test_cell_table_column_pads_short_rows() {
        let table = CellTable {
            rows: vec![
                CellRow {
                    row_number: 14,
                    cells: vec![RawCell::Number(1.0), RawCell::Text("a".to_string())],
                },
                CellRow {
                    row_number: 15,
                    cells: vec![RawCell::Number(2.0)],
                },
            ],
        };
        let col = table.column(1);
        assert_eq!(col.len(), 2);
        assert_eq!(col[1], RawCell::Empty);
    }
}
