// ==========================================
// 供应链发运分析系统 - 提取层
// ==========================================
// 流程: 工作簿读取 → 日期归一化 → 字段映射 → 记录清洗 → Dataset
// ==========================================

pub mod date_normalizer;
pub mod error;
pub mod field_mapper;
pub mod record_cleaner;
pub mod shipment_extractor;
pub mod workbook;

pub use date_normalizer::DateNormalizer;
pub use error::{ExtractError, ExtractResult};
pub use field_mapper::FieldMapper;
pub use record_cleaner::RecordCleaner;
pub use shipment_extractor::{ShipmentExtractor, SourcePaths};
pub use workbook::{CellRow, CellTable, RawCell, WorkbookReader};
