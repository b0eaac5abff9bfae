// ==========================================
// 供应链发运分析系统 - 领域层
// ==========================================

pub mod dataset;
pub mod quality;
pub mod sales;
pub mod shipment;
pub mod types;

pub use dataset::{AuxTables, Dataset, ExtractionMeta, RawTable};
pub use quality::{DqLevel, QualityReport, QualitySummary, QualityWarning, RejectionCounts};
pub use sales::{SalesRecord, SalesTable};
pub use shipment::{RawShipmentRow, ShipmentRecord};
