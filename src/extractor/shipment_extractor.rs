// ==========================================
// 供应链发运分析系统 - 提取编排器
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 3.1 提取主流程
// 职责: 整合提取流程,从两个源工作簿到内存 Dataset
// 流程: 读取 → 日期归一化 → 字段映射 → 清洗 → 组装
// 致命错误 (SourceUnavailable/SheetNotFound) 直接上抛,不产出部分结果
// ==========================================

use crate::domain::dataset::{AuxTables, Dataset, ExtractionMeta};
use crate::domain::quality::QualityReport;
use crate::domain::sales::SalesTable;
use crate::extractor::date_normalizer::DateNormalizer;
use crate::extractor::error::ExtractResult;
use crate::extractor::field_mapper::{FieldMapper, COL_ACTUAL_SHIP_DATE, COL_REQUESTED_SHIP_DATE};
use crate::extractor::record_cleaner::RecordCleaner;
use crate::extractor::workbook::WorkbookReader;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// SourcePaths - 两个源工作簿位置
// ==========================================
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub shipment_workbook: PathBuf, // 发运跟踪工作簿
    pub sales_workbook: PathBuf,    // 销售明细工作簿
}

// ==========================================
// ShipmentExtractor - 提取编排器
// ==========================================
pub struct ShipmentExtractor {
    reader: WorkbookReader,
    normalizer: DateNormalizer,
    mapper: FieldMapper,
    cleaner: RecordCleaner,
}

impl Default for ShipmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShipmentExtractor {
    pub fn new() -> Self {
        Self {
            reader: WorkbookReader,
            normalizer: DateNormalizer,
            mapper: FieldMapper,
            cleaner: RecordCleaner,
        }
    }

    /// 执行一次完整提取
    ///
    /// 每次提取整表替换,不与既有状态合并; 单线程同步运行到完成
    #[instrument(skip(self, sources), fields(batch_id))]
    pub fn extract(&self, sources: &SourcePaths) -> ExtractResult<Dataset> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(
            batch_id = %batch_id,
            shipment_workbook = %sources.shipment_workbook.display(),
            sales_workbook = %sources.sales_workbook.display(),
            "开始提取"
        );
        let mut report = QualityReport::new(batch_id.clone());

        // === 步骤 1: 读取发运跟踪工作簿 ===
        debug!("步骤 1: 读取发运跟踪工作簿");
        let shipment_wb = self.reader.read_shipment_workbook(&sources.shipment_workbook)?;
        let raw_rows = shipment_wb.main.len();
        info!(raw_rows, "发运工作簿读取完成");

        // === 步骤 2: 日期列归一化 ===
        debug!("步骤 2: 日期列归一化");
        let actual_dates = self.normalizer.normalize_column(
            "actual_ship_date",
            &shipment_wb.main.column(COL_ACTUAL_SHIP_DATE),
            &mut report,
        );
        let requested_dates = self.normalizer.normalize_column(
            "requested_ship_date",
            &shipment_wb.main.column(COL_REQUESTED_SHIP_DATE),
            &mut report,
        );

        // === 步骤 3: 字段映射 ===
        debug!("步骤 3: 字段映射");
        let mapped = self.mapper.map_shipment_rows(
            &shipment_wb.main,
            &actual_dates,
            &requested_dates,
            &mut report,
        );

        // === 步骤 4: 清洗 ===
        debug!("步骤 4: 清洗");
        let shipments = self.cleaner.clean(mapped, &mut report);

        // === 步骤 5: 读取销售明细工作簿 ===
        debug!("步骤 5: 读取销售明细工作簿");
        let sales_wb = self.reader.read_sales_workbook(&sources.sales_workbook)?;
        let sales_records = self.mapper.map_sales_rows(&sales_wb.data, &mut report);
        let sales_rows = sales_records.len();
        info!(sales_rows, "销售明细读取完成");
        // 销售数值强转发生在清洗收尾之后,重算一次汇总
        report.finalize(raw_rows, shipments.len());

        // === 步骤 6: 组装 Dataset ===
        let meta = ExtractionMeta {
            batch_id,
            extracted_at: Utc::now(),
            shipment_rows_raw: raw_rows,
            shipment_rows_clean: shipments.len(),
            sales_rows,
        };
        let dataset = Dataset {
            shipments,
            sales: Some(SalesTable::new(sales_records)),
            aux: AuxTables {
                shipping_pivot: shipment_wb.pivot,
                shipping_calc: shipment_wb.calc,
                shipping_ref: shipment_wb.reference,
                shipping_filters: shipment_wb.filter_settings,
                sales_top10: sales_wb.top10,
                sales_pivot: sales_wb.pivot,
            },
            meta,
            quality: report,
        };

        info!(
            shipment_rows_clean = dataset.meta.shipment_rows_clean,
            sales_rows = dataset.meta.sales_rows,
            "提取完成"
        );
        Ok(dataset)
    }
}
