// ==========================================
// 供应链发运分析系统 - 数据集存储 (落盘契约)
// ==========================================
// 依据: Pipeline_Spec_v1.0.md - 5. 落盘中间表契约
// 契约: 每个逻辑表一个 CSV + extraction_metadata.json + quality_report.json;
//       加列兼容,改名/删列破坏下游
// 发布原子性: 先写临时目录再整体换名,读方看不到半成品
// 并发: 以输出位置为键的锁文件保证同一时刻至多一个提取写方
// ==========================================

use crate::domain::dataset::{AuxTables, Dataset, ExtractionMeta, RawTable};
use crate::domain::quality::QualityReport;
use crate::domain::sales::{SalesRecord, SalesTable};
use crate::domain::shipment::ShipmentRecord;
use crate::store::error::{StoreError, StoreResult};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ===== 落盘文件名 (稳定契约) =====
pub const SHIPPING_MAIN_FILE: &str = "shipping_main.csv";
pub const SHIPPING_PIVOT_FILE: &str = "shipping_pivot.csv";
pub const SHIPPING_CALC_FILE: &str = "shipping_calc.csv";
pub const SHIPPING_REF_FILE: &str = "shipping_ref.csv";
pub const SHIPPING_FILTERS_FILE: &str = "shipping_filters.csv";
pub const SALES_DATA_FILE: &str = "sales_data.csv";
pub const SALES_TOP10_FILE: &str = "sales_top10.csv";
pub const SALES_PIVOT_FILE: &str = "sales_pivot.csv";
pub const METADATA_FILE: &str = "extraction_metadata.json";
pub const QUALITY_FILE: &str = "quality_report.json";

// ==========================================
// DatasetStore
// ==========================================
pub struct DatasetStore {
    out_dir: PathBuf,
}

impl DatasetStore {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.out_dir
    }

    /// 单写方检查: 已发布的判据是元数据文件存在
    pub fn is_published(&self) -> bool {
        self.out_dir.join(METADATA_FILE).exists()
    }

    /// 原子发布: 临时目录写全量 → 整体换名
    ///
    /// 锁文件 (create_new) 保证同一输出位置至多一个并发提取;
    /// 任何写入失败都不会留下半成品目录
    pub fn publish(&self, dataset: &Dataset) -> StoreResult<PathBuf> {
        let _lock = LockGuard::acquire(&self.out_dir)?;

        let tmp_dir = sibling_path(&self.out_dir, ".tmp");
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        self.write_all_tables(dataset, &tmp_dir)?;

        // 换名发布; 既有发布先挪开再删除,失败时旧数据仍完整
        if self.out_dir.exists() {
            let old_dir = sibling_path(&self.out_dir, ".old");
            if old_dir.exists() {
                fs::remove_dir_all(&old_dir)?;
            }
            fs::rename(&self.out_dir, &old_dir)?;
            fs::rename(&tmp_dir, &self.out_dir)?;
            fs::remove_dir_all(&old_dir)?;
        } else {
            if let Some(parent) = self.out_dir.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&tmp_dir, &self.out_dir)?;
        }

        info!(
            out_dir = %self.out_dir.display(),
            shipment_rows = dataset.meta.shipment_rows_clean,
            "数据集发布完成"
        );
        Ok(self.out_dir.clone())
    }

    /// 从已发布位置加载数据集
    pub fn load(&self) -> StoreResult<Dataset> {
        if !self.is_published() {
            return Err(StoreError::NotPublished(self.out_dir.display().to_string()));
        }

        let meta: ExtractionMeta =
            serde_json::from_reader(File::open(self.out_dir.join(METADATA_FILE))?)?;
        let quality: QualityReport =
            serde_json::from_reader(File::open(self.out_dir.join(QUALITY_FILE))?)?;

        let shipments = read_shipments(&self.out_dir.join(SHIPPING_MAIN_FILE))?;

        // 销售表为可选能力: 文件在则整表在
        let sales_path = self.out_dir.join(SALES_DATA_FILE);
        let sales = if sales_path.exists() {
            Some(SalesTable::new(read_sales(&sales_path)?))
        } else {
            None
        };

        let aux = AuxTables {
            shipping_pivot: read_raw_table(&self.out_dir.join(SHIPPING_PIVOT_FILE), "shipping_pivot"),
            shipping_calc: read_raw_table(&self.out_dir.join(SHIPPING_CALC_FILE), "shipping_calc"),
            shipping_ref: read_raw_table(&self.out_dir.join(SHIPPING_REF_FILE), "shipping_ref"),
            shipping_filters: read_raw_table(
                &self.out_dir.join(SHIPPING_FILTERS_FILE),
                "shipping_filters",
            ),
            sales_top10: read_raw_table(&self.out_dir.join(SALES_TOP10_FILE), "sales_top10"),
            sales_pivot: read_raw_table(&self.out_dir.join(SALES_PIVOT_FILE), "sales_pivot"),
        };

        info!(
            out_dir = %self.out_dir.display(),
            shipment_rows = shipments.len(),
            "数据集加载完成"
        );
        Ok(Dataset {
            shipments,
            sales,
            aux,
            meta,
            quality,
        })
    }

    fn write_all_tables(&self, dataset: &Dataset, dir: &Path) -> StoreResult<()> {
        write_shipments(&dir.join(SHIPPING_MAIN_FILE), &dataset.shipments)?;

        if let Some(sales_table) = &dataset.sales {
            write_sales(&dir.join(SALES_DATA_FILE), &sales_table.records)?;
        }

        write_raw_table(&dir.join(SHIPPING_PIVOT_FILE), &dataset.aux.shipping_pivot)?;
        write_raw_table(&dir.join(SHIPPING_CALC_FILE), &dataset.aux.shipping_calc)?;
        write_raw_table(&dir.join(SHIPPING_REF_FILE), &dataset.aux.shipping_ref)?;
        write_raw_table(&dir.join(SHIPPING_FILTERS_FILE), &dataset.aux.shipping_filters)?;
        write_raw_table(&dir.join(SALES_TOP10_FILE), &dataset.aux.sales_top10)?;
        write_raw_table(&dir.join(SALES_PIVOT_FILE), &dataset.aux.sales_pivot)?;

        serde_json::to_writer_pretty(File::create(dir.join(METADATA_FILE))?, &dataset.meta)?;
        serde_json::to_writer_pretty(File::create(dir.join(QUALITY_FILE))?, &dataset.quality)?;
        Ok(())
    }
}

// ==========================================
// 锁文件守卫
// ==========================================
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(out_dir: &Path) -> StoreResult<Self> {
        let path = sibling_path(out_dir, ".lock");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::Locked(out_dir.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "锁文件清理失败");
        }
    }
}

/// 在同一父目录下构造带后缀的兄弟路径 (保证换名不跨文件系统)
fn sibling_path(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());
    dir.with_file_name(format!("{name}{suffix}"))
}

// ==========================================
// 表级读写
// ==========================================

fn write_shipments(path: &Path, records: &[ShipmentRecord]) -> StoreResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_shipments(path: &Path) -> StoreResult<Vec<ShipmentRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

fn write_sales(path: &Path, records: &[SalesRecord]) -> StoreResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_sales(path: &Path) -> StoreResult<Vec<SalesRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

fn write_raw_table(path: &Path, table: &RawTable) -> StoreResult<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    if !table.columns.is_empty() {
        writer.write_record(&table.columns)?;
    }
    for row in &table.rows {
        if !row.is_empty() {
            writer.write_record(row)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// 辅助表读回; 文件缺失按空表处理 (告警不报错,保持面板可用)
fn read_raw_table(path: &Path, name: &str) -> RawTable {
    let mut table = RawTable::new(name);
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(r) => r,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "辅助表缺失,按空表处理");
            return table;
        }
    };

    if let Ok(headers) = reader.headers() {
        table.columns = headers.iter().map(|h| h.to_string()).collect();
    }
    for result in reader.records() {
        match result {
            Ok(record) => table.rows.push(record.iter().map(|v| v.to_string()).collect()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "辅助表行读取失败,跳过");
            }
        }
    }
    table
}
