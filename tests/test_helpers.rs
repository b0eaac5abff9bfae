// ==========================================
// 供应链发运分析系统 - 集成测试辅助
// ==========================================
// 数据集构造器: 按状态分布批量生成发运记录
// ==========================================

use chrono::{NaiveDate, Utc};
use supply_chain_analytics::domain::dataset::{AuxTables, Dataset, ExtractionMeta};
use supply_chain_analytics::domain::quality::QualityReport;
use supply_chain_analytics::domain::sales::SalesTable;
use supply_chain_analytics::domain::shipment::ShipmentRecord;
use supply_chain_analytics::DeliveryStatus;

/// 构造单条发运记录; 日期按状态语义自洽
/// (Late: actual 晚于 requested; NotDue: 无 actual)
pub fn make_shipment(
    id: u64,
    status: DeliveryStatus,
    category: &str,
    actual: Option<NaiveDate>,
) -> ShipmentRecord {
    let requested = actual.map(|d| match status {
        DeliveryStatus::Late => d - chrono::Duration::days(2),
        DeliveryStatus::Advanced => d + chrono::Duration::days(2),
        _ => d,
    });
    let delay_days = match (actual, requested) {
        (Some(a), Some(r)) => Some(a.signed_duration_since(r).num_days()),
        _ => None,
    };

    ShipmentRecord {
        transaction_id: id,
        plant: Some("PL01".to_string()),
        source_warehouse: Some("WH-A".to_string()),
        category: Some(category.to_string()),
        master_brand: None,
        brand: None,
        planning_level: Some(format!("SKU-{:02}", id % 7)),
        quantity: Some(10.0),
        requested_ship_date: requested,
        actual_ship_date: if status == DeliveryStatus::NotDue {
            None
        } else {
            actual
        },
        delay_days: if status == DeliveryStatus::NotDue {
            None
        } else {
            delay_days
        },
        delivery_status: status,
    }
}

/// 按状态分布批量构造数据集
///
/// 有日期状态的行在 7 月内循环取日,保持分布稳定可复现
pub fn make_dataset(counts: &[(DeliveryStatus, usize)], category: &str) -> Dataset {
    let mut shipments = Vec::new();
    let mut id = 0u64;
    for (status, count) in counts {
        for i in 0..*count {
            id += 1;
            let day = (i % 28) as u32 + 1;
            let actual = NaiveDate::from_ymd_opt(2025, 7, day);
            shipments.push(make_shipment(id, *status, category, actual));
        }
    }
    wrap_dataset(shipments)
}

/// 把现成记录包装为 Dataset
pub fn wrap_dataset(shipments: Vec<ShipmentRecord>) -> Dataset {
    let count = shipments.len();
    Dataset {
        shipments,
        sales: Some(SalesTable::default()),
        aux: AuxTables::default(),
        meta: ExtractionMeta {
            batch_id: "it-batch".to_string(),
            extracted_at: Utc::now(),
            shipment_rows_raw: count,
            shipment_rows_clean: count,
            sales_rows: 0,
        },
        quality: QualityReport::new("it-batch".to_string()),
    }
}
