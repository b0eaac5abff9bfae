// ==========================================
// 供应链发运分析系统 - 过滤引擎集成测试
// ==========================================
// 核心性质:
// - "全时段"过滤幂等 (行数与整体率不变)
// - 日期锚点取自数据,未来日期的行不被隐式排除 (历史口径偏差回归)
// - 维度过滤的子集与未过滤数据上的谓词计数一致
// ==========================================

mod test_helpers;

use chrono::NaiveDate;
use supply_chain_analytics::engine::filter::{DateRange, DimensionFilters, FilterApplier};
use supply_chain_analytics::engine::kpi::KpiEngine;
use supply_chain_analytics::{DeliveryStatus, FilterDimension};
use test_helpers::{make_shipment, wrap_dataset};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_all_time_filter_is_idempotent() {
    let counts = &[
        (DeliveryStatus::Late, 300),
        (DeliveryStatus::OnTime, 500),
        (DeliveryStatus::Advanced, 100),
        (DeliveryStatus::NotDue, 100),
    ];
    let dataset = test_helpers::make_dataset(counts, "Haircare");

    let filtered = FilterApplier.apply(&dataset, &DateRange::AllTime, &DimensionFilters::new());

    assert_eq!(filtered.shipment_count(), dataset.shipment_count());
    assert_eq!(
        KpiEngine.overall_rates(&filtered),
        KpiEngine.overall_rates(&dataset)
    );
}

#[test]
fn test_future_dated_rows_survive_all_time() {
    // 快照包含远晚于墙钟"今天"的日期; 全时段过滤必须保留它们
    let shipments = vec![
        make_shipment(1, DeliveryStatus::OnTime, "Haircare", Some(d(2025, 7, 1))),
        make_shipment(2, DeliveryStatus::Late, "Haircare", Some(d(2099, 12, 31))),
        make_shipment(3, DeliveryStatus::NotDue, "Haircare", None),
    ];
    let dataset = wrap_dataset(shipments);

    let filtered = FilterApplier.apply(&dataset, &DateRange::AllTime, &DimensionFilters::new());

    assert_eq!(filtered.shipment_count(), 3);
    assert!(filtered
        .shipments
        .iter()
        .any(|r| r.actual_ship_date == Some(d(2099, 12, 31))));
}

#[test]
fn test_relative_range_anchored_to_data_max() {
    // 最近 7 天以数据最大日期 2099-12-31 为锚,而非今天
    let shipments = vec![
        make_shipment(1, DeliveryStatus::OnTime, "Haircare", Some(d(2099, 12, 1))),
        make_shipment(2, DeliveryStatus::OnTime, "Haircare", Some(d(2099, 12, 28))),
        make_shipment(3, DeliveryStatus::Late, "Haircare", Some(d(2099, 12, 31))),
    ];
    let dataset = wrap_dataset(shipments);

    let filtered = FilterApplier.apply(&dataset, &DateRange::LastDays(7), &DimensionFilters::new());

    assert_eq!(filtered.shipment_count(), 2);
    assert!(filtered
        .shipments
        .iter()
        .all(|r| r.actual_ship_date >= Some(d(2099, 12, 24))));
}

#[test]
fn test_category_filter_matches_hand_computed_subset() {
    // Haircare: 4 行中 1 行延迟 → 25.0%; Oralcare 行不得混入
    let shipments = vec![
        make_shipment(1, DeliveryStatus::Late, "Haircare", Some(d(2025, 7, 1))),
        make_shipment(2, DeliveryStatus::OnTime, "Haircare", Some(d(2025, 7, 2))),
        make_shipment(3, DeliveryStatus::OnTime, "Haircare", Some(d(2025, 7, 3))),
        make_shipment(4, DeliveryStatus::NotDue, "Haircare", None),
        make_shipment(5, DeliveryStatus::Late, "Oralcare", Some(d(2025, 7, 1))),
        make_shipment(6, DeliveryStatus::Late, "Oralcare", Some(d(2025, 7, 2))),
    ];
    let dataset = wrap_dataset(shipments);

    let filters = DimensionFilters::new().allow(FilterDimension::Category, ["Haircare"]);
    let filtered = FilterApplier.apply(&dataset, &DateRange::AllTime, &filters);

    // 子集行数 = 未过滤数据上的谓词计数
    let expected = dataset
        .shipments
        .iter()
        .filter(|r| r.category.as_deref() == Some("Haircare"))
        .count();
    assert_eq!(filtered.shipment_count(), expected);
    assert_eq!(filtered.shipment_count(), 4);

    // 子集上重算的延迟率 = 手算值 1/4 = 25.0%
    let rates = KpiEngine.overall_rates(&filtered);
    assert_eq!(rates.late_rate, 25.0);
}

#[test]
fn test_filter_then_kpi_never_shows_stale_values() {
    // 空子集必须产出"无数据"零值,而不是残留上一次的 KPI
    let shipments = vec![
        make_shipment(1, DeliveryStatus::Late, "Haircare", Some(d(2025, 7, 1))),
        make_shipment(2, DeliveryStatus::Late, "Haircare", Some(d(2025, 7, 2))),
    ];
    let dataset = wrap_dataset(shipments);

    let full_rates = KpiEngine.overall_rates(&dataset);
    assert_eq!(full_rates.late_rate, 100.0);

    let filters = DimensionFilters::new().allow(FilterDimension::Category, ["Oralcare"]);
    let empty = FilterApplier.apply(&dataset, &DateRange::AllTime, &filters);
    let empty_rates = KpiEngine.overall_rates(&empty);

    assert_eq!(empty.shipment_count(), 0);
    assert!(!empty_rates.has_data);
    assert_eq!(empty_rates.late_rate, 0.0);
}

#[test]
fn test_combined_date_and_dimension_filter() {
    let shipments = vec![
        make_shipment(1, DeliveryStatus::Late, "Haircare", Some(d(2025, 7, 1))),
        make_shipment(2, DeliveryStatus::OnTime, "Haircare", Some(d(2025, 7, 20))),
        make_shipment(3, DeliveryStatus::OnTime, "Oralcare", Some(d(2025, 7, 1))),
    ];
    let dataset = wrap_dataset(shipments);

    let filters = DimensionFilters::new().allow(FilterDimension::Category, ["Haircare"]);
    let filtered = FilterApplier.apply(
        &dataset,
        &DateRange::Between(d(2025, 7, 1), d(2025, 7, 10)),
        &filters,
    );

    assert_eq!(filtered.shipment_count(), 1);
    assert_eq!(filtered.shipments[0].transaction_id, 1);
}
