// ==========================================
// 供应链发运分析系统 - 刷新入口
// ==========================================
// 职责: 触发一次按需提取并打印 KPI 摘要
// 用法: supply-chain-analytics [配置文件路径]
// ==========================================

use supply_chain_analytics::{logging, DashboardApi, PipelineConfig};

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", supply_chain_analytics::APP_NAME);
    tracing::info!("系统版本: {}", supply_chain_analytics::VERSION);
    tracing::info!("==================================================");

    // 加载配置: 命令行参数优先,其次环境变量,最后默认值
    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::load(),
    };

    let api = DashboardApi::new(config);

    // 按需提取 (已发布且未强制刷新时直接复用)
    let out_dir = api.refresh()?;
    tracing::info!("输出位置: {}", out_dir.display());

    // 加载并打印 KPI 摘要
    let dataset = api.load()?;
    let summary = api.kpi_summary(&dataset);

    tracing::info!("发运总数: {}", summary.rates.total_count);
    tracing::info!(
        "延迟率: {}% | 准时率: {}% | 提前率: {}% | 未到期率: {}%",
        summary.rates.late_rate,
        summary.rates.on_time_rate,
        summary.rates.advanced_rate,
        summary.rates.not_due_rate
    );
    tracing::info!("延迟行平均延迟天数: {}", summary.avg_delay_days);
    if let Some(category) = &summary.worst_category {
        tracing::info!(
            "延迟率最高品类: {} ({}%)",
            category,
            summary.worst_category_late_rate
        );
    }
    if summary.sales.has_data {
        tracing::info!(
            "销售: {} / 目标: {} / 达成率: {}%{}",
            summary.sales.total_sales,
            summary.sales.total_target,
            summary.sales.achievement_pct,
            if summary.sales.no_target { " (无目标)" } else { "" }
        );
    }

    // 数据质量摘要
    let quality = &dataset.quality;
    tracing::info!(
        "数据质量: 源行 {} / 清洗后 {} / 拒绝 {} / 强转 {}",
        quality.summary.source_rows,
        quality.summary.cleaned_rows,
        quality.summary.rejected_rows,
        quality.summary.coerced_values
    );
    for warning in &quality.warnings {
        tracing::warn!(field = %warning.field, "{}", warning.message);
    }

    Ok(())
}
