// ==========================================
// 供应链发运分析系统 - 配置层
// ==========================================
// 职责: 源工作簿路径、输出位置、刷新开关
// 存储: JSON 配置文件 (路径与刷新触发是配置关切,不进入核心类型)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "SUPPLY_ANALYTICS_CONFIG";

// ==========================================
// PipelineConfig - 管道配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 发运跟踪工作簿路径
    pub shipment_workbook: PathBuf,
    /// 销售明细工作簿路径
    pub sales_workbook: PathBuf,
    /// 提取结果输出目录
    pub output_dir: PathBuf,
    /// 已发布时是否强制重新提取
    pub force_refresh: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shipment_workbook: PathBuf::from("data/shipping_tracking.xlsx"),
            sales_workbook: PathBuf::from("data/sales_detail.xlsx"),
            output_dir: default_output_dir(),
            force_refresh: false,
        }
    }
}

impl PipelineConfig {
    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let config: PipelineConfig = serde_json::from_reader(File::open(path)?)?;
        info!(path = %path.display(), "配置加载完成");
        Ok(config)
    }

    /// 默认加载顺序: 环境变量指定的文件 → 默认配置
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            match Self::from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "配置文件加载失败,使用默认配置");
                }
            }
        }
        debug!("使用默认配置");
        Self::default()
    }
}

/// 默认输出目录: <用户数据目录>/supply-chain-analytics/extracted
fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("supply-chain-analytics")
        .join("extracted")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"shipment_workbook": "a.xlsx", "sales_workbook": "b.xlsx", "output_dir": "out", "force_refresh": true}}"#
        )
        .unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.shipment_workbook, PathBuf::from("a.xlsx"));
        assert!(config.force_refresh);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"shipment_workbook": "a.xlsx"}}"#).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.shipment_workbook, PathBuf::from("a.xlsx"));
        assert!(!config.force_refresh);
        assert_eq!(config.sales_workbook, PipelineConfig::default().sales_workbook);
    }
}
