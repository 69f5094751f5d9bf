// ==========================================
// 市场价格数据导入工具 - 表格布局配置
// ==========================================
// 职责: 列标签 → (市场, 价格类型) 的有序映射，
//       以及供应商结算配置与字段默认值
// 来源: 内置默认布局，或通过 --layout 提供 JSON 外部布局
// ==========================================

use crate::domain::types::{MarketType, PriceType};
use crate::importer::error::ImportResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// ==========================================
// MarketRef - 布局中的具名市场
// ==========================================

/// 价格列关联的具名市场（market_type 仅在首次创建该市场时生效）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRef {
    pub name: String,
    pub market_type: MarketType,
}

// ==========================================
// MarketColumn - 价格列
// ==========================================

/// 一个价格列的映射
///
/// market 为 None 的列是汇总列（如均价列）：
/// 价格仍写入市场价格事实，但挂在按列标签懒创建的
/// 合成市场（market_type = 5 其他）上，保持事实表结构统一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketColumn {
    /// 表头列标签（精确匹配）
    pub label: String,
    #[serde(default)]
    pub market: Option<MarketRef>,
    pub price_type: PriceType,
}

// ==========================================
// SupplierSettlement - 供应商结算配置
// ==========================================

/// 供应商结算配置
///
/// 结算价建模为"本期均价 × 下浮比例"：每个供应商拿到
/// 相同的参考价（本期均价列的值）和各自的 float_ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSettlement {
    pub name: String,
    /// 下浮比例（如 0.88 = 下浮 12%）
    pub float_ratio: Decimal,
}

// ==========================================
// SheetLayout - 工作表布局
// ==========================================

/// 工作表布局：固定语义列 + 有序价格列 + 供应商结算配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// 商品名称列（必填，缺失/空白整行跳过）
    #[serde(default = "default_goods_column")]
    pub goods_column: String,
    /// 规格列
    #[serde(default = "default_spec_column")]
    pub spec_column: String,
    /// 规格缺失时的默认值
    #[serde(default = "default_spec")]
    pub default_spec: String,
    /// 单位列
    #[serde(default = "default_unit_column")]
    pub unit_column: String,
    /// 单位缺失时的默认值
    #[serde(default = "default_unit")]
    pub default_unit: String,
    /// 有序价格列
    pub market_columns: Vec<MarketColumn>,
    /// 供应商结算配置（参考价取本期均价列）
    #[serde(default)]
    pub suppliers: Vec<SupplierSettlement>,
    /// 结算价展示列（源表存在但写入路径不读取，保留供展示用）
    #[serde(default)]
    pub settlement_columns: Vec<String>,
}

fn default_goods_column() -> String {
    "品名".to_string()
}

fn default_spec_column() -> String {
    "规格标准".to_string()
}

fn default_spec() -> String {
    "新鲜".to_string()
}

fn default_unit_column() -> String {
    "单位".to_string()
}

fn default_unit() -> String {
    "斤".to_string()
}

impl SheetLayout {
    /// 内置默认布局（与原始询价表一致）
    pub fn standard() -> Self {
        Self {
            goods_column: default_goods_column(),
            spec_column: default_spec_column(),
            default_spec: default_spec(),
            unit_column: default_unit_column(),
            default_unit: default_unit(),
            market_columns: vec![
                MarketColumn {
                    label: "发改委指导价".to_string(),
                    market: Some(MarketRef {
                        name: "发改委".to_string(),
                        market_type: MarketType::OfficialGuided,
                    }),
                    price_type: PriceType::Guided,
                },
                MarketColumn {
                    label: "富万家超市".to_string(),
                    market: Some(MarketRef {
                        name: "富万家超市".to_string(),
                        market_type: MarketType::Supermarket,
                    }),
                    price_type: PriceType::Market,
                },
                MarketColumn {
                    label: "育英巷菜市场".to_string(),
                    market: Some(MarketRef {
                        name: "育英巷菜市场".to_string(),
                        market_type: MarketType::WetMarket,
                    }),
                    price_type: PriceType::Market,
                },
                MarketColumn {
                    label: "大润发".to_string(),
                    market: Some(MarketRef {
                        name: "大润发".to_string(),
                        market_type: MarketType::Supermarket,
                    }),
                    price_type: PriceType::Market,
                },
                MarketColumn {
                    label: "上月均价".to_string(),
                    market: None,
                    price_type: PriceType::PriorPeriodAvg,
                },
                MarketColumn {
                    label: "本期均价".to_string(),
                    market: None,
                    price_type: PriceType::CurrentPeriodAvg,
                },
            ],
            suppliers: vec![
                SupplierSettlement {
                    name: "胡埗".to_string(),
                    float_ratio: Decimal::new(88, 2), // 下浮12%
                },
                SupplierSettlement {
                    name: "黄海".to_string(),
                    float_ratio: Decimal::new(86, 2), // 下浮14%
                },
            ],
            settlement_columns: vec![
                "胡埗本期结算价(下浮12%)".to_string(),
                "黄海本期结算价(下浮14%)".to_string(),
            ],
        }
    }

    /// 从 JSON 文件加载外部布局
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let file = File::open(path.as_ref())?;
        let layout: SheetLayout = serde_json::from_reader(BufReader::new(file))?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_columns() {
        let layout = SheetLayout::standard();
        let labels: Vec<&str> = layout
            .market_columns
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["发改委指导价", "富万家超市", "育英巷菜市场", "大润发", "上月均价", "本期均价"]
        );

        // 汇总列不关联具名市场
        assert!(layout.market_columns[4].market.is_none());
        assert!(layout.market_columns[5].market.is_none());
        assert_eq!(layout.market_columns[5].price_type, PriceType::CurrentPeriodAvg);

        // 指导价列类型
        let guide = &layout.market_columns[0];
        assert_eq!(guide.price_type, PriceType::Guided);
        assert_eq!(
            guide.market.as_ref().unwrap().market_type,
            MarketType::OfficialGuided
        );
    }

    #[test]
    fn test_standard_layout_suppliers() {
        let layout = SheetLayout::standard();
        assert_eq!(layout.suppliers.len(), 2);
        assert_eq!(layout.suppliers[0].float_ratio, Decimal::new(88, 2));
        assert_eq!(layout.suppliers[1].float_ratio, Decimal::new(86, 2));
        // 结算价列保留但不参与写入
        assert_eq!(layout.settlement_columns.len(), 2);
    }

    #[test]
    fn test_layout_from_json() {
        let json = r#"
        {
            "market_columns": [
                {
                    "label": "农贸市场",
                    "market": { "name": "农贸市场", "market_type": "WET_MARKET" },
                    "price_type": "MARKET"
                },
                { "label": "本期均价", "price_type": "CURRENT_PERIOD_AVG" }
            ],
            "suppliers": [
                { "name": "供应商A", "float_ratio": "0.90" }
            ]
        }
        "#;
        let layout: SheetLayout = serde_json::from_str(json).unwrap();
        // 未指定的字段取默认值
        assert_eq!(layout.goods_column, "品名");
        assert_eq!(layout.default_spec, "新鲜");
        assert_eq!(layout.default_unit, "斤");
        assert_eq!(layout.market_columns.len(), 2);
        assert!(layout.market_columns[1].market.is_none());
        assert_eq!(layout.suppliers[0].float_ratio, Decimal::new(90, 2));
        assert!(layout.settlement_columns.is_empty());
    }
}
