// ==========================================
// 市场价格数据导入工具 - 行映射器
// ==========================================
// 职责: 把一条表格记录翻译成结构化意图
//       （需要归一哪些实体、写入哪些价格事实）
// 约定:
// - 商品名缺失/空白 → 整行静默跳过（不算错误）
// - 价格单元格空白 → 静默跳过该值
// - 价格存在但不可解析 → warn 记录并跳过该值，行继续
// ==========================================

use crate::domain::types::PriceType;
use crate::importer::layout::{MarketRef, SheetLayout};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// 一条表格记录: 表头列标签 → 单元格文本
pub type RowRecord = HashMap<String, String>;

// ==========================================
// 映射意图
// ==========================================

/// 一条市场价格写入意图
#[derive(Debug, Clone)]
pub struct MarketPriceIntent {
    /// 来源列标签（market 为 None 时用作合成市场名）
    pub column_label: String,
    pub market: Option<MarketRef>,
    pub price_type: PriceType,
    pub price: Decimal,
}

/// 一条供应商结算价写入意图
#[derive(Debug, Clone)]
pub struct SupplierPriceIntent {
    pub supplier_name: String,
    pub float_ratio: Decimal,
    /// 参考价 = 本期均价列的值
    pub reference_price: Decimal,
}

/// 一行的完整映射结果
#[derive(Debug, Clone)]
pub struct RowIntent {
    pub goods_name: String,
    pub spec_name: String,
    pub unit_name: String,
    pub market_prices: Vec<MarketPriceIntent>,
    pub supplier_prices: Vec<SupplierPriceIntent>,
    /// 本行产生的价格格式警告数
    pub value_warnings: usize,
}

// ==========================================
// RowMapper - 行映射器
// ==========================================

/// 行映射器
/// 职责: 按布局配置把 RowRecord 翻译为 RowIntent，不做任何持久化
pub struct RowMapper {
    layout: SheetLayout,
}

impl RowMapper {
    pub fn new(layout: SheetLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// 映射一行
    ///
    /// # 返回
    /// - None: 商品名缺失/空白，整行跳过
    /// - Some(RowIntent): 待执行的归一与写入意图
    pub fn map_row(&self, record: &RowRecord, row_no: usize) -> Option<RowIntent> {
        let goods_name = non_blank(record, &self.layout.goods_column)?;

        let spec_name =
            non_blank(record, &self.layout.spec_column).unwrap_or_else(|| self.layout.default_spec.clone());
        let unit_name =
            non_blank(record, &self.layout.unit_column).unwrap_or_else(|| self.layout.default_unit.clone());

        let mut intent = RowIntent {
            goods_name,
            spec_name,
            unit_name,
            market_prices: Vec::new(),
            supplier_prices: Vec::new(),
            value_warnings: 0,
        };

        for column in &self.layout.market_columns {
            let Some(raw) = non_blank(record, &column.label) else {
                continue;
            };

            let price = match raw.parse::<Decimal>() {
                Ok(price) => price,
                Err(_) => {
                    tracing::warn!("第 {} 行: {} 价格格式错误: {}", row_no, column.label, raw);
                    intent.value_warnings += 1;
                    continue;
                }
            };

            intent.market_prices.push(MarketPriceIntent {
                column_label: column.label.clone(),
                market: column.market.clone(),
                price_type: column.price_type,
                price,
            });

            // 供应商结算价由本期均价列无条件派生:
            // 每个配置的供应商拿相同参考价、各自的下浮比例
            if column.price_type == PriceType::CurrentPeriodAvg {
                for supplier in &self.layout.suppliers {
                    intent.supplier_prices.push(SupplierPriceIntent {
                        supplier_name: supplier.name.clone(),
                        float_ratio: supplier.float_ratio,
                        reference_price: price,
                    });
                }
            }
        }

        Some(intent)
    }
}

/// 取指定列的非空白单元格文本（trim 后）
fn non_blank(record: &RowRecord, column: &str) -> Option<String> {
    let value = record.get(column)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
