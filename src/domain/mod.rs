// ==========================================
// 市场价格数据导入工具 - 领域层
// ==========================================
// 职责: 分类器枚举与领域常量
// ==========================================

pub mod types;

pub use types::{MarketType, PeriodType, PriceType};
