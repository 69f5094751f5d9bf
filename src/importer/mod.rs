// ==========================================
// 市场价格数据导入工具 - 导入层
// ==========================================
// 职责: 外部表格数据 → 归一化基础数据
// 流程: 行源 → 行映射 → 实体归一 → 价格事实写入
// ==========================================

// 模块声明
pub mod error;
pub mod layout;
pub mod price_importer;
pub mod row_mapper;
pub mod sheet_source;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use layout::{MarketColumn, MarketRef, SheetLayout, SupplierSettlement};
pub use price_importer::{ImportPlan, ImportReport, PriceImporter, SheetReport, SheetTask};
pub use row_mapper::{MarketPriceIntent, RowIntent, RowMapper, RowRecord, SupplierPriceIntent};
pub use sheet_source::{ExcelRowSource, InMemoryRowSource, RowSource};
