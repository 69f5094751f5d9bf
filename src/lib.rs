// ==========================================
// 市场价格数据导入工具 - 核心库
// ==========================================
// 职责: 将市场询价 Excel 归一化导入基础数据库
// 技术栈: Rust + SQLite
// 定位: 单次批处理导入器 (单线程/单写入者)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 分类器枚举
pub mod domain;

// 数据仓储层 - 实体归一与价格事实
pub mod repository;

// 导入层 - 表格解析/行映射/导入编排
pub mod importer;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MarketType, PeriodType, PriceType};

// 仓储层
pub use repository::{
    CodeRule, EntityDraft, EntityKind, EntityRepository, PriceFactRepository, RepositoryError,
    RepositoryResult,
};

// 导入层
pub use importer::{
    ExcelRowSource, ImportError, ImportPlan, ImportReport, ImportResult, InMemoryRowSource,
    MarketColumn, MarketRef, PriceImporter, RowIntent, RowMapper, RowRecord, RowSource,
    SheetLayout, SheetReport, SheetTask, SupplierSettlement,
};

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
