// ==========================================
// 市场价格数据导入工具 - 数据仓储层
// ==========================================
// 职责: 实体归一 (get-or-create) 与价格事实 upsert
// 红线: Repository 不含业务规则，只做数据访问
// ==========================================

// 模块声明
pub mod entity_repo;
pub mod error;
pub mod price_repo;

// 重导出核心类型
pub use entity_repo::{CodeRule, EntityDraft, EntityKind, EntityRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use price_repo::PriceFactRepository;
