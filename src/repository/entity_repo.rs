// ==========================================
// 市场价格数据导入工具 - 实体归一仓储
// ==========================================
// 职责: 八类基础实体的 get-or-create（按自然键归一）
// 约定:
// - 查找只看 is_deleted = 0 的行，软删除行不阻止同键重建
// - 命中时直接返回既有 id，创建期属性不回写（首次写入生效）
// - 未命中时生成 UUIDv4 + 派生 code 后插入，单语句自动提交
// ==========================================

use crate::domain::types::{MarketType, PeriodType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// EntityKind - 实体种类
// ==========================================

/// 实体种类（每类对应一张基础表）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Organization,
    Category,
    Spec,
    Unit,
    Goods,
    Market,
    PricePeriod,
    Supplier,
}

impl EntityKind {
    /// 对应的表名
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Organization => "base_org",
            EntityKind::Category => "base_category",
            EntityKind::Spec => "base_spec",
            EntityKind::Unit => "base_unit",
            EntityKind::Goods => "base_goods",
            EntityKind::Market => "base_market",
            EntityKind::PricePeriod => "base_price_period",
            EntityKind::Supplier => "supplier",
        }
    }

    /// 日志用中文名称
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Organization => "组织",
            EntityKind::Category => "品类",
            EntityKind::Spec => "规格",
            EntityKind::Unit => "单位",
            EntityKind::Goods => "商品",
            EntityKind::Market => "市场",
            EntityKind::PricePeriod => "价格时期",
            EntityKind::Supplier => "供应商",
        }
    }
}

// ==========================================
// CodeRule - 可读编码派生规则
// ==========================================

/// 创建实体时人类可读编码的派生规则
#[derive(Debug, Clone)]
pub enum CodeRule {
    /// 名称大写（组织）
    UppercasedName,
    /// 固定前缀 + 名称（CAT_/SPEC_/UNIT_/MKT_/SUP_）
    Prefixed(&'static str),
    /// 前缀 + 名称 + 创建时间戳，降低同名撞码概率（商品）
    NameWithTimestamp(&'static str),
    /// 字面值（价格时期用开始日期作为编码）
    Literal(String),
}

impl CodeRule {
    /// 按规则派生编码
    pub fn derive(&self, name: &str, now: DateTime<Utc>) -> String {
        match self {
            CodeRule::UppercasedName => name.to_uppercase(),
            CodeRule::Prefixed(prefix) => format!("{}{}", prefix, name),
            CodeRule::NameWithTimestamp(prefix) => {
                format!("{}{}_{}", prefix, name, now.format("%Y%m%d%H%M%S"))
            }
            CodeRule::Literal(code) => code.clone(),
        }
    }
}

// ==========================================
// EntityDraft - 实体归一请求
// ==========================================

/// 一次 get-or-create 的完整描述
///
/// - key_columns: name 之外的自然键列（查找 + 创建均使用）
/// - creation_columns: 仅创建时写入的列（命中时不回写）
#[derive(Debug, Clone)]
pub struct EntityDraft {
    pub kind: EntityKind,
    pub name: String,
    key_columns: Vec<(&'static str, String)>,
    creation_columns: Vec<(&'static str, String)>,
    code_rule: CodeRule,
    /// 组织特例: 根组织 parent_id 指向自身
    self_parent: bool,
}

impl EntityDraft {
    /// 组织（根组织，parent_id 指向自己）
    pub fn organization(name: &str) -> Self {
        Self {
            kind: EntityKind::Organization,
            name: name.to_string(),
            key_columns: vec![],
            creation_columns: vec![
                ("sort", "0".to_string()),
                ("description", format!("{}组织", name)),
            ],
            code_rule: CodeRule::UppercasedName,
            self_parent: true,
        }
    }

    /// 品类（按组织隔离）
    pub fn category(name: &str, org_id: &str) -> Self {
        Self {
            kind: EntityKind::Category,
            name: name.to_string(),
            key_columns: vec![("org_id", org_id.to_string())],
            creation_columns: vec![("sort", "0".to_string())],
            code_rule: CodeRule::Prefixed("CAT_"),
            self_parent: false,
        }
    }

    /// 规格（全局）
    pub fn spec(name: &str) -> Self {
        Self {
            kind: EntityKind::Spec,
            name: name.to_string(),
            key_columns: vec![],
            creation_columns: vec![("sort", "0".to_string())],
            code_rule: CodeRule::Prefixed("SPEC_"),
            self_parent: false,
        }
    }

    /// 单位（全局）
    pub fn unit(name: &str) -> Self {
        Self {
            kind: EntityKind::Unit,
            name: name.to_string(),
            key_columns: vec![],
            creation_columns: vec![("sort", "0".to_string())],
            code_rule: CodeRule::Prefixed("UNIT_"),
            self_parent: false,
        }
    }

    /// 商品（自然键: name + spec + unit + org；category 仅创建时记录）
    pub fn goods(
        name: &str,
        spec_id: &str,
        unit_id: &str,
        category_id: &str,
        org_id: &str,
    ) -> Self {
        Self {
            kind: EntityKind::Goods,
            name: name.to_string(),
            key_columns: vec![
                ("spec_id", spec_id.to_string()),
                ("unit_id", unit_id.to_string()),
                ("org_id", org_id.to_string()),
            ],
            creation_columns: vec![
                ("sort", "0".to_string()),
                ("category_id", category_id.to_string()),
            ],
            code_rule: CodeRule::NameWithTimestamp("SKU_"),
            self_parent: false,
        }
    }

    /// 市场（market_type 仅创建时写入）
    pub fn market(name: &str, market_type: MarketType, org_id: &str) -> Self {
        Self {
            kind: EntityKind::Market,
            name: name.to_string(),
            key_columns: vec![("org_id", org_id.to_string())],
            creation_columns: vec![("market_type", market_type.code().to_string())],
            code_rule: CodeRule::Prefixed("MKT_"),
            self_parent: false,
        }
    }

    /// 价格时期（code 取开始日期）
    pub fn price_period(
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        period_type: PeriodType,
        org_id: &str,
    ) -> Self {
        let start = start_date.format("%Y-%m-%d").to_string();
        Self {
            kind: EntityKind::PricePeriod,
            name: name.to_string(),
            key_columns: vec![("org_id", org_id.to_string())],
            creation_columns: vec![
                ("start_date", start.clone()),
                ("end_date", end_date.format("%Y-%m-%d").to_string()),
                ("period_type", period_type.code().to_string()),
            ],
            code_rule: CodeRule::Literal(start),
            self_parent: false,
        }
    }

    /// 供应商（float_ratio 仅创建时写入）
    pub fn supplier(name: &str, float_ratio: Decimal, org_id: &str) -> Self {
        Self {
            kind: EntityKind::Supplier,
            name: name.to_string(),
            key_columns: vec![("org_id", org_id.to_string())],
            creation_columns: vec![
                ("sort", "0".to_string()),
                ("status", "1".to_string()),
                ("description", format!("{}供应商", name)),
                ("float_ratio", float_ratio.to_string()),
            ],
            code_rule: CodeRule::Prefixed("SUP_"),
            self_parent: false,
        }
    }
}

// ==========================================
// EntityRepository - 实体归一仓储
// ==========================================

/// 实体归一仓储
/// 职责: 统一的按自然键 get-or-create
pub struct EntityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EntityRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按自然键查找非删除行，未命中则创建并返回新 id
    ///
    /// # 返回
    /// - Ok(String): 既有或新建实体的 id
    /// - Err: 查询/插入失败（调用方应中止当前行的后续处理）
    pub fn resolve_or_create(&self, draft: &EntityDraft) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        // 查找: name + 附加自然键列, 限定 is_deleted = 0
        let mut sql = format!(
            "SELECT id FROM {} WHERE name = ?1 AND is_deleted = 0",
            draft.kind.table()
        );
        let mut values: Vec<String> = vec![draft.name.clone()];
        for (col, val) in &draft.key_columns {
            values.push(val.clone());
            sql.push_str(&format!(" AND {} = ?{}", col, values.len()));
        }

        let existing: Option<String> = conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        // 创建: 生成 id + 派生 code, 单语句自动提交
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let mut columns: Vec<(&'static str, String)> = vec![
            ("id", id.clone()),
            ("name", draft.name.clone()),
            ("code", draft.code_rule.derive(&draft.name, now)),
        ];
        columns.extend(draft.key_columns.iter().cloned());
        columns.extend(draft.creation_columns.iter().cloned());
        if draft.self_parent {
            columns.push(("parent_id", id.clone()));
        }
        columns.push(("is_deleted", "0".to_string()));
        columns.push(("created_at", now_str.clone()));
        columns.push(("updated_at", now_str));

        let col_names: Vec<&str> = columns.iter().map(|(c, _)| *c).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            draft.kind.table(),
            col_names.join(", "),
            placeholders.join(", ")
        );

        conn.execute(
            &insert_sql,
            params_from_iter(columns.iter().map(|(_, v)| v)),
        )?;

        tracing::info!("创建{}: {} (id={})", draft.kind.label(), draft.name, id);
        Ok(id)
    }
}
