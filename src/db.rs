// ==========================================
// 市场价格数据导入工具 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout
// - 幂等建表（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化基础数据 schema（8 张实体表 + 2 张价格事实表）
///
/// 约束设计：
/// - 实体表的自然键只建普通索引：软删除行不占用自然键，
///   同名实体在软删除后可重新创建
/// - 事实表的自然键建 UNIQUE 索引，供 ON CONFLICT upsert 使用
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- 组织（根组织 parent_id 指向自己）
        CREATE TABLE IF NOT EXISTS base_org (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            sort        INTEGER NOT NULL DEFAULT 0,
            parent_id   TEXT NOT NULL,
            description TEXT,
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_org_name ON base_org(name);

        -- 品类（按组织隔离）
        CREATE TABLE IF NOT EXISTS base_category (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            sort        INTEGER NOT NULL DEFAULT 0,
            org_id      TEXT NOT NULL REFERENCES base_org(id),
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_category_name_org ON base_category(name, org_id);

        -- 规格（全局）
        CREATE TABLE IF NOT EXISTS base_spec (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            sort        INTEGER NOT NULL DEFAULT 0,
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_spec_name ON base_spec(name);

        -- 单位（全局）
        CREATE TABLE IF NOT EXISTS base_unit (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            sort        INTEGER NOT NULL DEFAULT 0,
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_unit_name ON base_unit(name);

        -- 商品（自然键: name + spec + unit + org；category 仅创建时记录）
        CREATE TABLE IF NOT EXISTS base_goods (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            sort        INTEGER NOT NULL DEFAULT 0,
            spec_id     TEXT NOT NULL REFERENCES base_spec(id),
            unit_id     TEXT NOT NULL REFERENCES base_unit(id),
            category_id TEXT NOT NULL REFERENCES base_category(id),
            org_id      TEXT NOT NULL REFERENCES base_org(id),
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_goods_key ON base_goods(name, spec_id, unit_id, org_id);

        -- 市场（market_type: 1=发改委 2=超市 3=菜市场 4=汇总 5=其他）
        CREATE TABLE IF NOT EXISTS base_market (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            market_type INTEGER NOT NULL,
            org_id      TEXT NOT NULL REFERENCES base_org(id),
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_market_name_org ON base_market(name, org_id);

        -- 价格时期（period_type: 1=旬 2=月）
        CREATE TABLE IF NOT EXISTS base_price_period (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            start_date  TEXT NOT NULL,
            end_date    TEXT NOT NULL,
            period_type INTEGER NOT NULL,
            org_id      TEXT NOT NULL REFERENCES base_org(id),
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_period_name_org ON base_price_period(name, org_id);

        -- 供应商（float_ratio 为结算下浮比例，定点小数文本）
        CREATE TABLE IF NOT EXISTS supplier (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            code        TEXT NOT NULL,
            sort        INTEGER NOT NULL DEFAULT 0,
            status      INTEGER NOT NULL DEFAULT 1,
            description TEXT,
            float_ratio TEXT NOT NULL,
            org_id      TEXT NOT NULL REFERENCES base_org(id),
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_supplier_name_org ON supplier(name, org_id);

        -- 市场价格事实（price_type: 1=市场价 2=指导价 3=上月均价 4=本期均价）
        CREATE TABLE IF NOT EXISTS base_market_price (
            id          TEXT PRIMARY KEY,
            goods_id    TEXT NOT NULL REFERENCES base_goods(id),
            market_id   TEXT NOT NULL REFERENCES base_market(id),
            period_id   TEXT NOT NULL REFERENCES base_price_period(id),
            price       TEXT NOT NULL,
            price_type  INTEGER NOT NULL,
            org_id      TEXT NOT NULL REFERENCES base_org(id),
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS ux_market_price_key
            ON base_market_price(goods_id, market_id, period_id);

        -- 供应商结算价格事实（reference_price * float_ratio = 实际结算价）
        CREATE TABLE IF NOT EXISTS base_supplier_price (
            id              TEXT PRIMARY KEY,
            goods_id        TEXT NOT NULL REFERENCES base_goods(id),
            supplier_id     TEXT NOT NULL REFERENCES supplier(id),
            period_id       TEXT NOT NULL REFERENCES base_price_period(id),
            reference_price TEXT NOT NULL,
            float_ratio     TEXT NOT NULL,
            org_id          TEXT NOT NULL REFERENCES base_org(id),
            is_deleted      INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS ux_supplier_price_key
            ON base_supplier_price(goods_id, supplier_id, period_id);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重复建表不应报错
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND (name LIKE 'base_%' OR name = 'supplier')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(count >= 10, "应创建全部 10 张表, 实际 {}", count);
    }
}
