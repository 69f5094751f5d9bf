// ==========================================
// 市场价格数据导入工具 - 价格事实仓储
// ==========================================
// 职责: 市场价格 / 供应商结算价的幂等 upsert
// 约定:
// - 每次写入都生成新 id，但以自然键 UNIQUE 索引做冲突判定
// - 冲突时只覆盖价格类字段并刷新 updated_at，
//   既有 id / created_at /（市场价的）price_type 保持首次写入值
// - 价格为定点小数（rust_decimal::Decimal），以 TEXT 入库，
//   禁止二进制浮点，避免重复导入间的舍入漂移
// ==========================================

use crate::domain::types::PriceType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// PriceFactRepository - 价格事实仓储
// ==========================================

/// 价格事实仓储
/// 职责: 管理 base_market_price / base_supplier_price 两张事实表
pub struct PriceFactRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PriceFactRepository {
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

    /// 市场价格 upsert
    ///
    /// 自然键: (goods_id, market_id, period_id)
    /// 冲突时覆盖 price 并刷新 updated_at
    pub fn upsert_market_price(
        &self,
        goods_id: &str,
        market_id: &str,
        period_id: &str,
        price: Decimal,
        price_type: PriceType,
        org_id: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO base_market_price
                (id, goods_id, market_id, period_id, price, price_type, org_id,
                 is_deleted, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
            ON CONFLICT(goods_id, market_id, period_id) DO UPDATE SET
                price = excluded.price,
                updated_at = excluded.updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                goods_id,
                market_id,
                period_id,
                price.to_string(),
                price_type.code(),
                org_id,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 供应商结算价 upsert
    ///
    /// 自然键: (goods_id, supplier_id, period_id)
    /// 冲突时覆盖 reference_price / float_ratio 并刷新 updated_at
    pub fn upsert_supplier_price(
        &self,
        goods_id: &str,
        supplier_id: &str,
        period_id: &str,
        reference_price: Decimal,
        float_ratio: Decimal,
        org_id: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO base_supplier_price
                (id, goods_id, supplier_id, period_id, reference_price, float_ratio,
                 org_id, is_deleted, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
            ON CONFLICT(goods_id, supplier_id, period_id) DO UPDATE SET
                reference_price = excluded.reference_price,
                float_ratio = excluded.float_ratio,
                updated_at = excluded.updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                goods_id,
                supplier_id,
                period_id,
                reference_price.to_string(),
                float_ratio.to_string(),
                org_id,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
