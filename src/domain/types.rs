// ==========================================
// 市场价格数据导入工具 - 领域类型定义
// ==========================================
// 分类器以 INTEGER 编码入库，编码与原始数据字典一致
// 序列化格式: SCREAMING_SNAKE_CASE (用于外部布局 JSON)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 市场类型 (Market Type)
// ==========================================
// 1=发改委指导来源 2=超市 3=菜市场 4=汇总/派生 5=其他
// 第 5 类用于按列标签懒创建的合成市场（均价列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketType {
    OfficialGuided, // 发改委指导来源
    Supermarket,    // 超市
    WetMarket,      // 菜市场
    Aggregate,      // 汇总/派生
    Other,          // 其他（合成市场）
}

impl MarketType {
    /// 入库编码
    pub fn code(&self) -> i64 {
        match self {
            MarketType::OfficialGuided => 1,
            MarketType::Supermarket => 2,
            MarketType::WetMarket => 3,
            MarketType::Aggregate => 4,
            MarketType::Other => 5,
        }
    }

    /// 从入库编码还原
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(MarketType::OfficialGuided),
            2 => Some(MarketType::Supermarket),
            3 => Some(MarketType::WetMarket),
            4 => Some(MarketType::Aggregate),
            5 => Some(MarketType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 价格类型 (Price Type)
// ==========================================
// 1=市场价 2=指导价 3=上月均价 4=本期均价
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    Market,           // 市场价
    Guided,           // 指导价
    PriorPeriodAvg,   // 上月均价
    CurrentPeriodAvg, // 本期均价
}

impl PriceType {
    /// 入库编码
    pub fn code(&self) -> i64 {
        match self {
            PriceType::Market => 1,
            PriceType::Guided => 2,
            PriceType::PriorPeriodAvg => 3,
            PriceType::CurrentPeriodAvg => 4,
        }
    }

    /// 从入库编码还原
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PriceType::Market),
            2 => Some(PriceType::Guided),
            3 => Some(PriceType::PriorPeriodAvg),
            4 => Some(PriceType::CurrentPeriodAvg),
            _ => None,
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 时期类型 (Period Type)
// ==========================================
// 1=旬 2=月
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    TenDay, // 旬
    Month,  // 月
}

impl PeriodType {
    /// 入库编码
    pub fn code(&self) -> i64 {
        match self {
            PeriodType::TenDay => 1,
            PeriodType::Month => 2,
        }
    }

    /// 从入库编码还原
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PeriodType::TenDay),
            2 => Some(PeriodType::Month),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_type_codes_round_trip() {
        for mt in [
            MarketType::OfficialGuided,
            MarketType::Supermarket,
            MarketType::WetMarket,
            MarketType::Aggregate,
            MarketType::Other,
        ] {
            assert_eq!(MarketType::from_code(mt.code()), Some(mt));
        }
        assert_eq!(MarketType::Other.code(), 5);
        assert_eq!(MarketType::from_code(0), None);
    }

    #[test]
    fn test_price_type_codes() {
        assert_eq!(PriceType::Market.code(), 1);
        assert_eq!(PriceType::Guided.code(), 2);
        assert_eq!(PriceType::PriorPeriodAvg.code(), 3);
        assert_eq!(PriceType::CurrentPeriodAvg.code(), 4);
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&PriceType::CurrentPeriodAvg).unwrap();
        assert_eq!(json, "\"CURRENT_PERIOD_AVG\"");
        let mt: MarketType = serde_json::from_str("\"WET_MARKET\"").unwrap();
        assert_eq!(mt, MarketType::WetMarket);
    }
}
