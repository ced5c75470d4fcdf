/// All backend primary keys are integer identifiers.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary amounts are exact decimals.
pub type Money = rust_decimal::Decimal;
