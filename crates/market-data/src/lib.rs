pub mod crypto;
pub mod fundamentals;
pub mod polygon;
pub mod substrate;
pub mod technical;

pub use crypto::{fetch_crypto_record, is_crypto_symbol, CryptoRecord};
pub use fundamentals::{FundamentalsCollector, FundamentalsRecord, PriceTargetConfidence, PriceTargets};
pub use polygon::PolygonClient;
pub use substrate::{Cache, CircuitBreaker, CircuitState};
pub use technical::{IndicatorsRecord, TechnicalCollector};
