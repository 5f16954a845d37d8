pub mod candidate;
pub mod contract;
pub mod recommendation;

pub use candidate::{
    FundCandidate, LongTermFundCandidate, LongTermStockCandidate, ScoredCandidate,
    ShortTermFundCandidate, ShortTermStockCandidate,
};
pub use recommendation::{
    BundleMetadata, FundPick, Horizon, HorizonRecommendation, Mode, RecommendationBundle,
    RecommendationSource, StockPick,
};
