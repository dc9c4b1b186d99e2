pub mod comment_feed;
pub mod feedback;
pub mod insights;
pub mod score_aggregator;

pub use comment_feed::*;
pub use feedback::*;
pub use insights::*;
pub use score_aggregator::*;
