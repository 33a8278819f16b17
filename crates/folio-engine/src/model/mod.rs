pub mod ids;
pub mod record;

pub use ids::{ArticleId, BlockId};
pub use record::{ArticleDef, BlockRecord, Fields};
