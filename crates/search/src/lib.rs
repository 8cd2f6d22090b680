pub mod beam;
pub mod export;
pub mod path;
pub mod rank;

pub use beam::{BeamSearchEngine, ScoreWeights, SearchParams};
pub use export::{build_export, save_paths, save_summary, write_summary, PathExportDocument};
pub use path::{pattern_of, Path, PathEdge};
pub use rank::{rank_sentences, RankedSentence, RankingMethod};
