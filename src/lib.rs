#![forbid(unsafe_code)]

pub mod align;
pub mod clip;
pub mod encode;
pub mod error;
pub mod frame;
pub mod letterbox;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod title;

pub use align::AlignmentPlan;
pub use error::{SwingsyncError, SwingsyncResult};
pub use frame::RasterFrame;
pub use pipeline::{BuildOptions, MatchupRequest, MatchupVideo, build_matchup, render_matchup};
pub use source::{ClipInfo, ClipSource};
pub use store::{ClipStore, MemoryStore, NewMatchup, PitchClip, SwingClip};
pub use title::TitleCard;
