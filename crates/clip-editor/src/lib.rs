//! Splitting a transcribed video into clips and editing their boundaries.

mod error;

pub mod clip;
pub mod config;
pub mod export;
pub mod field;
pub mod list;
pub mod locate;
pub mod media;
pub mod playback;
pub mod runtime;
pub mod session;
pub mod split;

pub use clip::{Clip, ClipField, LocateTarget, derive_title};
pub use config::EditorConfig;
pub use error::*;
pub use export::{SubmissionClip, build_submission, sanitize_filename};
pub use field::{TimeField, TimeFields};
pub use list::ClipList;
pub use locate::{LocateController, LocateState};
pub use media::{MediaEventKind, MediaSurface, TimeSource, TimeUpdateEvent};
pub use playback::{ClipPlayer, PlayPlan, plan_play};
pub use runtime::{EditorEvent, EditorRuntime, EventHub, SubscriptionId};
pub use session::{EditorSession, EditorSnapshot};
pub use split::{AlignmentDiagnostic, SplitContext, SplitOutcome, split};
