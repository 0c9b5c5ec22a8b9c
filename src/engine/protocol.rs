use std::path::PathBuf;

use crate::engine::image_loader::DecodedImage;
use crate::model::story_view::StoryView;

/// Sent from the UI to the engine thread.
pub enum EngineCommand {
    SubmitProfile { username: String, api_key: String },
    DeleteProfile,
    Begin,
    /// Index into the choices of the current beat.
    Choose(usize),
    Retry,
    Restart,
    ExportStory(PathBuf),
}

/// Sent from the engine thread back to the UI. Image results come from
/// the image worker over the same channel.
pub enum EngineResponse {
    /// Startup result: the stored username, if a usable profile exists.
    ProfileLoaded(Option<String>),
    ProfileSaved(String),
    ProfileRejected(String),
    ProfileCleared,

    Story(StoryView),

    Exported(PathBuf),
    ExportFailed(String),

    Image { url: String, image: DecodedImage },
    ImageFailed { url: String, reason: String },
}
