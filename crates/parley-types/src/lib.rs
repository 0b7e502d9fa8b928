pub mod config;
pub mod events;
pub mod listing;
pub mod settings;
pub mod status;
pub mod transcript;
pub mod update;

pub use config::{PipelineConfig, SessionPolicy};
pub use events::{PipelineEvent, Stage};
pub use listing::ThreadListing;
pub use settings::{AppSettings, SettingsPatch};
pub use transcript::{Transcript, Turn};
pub use update::{UiUpdate, Update};
