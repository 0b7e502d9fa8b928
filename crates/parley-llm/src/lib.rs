pub mod scripted;
pub mod title;
pub mod traits;
pub mod types;

pub use scripted::ScriptedGenerator;
pub use title::{GeneratedTitleSuggester, HeuristicTitleSuggester, DEFAULT_TITLE_MAX_CHARS, UNTITLED};
pub use traits::{FragmentStream, GenerationRequest, ResponseGenerator, TitleSuggester};
pub use types::Message;
