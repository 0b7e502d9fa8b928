use serde::{Deserialize, Serialize};

/// User-facing layout toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub show_thread_sidebar: bool,
    pub show_threads_tab: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            show_thread_sidebar: true,
            show_threads_tab: true,
        }
    }
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub show_thread_sidebar: Option<bool>,
    #[serde(default)]
    pub show_threads_tab: Option<bool>,
}

impl AppSettings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(show) = patch.show_thread_sidebar {
            self.show_thread_sidebar = show;
        }
        if let Some(show) = patch.show_threads_tab {
            self.show_threads_tab = show;
        }
    }

    /// Whether any surface displays the thread list.
    pub fn listing_visible(&self) -> bool {
        self.show_thread_sidebar || self.show_threads_tab
    }
}
