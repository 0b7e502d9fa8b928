use std::sync::Arc;

use tokio::sync::RwLock;

use parley_types::{AppSettings, SettingsPatch};

/// Process-wide display settings, owned by the application state.
#[derive(Clone, Default)]
pub struct SettingsService {
    inner: Arc<RwLock<AppSettings>>,
}

impl SettingsService {
    pub fn new(initial: AppSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub async fn get(&self) -> AppSettings {
        *self.inner.read().await
    }

    /// Apply a partial update and return the resulting settings.
    pub async fn update(&self, patch: SettingsPatch) -> AppSettings {
        let mut settings = self.inner.write().await;
        settings.apply(patch);
        tracing::info!(
            show_thread_sidebar = settings.show_thread_sidebar,
            show_threads_tab = settings.show_threads_tab,
            "settings updated"
        );
        *settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_patch_leaves_missing_fields() {
        let service = SettingsService::new(AppSettings::default());
        let before = service.get().await;

        let after = service
            .update(SettingsPatch {
                show_thread_sidebar: Some(!before.show_thread_sidebar),
                ..Default::default()
            })
            .await;

        assert_eq!(after.show_thread_sidebar, !before.show_thread_sidebar);
        assert_eq!(after.show_threads_tab, before.show_threads_tab);
        assert_eq!(service.get().await, after);
    }
}
