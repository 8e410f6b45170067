// Popup controller
// One async handler per user action. Each handler reads the view through a
// ViewHandle, awaits its storage/messaging/clipboard calls in order and
// leaves the view consistent on every path.

use std::rc::Rc;

use crate::config::PopupConfig;
use crate::popup_state::*;
use crate::services::clipboard::Clipboard;
use crate::services::messaging::{Delivery, MessageChannel, RefineRequest};
use crate::services::storage::TieredStorage;
use crate::services::timer::Delay;

#[derive(Clone)]
pub struct PopupController {
    config: Rc<PopupConfig>,
    storage: TieredStorage,
    channel: Rc<dyn MessageChannel>,
    clipboard: Rc<dyn Clipboard>,
    delay: Rc<dyn Delay>,
}

impl PopupController {
    pub fn new(
        config: PopupConfig,
        storage: TieredStorage,
        channel: Rc<dyn MessageChannel>,
        clipboard: Rc<dyn Clipboard>,
        delay: Rc<dyn Delay>,
    ) -> Self {
        Self {
            config: Rc::new(config),
            storage,
            channel,
            clipboard,
            delay,
        }
    }

    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    async fn stored_api_key(&self) -> Option<String> {
        self.storage.get_string(&self.config.storage_key).await
    }

    /// Trimmed key, or the message explaining why it was rejected
    pub fn validate_api_key(&self, raw: &str) -> Result<String, String> {
        let api_key = raw.trim();
        if api_key.is_empty() {
            return Err(MSG_EMPTY_KEY.to_string());
        }
        if !api_key.starts_with(&self.config.credential_prefix) {
            return Err(bad_key_format(&self.config.credential_prefix));
        }
        Ok(api_key.to_string())
    }

    /// Popup opened: Ready when a key is stored, Setup otherwise
    pub async fn load(&self, view: &mut impl ViewHandle) {
        log::info!("Checking for existing API key...");
        let panel = match self.stored_api_key().await {
            Some(_) => {
                log::info!("API key found, switching to refine panel");
                Panel::Ready
            }
            None => {
                log::info!("No API key found, showing setup panel");
                Panel::Setup
            }
        };
        view.update(|v| v.show_panel(panel));
    }

    pub async fn save_api_key(&self, view: &mut impl ViewHandle) {
        let input = view.snapshot().api_key_input;
        let api_key = match self.validate_api_key(&input) {
            Ok(key) => key,
            Err(message) => {
                view.update(|v| v.report_status(StatusTone::Error, message));
                return;
            }
        };

        self.storage
            .set(&self.config.storage_key, api_key.as_str())
            .await;

        // Read back: a write no tier accepted still completes silently
        let verified = self.stored_api_key().await;
        if verified.as_deref() != Some(api_key.as_str()) {
            log::error!(
                "API key save verification failed (read back {})",
                if verified.is_some() { "a different value" } else { "nothing" }
            );
            view.update(|v| v.report_status(StatusTone::Error, MSG_KEY_UNVERIFIED));
            return;
        }

        log::info!("API key save verified successfully");
        view.update(|v| v.report_status(StatusTone::Success, MSG_KEY_SAVED));
        self.delay.sleep(self.config.save_confirmation).await;
        view.update(|v| v.show_panel(Panel::Ready));
    }

    pub async fn refine(&self, view: &mut impl ViewHandle) {
        let snapshot = view.snapshot();
        if snapshot.busy {
            log::debug!("Refinement already in flight, ignoring");
            return;
        }

        let text = snapshot.input_text.trim().to_string();
        if text.is_empty() {
            view.update(|v| v.reject_input(MSG_EMPTY_TEXT));
            return;
        }

        view.update(PopupView::begin_refine);

        let Some(api_key) = self.stored_api_key().await else {
            view.update(|v| v.finish_refine(Err(MSG_KEY_MISSING.to_string())));
            return;
        };

        let request = RefineRequest::new(text, api_key);
        let outcome = match self.channel.send(&request).await {
            Ok(delivery) => interpret_delivery(delivery),
            Err(e) => {
                log::error!("Error during refinement: {}", e);
                Err(MSG_UNEXPECTED.to_string())
            }
        };

        if let Err(message) = &outcome {
            log::warn!("Refinement failed: {}", message);
        }
        view.update(|v| v.finish_refine(outcome));
    }

    pub async fn copy_result(&self, view: &mut impl ViewHandle) {
        let text = view.snapshot().result.unwrap_or_default();

        match self.clipboard.write_text(&text).await {
            Ok(()) => {
                view.update(PopupView::mark_copied);
                self.delay.sleep(self.config.copy_feedback).await;
                view.update(PopupView::reset_copy_label);
            }
            Err(e) => {
                log::warn!("Clipboard write failed: {}", e);
                view.update(|v| v.show_error(MSG_COPY_FAILED));
            }
        }
    }

    /// Back to Setup with the stored key pre-filled
    pub async fn show_settings(&self, view: &mut impl ViewHandle) {
        view.update(PopupView::open_settings);

        match self.stored_api_key().await {
            Some(api_key) => view.update(|v| v.prefill_api_key(api_key)),
            None => log::debug!("No stored API key to pre-fill"),
        }
    }
}

/// Text to render, or the error line to show
///
/// Error precedence: the worker's own message, then the runtime's, then a
/// generic connectivity hint.
pub fn interpret_delivery(delivery: Delivery) -> Result<String, String> {
    match delivery.response {
        Some(response) if response.success => Ok(response.refined_text.unwrap_or_default()),
        response => {
            if let Some(error) = response.and_then(|r| r.error).filter(|e| !e.is_empty()) {
                Err(format!("Error: {}", error))
            } else if let Some(message) = delivery.last_error {
                Err(format!("Runtime error: {}", message))
            } else {
                Err(MSG_NO_CONNECTION.to_string())
            }
        }
    }
}
