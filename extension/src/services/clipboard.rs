use async_trait::async_trait;

use crate::error::ClipboardError;

#[async_trait(?Send)]
pub trait Clipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}
