pub mod augment;
pub mod google;

pub use augment::augment_captions;
pub use google::GoogleTranslateClient;

use crate::error::Result;
use async_trait::async_trait;

/// Cloud translation service: base-language text in, translated text out.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}
