use std::time::Duration;

use tracing::{debug, info};

use crate::error::{CaptionError, Result};
use crate::store::CaptionStore;
use crate::translate::Translator;

/// Fill in missing translations for every caption entry of a video.
///
/// Entries already carrying a translation for `language` are skipped, so
/// repeated calls cost nothing beyond the store scan and a retry after a
/// mid-run failure resumes where it stopped. Entries are translated
/// sequentially, one external call at a time.
///
/// The first failed external call aborts the run with `Translation`,
/// leaving translations memoized so far in place.
pub async fn augment_captions(
    store: &CaptionStore,
    video_url: &str,
    language: &str,
    translator: &dyn Translator,
    call_timeout: Duration,
) -> Result<usize> {
    let pending = store.untranslated_entries(video_url, language)?;

    if pending.is_empty() {
        debug!("All captions for {} already translated to {}", video_url, language);
        return Ok(0);
    }

    info!(
        "Translating {} captions to {} using {}",
        pending.len(),
        language,
        translator.name()
    );

    let mut translated = 0;
    for (index, text) in pending {
        let result = match tokio::time::timeout(call_timeout, translator.translate(&text, language))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(CaptionError::Api(format!(
                "Translation timed out after {}s",
                call_timeout.as_secs()
            ))),
        };

        match result {
            Ok(translation) => {
                store.set_translation(video_url, index, language, translation);
                translated += 1;
            }
            Err(e) => {
                return Err(CaptionError::Translation(format!(
                    "Failed at segment {index}: {e}"
                )));
            }
        }
    }

    info!("Translated {} captions to {}", translated, language);
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CaptionEntry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubTranslator {
        call_count: AtomicUsize,
        fail_on_text: Option<String>,
    }

    impl StubTranslator {
        fn new() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail_on_text: None,
            }
        }

        fn failing_on(text: &str) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail_on_text: Some(text.to_string()),
            }
        }
    }

    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_text.as_deref() == Some(text) {
                return Err(CaptionError::Api("Stub translation error".to_string()));
            }
            Ok(format!("{text}-{target_lang}"))
        }

        fn name(&self) -> &'static str {
            "Stub"
        }
    }

    fn store_with_entries(url: &str, texts: &[&str]) -> CaptionStore {
        let store = CaptionStore::new(8);
        store.begin_video(url).unwrap();
        store.finish_video(url);
        for (i, text) in texts.iter().enumerate() {
            store.insert_entry(url, i as u32, CaptionEntry::new(i as f64 * 10.0, *text));
        }
        store
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_augment_translates_every_entry() {
        let store = store_with_entries("v", &["hello", "world"]);
        let translator = StubTranslator::new();

        let translated = augment_captions(&store, "v", "fr", &translator, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(translated, 2);
        let captions = store.get_captions("v", 0.0, 100.0, Some("fr"));
        assert_eq!(captions[0].text, "hello-fr");
        assert_eq!(captions[1].text, "world-fr");
    }

    #[tokio::test]
    async fn test_augment_is_idempotent() {
        let store = store_with_entries("v", &["hello", "world"]);
        let translator = StubTranslator::new();

        augment_captions(&store, "v", "fr", &translator, TIMEOUT)
            .await
            .unwrap();
        let second = augment_captions(&store, "v", "fr", &translator, TIMEOUT)
            .await
            .unwrap();

        // The second pass found nothing to do and made no external calls.
        assert_eq!(second, 0);
        assert_eq!(translator.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_augment_unknown_video() {
        let store = CaptionStore::new(8);
        let translator = StubTranslator::new();

        let err = augment_captions(&store, "nope", "fr", &translator, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::NotFound(_)));
        assert_eq!(translator.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_aborts_but_keeps_memoized_state() {
        let store = store_with_entries("v", &["hello", "boom", "end"]);
        let translator = StubTranslator::failing_on("boom");

        let err = augment_captions(&store, "v", "fr", &translator, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::Translation(_)));

        // "hello" stayed translated; the retry only re-attempts the rest.
        let retry = StubTranslator::new();
        let translated = augment_captions(&store, "v", "fr", &retry, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(translated, 2);
        assert_eq!(retry.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_languages_are_independent() {
        let store = store_with_entries("v", &["hello"]);
        let translator = StubTranslator::new();

        augment_captions(&store, "v", "fr", &translator, TIMEOUT)
            .await
            .unwrap();
        augment_captions(&store, "v", "es", &translator, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(
            store.get_captions("v", 0.0, 10.0, Some("fr"))[0].text,
            "hello-fr"
        );
        assert_eq!(
            store.get_captions("v", 0.0, 10.0, Some("es"))[0].text,
            "hello-es"
        );
    }
}
