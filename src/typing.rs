use std::time::Duration;

use tokio::sync::mpsc;

/// Updates emitted by a reveal task while it types an answer into the
/// conversation. `Partial` carries the full text revealed so far, trimmed,
/// ready to overwrite the target message wholesale.
#[derive(Debug, Clone)]
pub enum TypingEvent {
    Partial { index: usize, text: String },
    Done,
}

/// Pause after revealing one word: longer words pause slightly longer,
/// capped at 50ms so long tokens never stall the reveal.
pub fn word_delay(word: &str) -> Duration {
    let len = word.chars().count() as u64;
    Duration::from_millis((20 + 2 * len).min(50))
}

/// Reveal `text` word by word into the message at `index`, sending one
/// trimmed snapshot per word over `tx` and sleeping `word_delay` between
/// them. Splits on single spaces, not general whitespace, so newlines and
/// runs of spaces inside the answer survive reconstruction exactly.
///
/// Runs to completion unconditionally; there is no cancellation path. An
/// empty string produces a single empty snapshot and terminates.
pub async fn reveal_words(text: String, index: usize, tx: mpsc::Sender<TypingEvent>) {
    let mut revealed = String::new();

    for word in text.split(' ') {
        revealed.push_str(word);
        revealed.push(' ');

        let snapshot = revealed.trim().to_string();
        if tx
            .send(TypingEvent::Partial { index, text: snapshot })
            .await
            .is_err()
        {
            // Receiver gone; the session is being torn down.
            tracing::debug!("typing receiver dropped, abandoning reveal");
            return;
        }

        tokio::time::sleep(word_delay(word)).await;
    }

    let _ = tx.send(TypingEvent::Done).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect_partials(text: &str) -> Vec<String> {
        let (tx, mut rx) = mpsc::channel(64);
        let task = tokio::spawn(reveal_words(text.to_string(), 0, tx));

        let mut partials = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                TypingEvent::Partial { text, .. } => partials.push(text),
                TypingEvent::Done => break,
            }
        }
        task.await.unwrap();
        partials
    }

    #[test]
    fn delay_grows_with_word_length_up_to_cap() {
        assert_eq!(word_delay("a"), Duration::from_millis(22));
        assert_eq!(word_delay("fourteen-chars"), Duration::from_millis(48));
        assert_eq!(word_delay("fifteen-letters"), Duration::from_millis(50));
        assert_eq!(word_delay("a-very-long-hyphenated-token"), Duration::from_millis(50));
        assert_eq!(word_delay(""), Duration::from_millis(20));
    }

    #[tokio::test]
    async fn partials_are_prefixes_and_reconstruct_the_answer() {
        let text = "retrieval augmented generation combines search with synthesis";
        let partials = collect_partials(text).await;

        assert_eq!(partials.len(), 7);
        assert_eq!(partials.last().unwrap(), text);

        for pair in partials.windows(2) {
            assert!(pair[1].len() > pair[0].len());
            assert!(pair[1].starts_with(pair[0].as_str()));
        }
    }

    #[tokio::test]
    async fn newlines_inside_the_answer_survive() {
        let text = "first line\nsecond line";
        let partials = collect_partials(text).await;
        assert_eq!(partials.last().unwrap(), text);
    }

    #[tokio::test]
    async fn empty_text_terminates_with_one_empty_snapshot() {
        let partials = collect_partials("").await;
        assert_eq!(partials, vec![String::new()]);
    }

    #[tokio::test]
    async fn whitespace_only_text_terminates() {
        let partials = collect_partials("   ").await;
        assert!(partials.iter().all(|p| p.is_empty()));
    }
}
