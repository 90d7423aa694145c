use crate::controller::{ChatModel, EntryKind, PLACEHOLDER_TEXT, TranscriptEntry};
use dioxus::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
fn copy_to_clipboard(text: String) {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => tracing::debug!("reply copied to clipboard"),
        Err(err) => tracing::warn!(%err, "clipboard unavailable"),
    }
}

#[cfg(target_arch = "wasm32")]
fn copy_to_clipboard(text: String) {
    match serde_json::to_string(&text) {
        Ok(literal) => {
            let _ = document::eval(&format!("navigator.clipboard?.writeText({literal});"));
        }
        Err(err) => tracing::warn!(%err, "could not encode reply for the clipboard"),
    }
}

#[component]
pub fn Transcript(model: Signal<ChatModel>) -> Element {
    let entries = model.read().transcript.clone();

    rsx! {
        div { id: "chat-box", class: "chat-box",
            for entry in entries.iter() {
                TranscriptRow { key: "{entry.id}", entry: entry.clone() }
            }
        }
    }
}

#[component]
fn TranscriptRow(entry: TranscriptEntry) -> Element {
    match entry.kind {
        EntryKind::User(text) => rsx! {
            div { class: "user-msg", "{text}" }
        },
        EntryKind::Bot { markdown, html } => rsx! {
            BotMessage { markdown, html }
        },
        EntryKind::Placeholder => rsx! {
            div { id: "loading-indicator", class: "bot-msg pending",
                span { class: "shimmer-text", "{PLACEHOLDER_TEXT}" }
            }
        },
    }
}

#[component]
fn BotMessage(markdown: String, html: String) -> Element {
    let on_copy = move |_| copy_to_clipboard(markdown.clone());

    rsx! {
        div { class: "bot-msg",
            div { class: "bubble-controls",
                button { class: "action-btn", r#type: "button", title: "Copy markdown", onclick: on_copy, "Copy" }
            }
            // Sanitised at conversion time: raw HTML from the bot never reaches this node.
            div { class: "md", dangerous_inner_html: "{html}" }
        }
    }
}
