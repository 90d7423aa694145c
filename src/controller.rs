//! Chat client controller.
//!
//! [`ChatController`] owns the conversation list, the selection and the visible
//! transcript in a [`ChatModel`], drives the backend through a [`ChatBackend`] and
//! hands every new model state to a [`ChatView`]. It is single-threaded: the model
//! lives in an `Rc<RefCell<_>>` and is only borrowed between `.await` points.

use crate::api::{ApiError, ChatBackend};
use crate::config::ClientConfig;
use crate::markdown::markdown_to_html;
use crate::types::{ChatSummary, Role};
use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;

pub const PLACEHOLDER_TEXT: &str = "Responding...";
pub const NETWORK_ERROR_NOTICE: &str = "A network error occurred.";
pub const NOT_FOUND_NOTICE: &str = "Conversation not found.";

pub type EntryId = u64;

#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    User(String),
    Bot { markdown: String, html: String },
    /// Shown while a reply is pending.
    Placeholder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub kind: EntryKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatModel {
    pub chats: Vec<ChatSummary>,
    pub current_chat_id: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
    pub input: String,
    pub sending: bool,
    /// A history fetch for the selected conversation has not settled yet.
    pub loading: bool,
    next_entry: EntryId,
    // Bumped whenever the transcript is reset; async results tagged with an older
    // epoch belong to a view the user has left.
    view_epoch: u64,
    active_send: Option<u64>,
    next_send: u64,
}

impl ChatModel {
    pub fn current_chat(&self) -> Option<&ChatSummary> {
        let id = self.current_chat_id.as_deref()?;
        self.chats.iter().find(|chat| chat.id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.current_chat_id.as_deref() == Some(id)
    }

    pub fn can_send(&self) -> bool {
        self.current_chat_id.is_some() && !self.sending && !self.loading
    }

    pub fn has_placeholder(&self) -> bool {
        self.transcript
            .iter()
            .any(|entry| entry.kind == EntryKind::Placeholder)
    }

    fn push_entry(&mut self, kind: EntryKind) -> EntryId {
        self.next_entry += 1;
        let id = self.next_entry;
        self.transcript.push(TranscriptEntry { id, kind });
        id
    }

    fn push_message(&mut self, text: &str, role: Role) -> Option<EntryId> {
        let kind = match role {
            Role::System => return None,
            Role::User => EntryKind::User(text.to_string()),
            Role::Bot => EntryKind::Bot {
                markdown: text.to_string(),
                html: markdown_to_html(text),
            },
        };
        Some(self.push_entry(kind))
    }

    fn remove_entry(&mut self, id: EntryId) {
        self.transcript.retain(|entry| entry.id != id);
    }

    fn reset_transcript(&mut self) -> u64 {
        self.view_epoch += 1;
        self.transcript.clear();
        self.input.clear();
        self.sending = false;
        self.loading = false;
        self.active_send = None;
        self.view_epoch
    }
}

/// Display surface driven by the controller.
#[async_trait(?Send)]
pub trait ChatView {
    fn render(&self, model: &ChatModel);

    fn alert(&self, message: &str);

    async fn confirm(&self, message: &str) -> bool;

    fn scroll_to_bottom(&self) {}

    fn focus_input(&self) {}
}

/// Title derived from the first message of a conversation still carrying the sentinel title.
pub fn suggested_title(message: &str, max_chars: usize) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub struct ChatController<B, V> {
    backend: Rc<B>,
    view: Rc<V>,
    model: Rc<RefCell<ChatModel>>,
    config: Rc<ClientConfig>,
}

impl<B, V> Clone for ChatController<B, V> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            view: Rc::clone(&self.view),
            model: Rc::clone(&self.model),
            config: Rc::clone(&self.config),
        }
    }
}

// Two handles are equal when they drive the same model.
impl<B, V> PartialEq for ChatController<B, V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.model, &other.model)
    }
}

impl<B: ChatBackend, V: ChatView> ChatController<B, V> {
    pub fn new(backend: impl Into<Rc<B>>, view: impl Into<Rc<V>>, config: ClientConfig) -> Self {
        Self {
            backend: backend.into(),
            view: view.into(),
            model: Rc::new(RefCell::new(ChatModel::default())),
            config: Rc::new(config),
        }
    }

    pub fn snapshot(&self) -> ChatModel {
        self.model.borrow().clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut ChatModel) -> R) -> R {
        f(&mut self.model.borrow_mut())
    }

    fn render(&self) {
        self.view.render(&self.model.borrow());
    }

    fn is_current_view(&self, epoch: u64) -> bool {
        self.model.borrow().view_epoch == epoch
    }

    fn alert_failure(&self, context: &str, err: &ApiError) {
        if err.is_transport() {
            tracing::error!(%err, "{context}");
            self.view.alert(NETWORK_ERROR_NOTICE);
        } else {
            tracing::warn!(%err, "{context}");
            self.view.alert(&format!("{context}: {err}"));
        }
    }

    /// Replaces the conversation list with the backend's and shows the selected transcript.
    pub async fn load_list(&self) {
        let chats = match self.backend.list_chats().await {
            Ok(chats) => chats,
            Err(err) => {
                self.alert_failure("Could not load conversations", &err);
                return;
            }
        };
        tracing::info!(count = chats.len(), "conversation list loaded");

        let selected = self.update(|model| {
            model.chats = chats;
            let still_listed = model
                .current_chat_id
                .as_deref()
                .is_some_and(|id| model.chats.iter().any(|chat| chat.id == id));
            if !still_listed {
                model.current_chat_id = model.chats.first().map(|chat| chat.id.clone());
            }
            model.current_chat_id.clone()
        });
        self.render();

        match selected {
            Some(id) => self.load(&id).await,
            None => self.clear_transcript(),
        }
    }

    pub async fn select(&self, id: &str) {
        let changed = self.update(|model| {
            if model.is_selected(id) || !model.chats.iter().any(|chat| chat.id == id) {
                return false;
            }
            model.current_chat_id = Some(id.to_string());
            true
        });
        if changed {
            self.render();
            self.load(id).await;
        }
    }

    pub async fn create(&self, title: &str) -> Option<String> {
        let chat = match self.backend.create_chat(title).await {
            Ok(chat) => chat,
            Err(err) => {
                self.alert_failure("Could not create conversation", &err);
                return None;
            }
        };
        tracing::info!(id = %chat.id, title = %chat.title, "conversation created");

        let id = chat.id.clone();
        self.update(|model| {
            model.chats.retain(|existing| existing.id != id);
            model.chats.insert(0, chat);
            model.current_chat_id = Some(id.clone());
        });
        self.render();
        self.load(&id).await;
        Some(id)
    }

    /// The "New chat" action: a conversation titled with the sentinel.
    pub async fn create_default(&self) -> Option<String> {
        let title = self.config.sentinel_title.clone();
        self.create(&title).await
    }

    pub async fn rename(&self, id: &str, new_title: &str) -> bool {
        let title = new_title.trim();
        if title.is_empty() {
            return false;
        }

        if let Err(err) = self.backend.rename_chat(id, title).await {
            self.alert_failure("Rename failed", &err);
            return false;
        }

        self.update(|model| {
            if let Some(chat) = model.chats.iter_mut().find(|chat| chat.id == id) {
                chat.title = title.to_string();
            }
        });
        self.render();
        true
    }

    pub async fn delete(&self, id: &str) -> bool {
        let title = self
            .model
            .borrow()
            .chats
            .iter()
            .find(|chat| chat.id == id)
            .map(|chat| chat.title.clone());
        let Some(title) = title else {
            return false;
        };

        let question = format!("Delete the conversation \"{title}\"?");
        if !self.view.confirm(&question).await {
            return false;
        }

        if let Err(err) = self.backend.delete_chat(id).await {
            self.alert_failure("Delete failed", &err);
            return false;
        }
        tracing::info!(%id, "conversation deleted");

        // Some(next) only when the deleted conversation was the selected one.
        let reselect = self.update(|model| {
            model.chats.retain(|chat| chat.id != id);
            if model.is_selected(id) {
                model.current_chat_id = model.chats.first().map(|chat| chat.id.clone());
                Some(model.current_chat_id.clone())
            } else {
                None
            }
        });
        self.render();

        match reselect {
            Some(Some(next)) => self.load(&next).await,
            Some(None) => self.clear_transcript(),
            None => {}
        }
        true
    }

    fn clear_transcript(&self) {
        self.update(ChatModel::reset_transcript);
        self.render();
    }

    /// Resets the transcript view and fills it with the conversation's history.
    pub async fn load(&self, id: &str) {
        let epoch = self.update(|model| {
            let epoch = model.reset_transcript();
            model.loading = true;
            epoch
        });
        self.render();

        let fetched = self.backend.fetch_chat(id).await;
        if !self.is_current_view(epoch) {
            tracing::debug!(%id, "discarding transcript for a view that was replaced");
            return;
        }
        self.update(|model| model.loading = false);

        match fetched {
            Ok(Some(detail)) => {
                self.update(|model| {
                    for message in &detail.messages {
                        model.push_message(&message.content, message.role);
                    }
                });
                self.render();
                self.view.scroll_to_bottom();
                self.view.focus_input();
            }
            Ok(None) => {
                self.render();
                tracing::warn!(%id, "conversation not found");
                self.view.alert(NOT_FOUND_NOTICE);
            }
            Err(err) => {
                self.render();
                self.alert_failure("Could not load conversation", &err);
            }
        }
    }

    /// Appends one message to the visible transcript. System messages are dropped.
    pub fn append_message(&self, text: &str, role: Role) -> Option<EntryId> {
        let id = self.update(|model| model.push_message(text, role))?;
        self.render();
        self.view.scroll_to_bottom();
        Some(id)
    }

    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|model| model.input = text);
        self.render();
    }

    /// Sends the composer text to the selected conversation.
    pub async fn send(&self) {
        let prepared = self.update(|model| {
            let message = model.input.trim().to_string();
            let chat_id = model.current_chat_id.clone()?;
            if message.is_empty() || !model.can_send() {
                return None;
            }

            model.push_message(&message, Role::User);
            model.input.clear();
            model.sending = true;
            model.next_send += 1;
            model.active_send = Some(model.next_send);
            let placeholder = model.push_entry(EntryKind::Placeholder);
            Some((chat_id, message, model.view_epoch, model.next_send, placeholder))
        });
        let Some((chat_id, message, epoch, ticket, placeholder)) = prepared else {
            return;
        };
        self.render();
        self.view.scroll_to_bottom();
        tracing::debug!(%chat_id, "sending message");

        let outcome = self.backend.send_message(&chat_id, &message).await;
        let still_viewing = self.is_current_view(epoch);

        match outcome {
            Ok(reply) => {
                if reply.title_changed {
                    tracing::debug!(%chat_id, "backend retitled the conversation");
                }
                if still_viewing {
                    self.update(|model| {
                        model.remove_entry(placeholder);
                        model.push_message(&reply.reply, Role::Bot);
                    });
                    self.render();
                    self.view.scroll_to_bottom();
                } else {
                    tracing::info!(%chat_id, "reply arrived after leaving the conversation; not shown");
                }
            }
            Err(err) => {
                if still_viewing {
                    self.update(|model| model.remove_entry(placeholder));
                    self.render();
                }
                self.alert_failure("Error", &err);
            }
        }

        let finished = self.update(|model| {
            if model.active_send != Some(ticket) {
                return false;
            }
            model.active_send = None;
            model.sending = false;
            true
        });
        if finished {
            self.render();
            self.view.focus_input();
        }

        self.auto_title(&chat_id, &message).await;
    }

    async fn auto_title(&self, chat_id: &str, message: &str) {
        let untitled = self
            .model
            .borrow()
            .chats
            .iter()
            .any(|chat| chat.id == chat_id && chat.title == self.config.sentinel_title);
        if !untitled {
            return;
        }

        let title = suggested_title(message, self.config.title_max_chars);
        match self.backend.rename_chat(chat_id, &title).await {
            Ok(()) => {
                self.update(|model| {
                    if let Some(chat) = model.chats.iter_mut().find(|chat| chat.id == chat_id) {
                        chat.title = title;
                    }
                });
                self.render();
            }
            Err(err) => tracing::warn!(%err, %chat_id, "automatic retitle failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_become_the_title_verbatim() {
        assert_eq!(
            suggested_title("Hello world, this is a test", 30),
            "Hello world, this is a test"
        );
    }

    #[test]
    fn long_messages_are_cut_at_the_limit() {
        let title = suggested_title("Hello world, this is a longer test message", 30);
        assert_eq!(title, "Hello world, this is a longer ...");
        assert_eq!(title.chars().count(), 33);
    }

    #[test]
    fn exactly_the_limit_is_not_truncated() {
        let message = "a".repeat(30);
        assert_eq!(suggested_title(&message, 30), message);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let message = "é".repeat(31);
        assert_eq!(suggested_title(&message, 30), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn system_messages_never_enter_the_transcript() {
        let mut model = ChatModel::default();
        assert!(model.push_message("prompt", Role::System).is_none());
        model.push_message("hi", Role::User);
        model.push_message("**hey**", Role::Bot);
        assert_eq!(model.transcript.len(), 2);
        match &model.transcript[1].kind {
            EntryKind::Bot { html, .. } => assert!(html.contains("<strong>hey</strong>")),
            other => panic!("unexpected entry {other:?}"),
        }
    }

    #[test]
    fn entry_ids_stay_unique_after_removal() {
        let mut model = ChatModel::default();
        let first = model.push_entry(EntryKind::Placeholder);
        model.remove_entry(first);
        let second = model.push_entry(EntryKind::Placeholder);
        assert_ne!(first, second);
        assert!(model.has_placeholder());
    }
}
