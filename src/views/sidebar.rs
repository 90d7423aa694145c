use crate::controller::ChatModel;
use crate::types::ChatSummary;
use crate::ui::AppController;
use dioxus::events::Key;
use dioxus::prelude::*;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use time::format_description::well_known::Rfc3339;

const UPDATED_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:zero], [hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]"
);

fn format_updated_at(raw: &str) -> Option<String> {
    let mut datetime = OffsetDateTime::parse(raw, &Rfc3339).ok()?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    format_timestamp(datetime)
}

fn format_timestamp(datetime: OffsetDateTime) -> Option<String> {
    datetime.format(UPDATED_FORMAT).ok()
}

fn commit_rename(controller: AppController, id: String, mut draft: Signal<Option<String>>) {
    let Some(title) = draft.with_mut(Option::take) else {
        return;
    };
    spawn(async move {
        controller.rename(&id, &title).await;
    });
}

#[component]
pub fn ChatSidebar(controller: AppController, model: Signal<ChatModel>) -> Element {
    let (chats, current) = {
        let snapshot = model.read();
        (snapshot.chats.clone(), snapshot.current_chat_id.clone())
    };

    let create = {
        let controller = controller.clone();
        move |_| {
            let controller = controller.clone();
            spawn(async move {
                controller.create_default().await;
            });
        }
    };

    rsx! {
        aside { class: "sidebar",
            button { id: "new-chat-btn", class: "btn btn-primary", r#type: "button", onclick: create,
                "+ New chat"
            }
            div { id: "chat-list", class: "chat-list",
                for chat in chats.iter() {
                    ChatListItem {
                        key: "{chat.id}",
                        chat: chat.clone(),
                        active: current.as_deref() == Some(chat.id.as_str()),
                        controller: controller.clone(),
                    }
                }
            }
        }
    }
}

#[component]
fn ChatListItem(chat: ChatSummary, active: bool, controller: AppController) -> Element {
    let mut draft = use_signal(|| Option::<String>::None);
    let class = if active { "chat-item active" } else { "chat-item" };
    let stamp = chat.updated_at.as_deref().and_then(format_updated_at);

    let on_select = {
        let controller = controller.clone();
        let id = chat.id.clone();
        move |_| {
            let controller = controller.clone();
            let id = id.clone();
            spawn(async move {
                controller.select(&id).await;
            });
        }
    };

    let on_rename = {
        let title = chat.title.clone();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            draft.set(Some(title.clone()));
        }
    };

    let on_delete = {
        let controller = controller.clone();
        let id = chat.id.clone();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            let controller = controller.clone();
            let id = id.clone();
            spawn(async move {
                controller.delete(&id).await;
            });
        }
    };

    let on_key = {
        let controller = controller.clone();
        let id = chat.id.clone();
        move |evt: KeyboardEvent| match evt.key() {
            Key::Enter => {
                evt.prevent_default();
                commit_rename(controller.clone(), id.clone(), draft);
            }
            Key::Escape => draft.set(None),
            _ => {}
        }
    };

    let on_blur = {
        let controller = controller.clone();
        let id = chat.id.clone();
        move |_| commit_rename(controller.clone(), id.clone(), draft)
    };

    rsx! {
        div { class, "data-id": "{chat.id}", onclick: on_select,
            if let Some(value) = draft() {
                input {
                    class: "chat-title-input",
                    r#type: "text",
                    value: "{value}",
                    autofocus: true,
                    onclick: move |evt| evt.stop_propagation(),
                    oninput: move |evt| draft.set(Some(evt.value())),
                    onkeydown: on_key,
                    onblur: on_blur,
                }
            } else {
                div { class: "chat-heading",
                    span { class: "chat-title", "{chat.title}" }
                    if let Some(stamp) = stamp {
                        span { class: "chat-updated", "{stamp}" }
                    }
                }
            }
            span { class: "btn-group",
                span { class: "rename-btn", title: "Rename", onclick: on_rename, "✏️" }
                span { class: "delete-btn", title: "Delete conversation", onclick: on_delete, "🗑️" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn timestamp_uses_short_month_and_twelve_hour_clock() {
        let label = format_timestamp(datetime!(2024-03-04 21:15 UTC));
        assert_eq!(label.as_deref(), Some("Mar 04, 09:15 PM"));
    }

    #[test]
    fn backend_timestamps_parse() {
        assert!(format_updated_at("2024-03-04T09:15:00.123456Z").is_some());
        assert!(format_updated_at("yesterday").is_none());
    }
}
