use crate::api::HttpBackend;
use crate::config::ClientConfig;
use crate::controller::{ChatController, ChatModel, ChatView};
use crate::views::{ChatSidebar, Composer, ConfirmDialog, ConfirmRequest, NoticeBanner, Transcript};
use async_trait::async_trait;
use dioxus::prelude::*;
use tokio::sync::oneshot;

const CHAT_CSS: Asset = asset!("/assets/chatdesk.css");

// Deferred so the DOM has been patched with the new entries first.
const SCROLL_SCRIPT: &str = r#"setTimeout(() => {
    const box = document.getElementById("chat-box");
    if (box) { box.scrollTop = box.scrollHeight; }
}, 0);"#;
const FOCUS_SCRIPT: &str = r#"setTimeout(() => document.getElementById("input-msg")?.focus(), 0);"#;

pub type AppController = ChatController<HttpBackend, SignalView>;

/// Pushes controller output into Dioxus signals.
#[derive(Clone, Copy)]
pub struct SignalView {
    model: Signal<ChatModel>,
    notice: Signal<Option<String>>,
    confirm: Signal<Option<ConfirmRequest>>,
}

#[async_trait(?Send)]
impl ChatView for SignalView {
    fn render(&self, model: &ChatModel) {
        let mut snapshot = self.model;
        snapshot.set(model.clone());
    }

    fn alert(&self, message: &str) {
        let mut notice = self.notice;
        notice.set(Some(message.to_string()));
    }

    async fn confirm(&self, message: &str) -> bool {
        let (reply, answer) = oneshot::channel();
        let mut pending = self.confirm;
        pending.set(Some(ConfirmRequest::new(message, reply)));
        // A dropped request (dialog replaced or unmounted) counts as "no".
        answer.await.unwrap_or(false)
    }

    fn scroll_to_bottom(&self) {
        let _ = document::eval(SCROLL_SCRIPT);
    }

    fn focus_input(&self) {
        let _ = document::eval(FOCUS_SCRIPT);
    }
}

#[component]
pub fn App() -> Element {
    let config = try_use_context::<ClientConfig>().unwrap_or_default();
    let model = use_signal(ChatModel::default);
    let notice = use_signal(|| Option::<String>::None);
    let confirm = use_signal(|| Option::<ConfirmRequest>::None);

    let controller = use_hook(move || {
        HttpBackend::new(&config.api_base).map(|backend| {
            AppController::new(
                backend,
                SignalView {
                    model,
                    notice,
                    confirm,
                },
                config,
            )
        })
    });

    rsx! {
        document::Link { rel: "stylesheet", href: CHAT_CSS }
        {
            match controller {
                Ok(controller) => rsx! {
                    ChatShell { controller, model, notice, confirm }
                },
                Err(err) => rsx! {
                    StartupError { message: err.to_string() }
                },
            }
        }
    }
}

fn use_initial_load(controller: AppController) {
    use_effect(move || {
        let controller = controller.clone();
        spawn(async move {
            controller.load_list().await;
        });
    });
}

#[component]
fn ChatShell(
    controller: AppController,
    model: Signal<ChatModel>,
    notice: Signal<Option<String>>,
    confirm: Signal<Option<ConfirmRequest>>,
) -> Element {
    use_initial_load(controller.clone());

    rsx! {
        div { class: "app",
            ChatSidebar { controller: controller.clone(), model }
            main { class: "chat-main",
                NoticeBanner { notice }
                Transcript { model }
                Composer { controller, model }
            }
        }
        ConfirmDialog { request: confirm }
    }
}

#[component]
fn StartupError(message: String) -> Element {
    rsx! {
        div { class: "startup-error", role: "alert",
            h2 { "Cannot reach the chat service" }
            p { "{message}" }
        }
    }
}
