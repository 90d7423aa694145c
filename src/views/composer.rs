use crate::controller::ChatModel;
use crate::ui::AppController;
use dioxus::events::Key;
use dioxus::prelude::*;

const MAX_ROWS: usize = 8;

fn composer_rows(input: &str) -> usize {
    (input.matches('\n').count() + 1).clamp(1, MAX_ROWS)
}

#[component]
pub fn Composer(controller: AppController, model: Signal<ChatModel>) -> Element {
    let (input, can_send, has_chat) = {
        let snapshot = model.read();
        (
            snapshot.input.clone(),
            snapshot.can_send(),
            snapshot.current_chat().is_some(),
        )
    };
    let rows = composer_rows(&input);
    let placeholder = if has_chat {
        "Type a message... (Shift+Enter for a new line)"
    } else {
        "Create a chat to start"
    };

    let send = {
        let controller = controller.clone();
        move || {
            let controller = controller.clone();
            spawn(async move {
                controller.send().await;
            });
        }
    };
    let send_on_enter = send.clone();

    rsx! {
        form { class: "composer", onsubmit: move |evt| evt.prevent_default(),
            textarea {
                id: "input-msg",
                rows: "{rows}",
                placeholder,
                value: "{input}",
                oninput: move |evt| controller.set_input(evt.value()),
                onkeydown: move |evt| {
                    if evt.key() == Key::Enter && !evt.modifiers().shift() {
                        evt.prevent_default();
                        send_on_enter();
                    }
                },
                autofocus: true,
            }
            button {
                id: "send-btn",
                class: "btn btn-primary",
                r#type: "button",
                disabled: !can_send,
                onclick: move |_| send(),
                "Send"
            }
        }
    }
}
