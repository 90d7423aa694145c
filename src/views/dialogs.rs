use dioxus::prelude::*;
use tokio::sync::oneshot;

/// A yes/no question waiting for the user.
pub struct ConfirmRequest {
    pub message: String,
    reply: oneshot::Sender<bool>,
}

impl ConfirmRequest {
    pub fn new(message: impl Into<String>, reply: oneshot::Sender<bool>) -> Self {
        Self {
            message: message.into(),
            reply,
        }
    }

    pub fn resolve(self, answer: bool) {
        // The asker may already be gone; nothing to do then.
        let _ = self.reply.send(answer);
    }
}

#[component]
pub fn ConfirmDialog(request: Signal<Option<ConfirmRequest>>) -> Element {
    let mut request = request;
    let message = request.read().as_ref().map(|pending| pending.message.clone());
    let Some(message) = message else {
        return rsx! {};
    };

    let mut answer = move |value: bool| {
        if let Some(pending) = request.with_mut(Option::take) {
            pending.resolve(value);
        }
    };

    rsx! {
        div { class: "dialog-overlay",
            div { class: "dialog", role: "dialog", aria_modal: "true",
                p { class: "dialog-message", "{message}" }
                div { class: "dialog-actions",
                    button { class: "btn btn-ghost", r#type: "button", onclick: move |_| answer(false), "Cancel" }
                    button { class: "btn btn-danger", r#type: "button", onclick: move |_| answer(true), "Delete" }
                }
            }
        }
    }
}

#[component]
pub fn NoticeBanner(notice: Signal<Option<String>>) -> Element {
    let mut notice = notice;
    let Some(message) = notice() else {
        return rsx! {};
    };

    rsx! {
        div { class: "notice", role: "alert",
            span { class: "notice-text", "{message}" }
            button { class: "btn-ghost", r#type: "button", onclick: move |_| notice.set(None), "Dismiss" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolving_delivers_the_answer() {
        let (tx, mut rx) = oneshot::channel();
        ConfirmRequest::new("Delete?", tx).resolve(true);
        assert_eq!(rx.try_recv(), Ok(true));
    }

    #[test]
    fn dropping_the_request_reads_as_cancelled() {
        let (tx, mut rx) = oneshot::channel::<bool>();
        drop(ConfirmRequest::new("Delete?", tx));
        assert!(rx.try_recv().is_err());
    }
}
