use crate::editor::{Notice, NoticeLevel};
use leptos::{component, view, IntoView, RwSignal, SignalGet};

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub level: NoticeLevel,
    pub visible: bool,
}

impl Default for Toast {
    fn default() -> Self {
        Self {
            id: 0,
            message: String::new(),
            level: NoticeLevel::Info,
            visible: false,
        }
    }
}

impl Toast {
    #[must_use]
    pub fn from_notice(notice: Notice) -> Self {
        Self {
            id: 0,
            message: notice.message,
            level: notice.level,
            visible: true,
        }
    }

    fn class(&self) -> &'static str {
        match (self.visible, self.level) {
            (false, _) => "toast",
            (true, NoticeLevel::Info) => "toast toast-visible",
            (true, NoticeLevel::Warning) => "toast toast-visible toast-warning",
            (true, NoticeLevel::Error) => "toast toast-visible toast-error",
        }
    }
}

#[component]
#[must_use]
pub fn ToastNotification(toast: RwSignal<Toast>) -> impl IntoView {
    view! {
        {move || {
            let t = toast.get();
            view! {
                <div class=t.class()>
                    {t.visible.then_some(t.message)}
                </div>
            }
        }}
    }
}
