mod api_key_setup;
mod refine_panel;

pub use api_key_setup::ApiKeySetup;
pub use refine_panel::RefinePanel;

use dioxus::prelude::*;

use crate::controller::PopupController;
use crate::popup_state::{PopupView, ViewHandle};

// Every controller update goes through the signal so the popup re-renders
impl ViewHandle for Signal<PopupView> {
    fn snapshot(&self) -> PopupView {
        self.peek().clone()
    }

    fn update(&mut self, f: impl FnOnce(&mut PopupView)) {
        let mut view = self.write();
        f(&mut *view);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Load,
    SaveApiKey,
    Refine,
    CopyResult,
    ShowSettings,
}

/// Run a controller action as a popup-wide task
///
/// Panel-scoped tasks are dropped when the panel unmounts, and most actions
/// switch panels or outlive a switch (show-settings, a refine awaiting its
/// reply, the copy label reset). These tasks live until the popup closes.
pub fn dispatch(controller: PopupController, view: Signal<PopupView>, action: Action) {
    log::debug!("Dispatching {:?}", action);
    spawn_forever(async move {
        let mut view = view;
        match action {
            Action::Load => controller.load(&mut view).await,
            Action::SaveApiKey => controller.save_api_key(&mut view).await,
            Action::Refine => controller.refine(&mut view).await,
            Action::CopyResult => controller.copy_result(&mut view).await,
            Action::ShowSettings => controller.show_settings(&mut view).await,
        }
    });
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::config::PopupConfig;
    use crate::error::{ChannelError, ClipboardError, StorageError};
    use crate::popup_state::{Panel, COPY_LABEL};
    use crate::services::clipboard::Clipboard;
    use crate::services::messaging::{Delivery, MessageChannel, RefineRequest, RefineResponse};
    use crate::services::storage::{MemoryArea, StorageBackend, StorageMap, TieredStorage};
    use crate::services::timer::Delay;
    use async_trait::async_trait;
    use dioxus_core::{NoOpMutations, VirtualDom};
    use std::cell::RefCell;
    use std::future::Future;
    use std::pin::Pin;
    use std::rc::Rc;
    use std::task::{Context, Poll};
    use std::time::Duration;

    /// Pending on first poll, like a browser promise
    #[derive(Default)]
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    struct SlowArea(MemoryArea);

    #[async_trait(?Send)]
    impl StorageBackend for SlowArea {
        fn name(&self) -> &str {
            self.0.name()
        }

        async fn get(&self, key: &str) -> Result<StorageMap, StorageError> {
            YieldOnce::default().await;
            self.0.get(key).await
        }

        async fn set(&self, items: &StorageMap) -> Result<(), StorageError> {
            YieldOnce::default().await;
            self.0.set(items).await
        }
    }

    struct SlowChannel;

    #[async_trait(?Send)]
    impl MessageChannel for SlowChannel {
        async fn send(&self, _request: &RefineRequest) -> Result<Delivery, ChannelError> {
            YieldOnce::default().await;
            Ok(Delivery::answered(RefineResponse::refined("Hello, world.")))
        }
    }

    struct InstantClipboard;

    #[async_trait(?Send)]
    impl Clipboard for InstantClipboard {
        async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
            Ok(())
        }
    }

    struct SlowDelay;

    #[async_trait(?Send)]
    impl Delay for SlowDelay {
        async fn sleep(&self, _duration: Duration) {
            YieldOnce::default().await;
        }
    }

    thread_local! {
        static SETUP: RefCell<Option<(PopupController, PopupView, Vec<Action>)>> =
            const { RefCell::new(None) };
        static RENDERED: RefCell<Option<PopupView>> = const { RefCell::new(None) };
    }

    /// Mirrors the App layout: the actions fire from inside the Ready panel,
    /// which unmounts as soon as the view switches to Setup
    #[component]
    fn TestPopup() -> Element {
        let (controller, initial, actions) = SETUP
            .with(|setup| setup.borrow().clone())
            .expect("popup fixture");
        use_context_provider(move || controller);
        let view = use_signal(move || initial);

        let snapshot = view.read().clone();
        let panel = snapshot.panel;
        RENDERED.with(|rendered| *rendered.borrow_mut() = Some(snapshot));

        rsx! {
            if panel == Panel::Ready {
                ReadyTrigger { view: view, actions: actions }
            }
        }
    }

    #[component]
    fn ReadyTrigger(view: Signal<PopupView>, actions: Vec<Action>) -> Element {
        let controller = use_context::<PopupController>();
        use_hook(move || {
            for action in actions {
                dispatch(controller.clone(), view, action);
            }
        });
        rsx! { div {} }
    }

    fn controller(sync: &MemoryArea) -> PopupController {
        PopupController::new(
            PopupConfig::default(),
            TieredStorage::new(vec![Box::new(SlowArea(sync.clone()))]),
            Rc::new(SlowChannel),
            Rc::new(InstantClipboard),
            Rc::new(SlowDelay),
        )
    }

    async fn run_popup(controller: PopupController, initial: PopupView, actions: Vec<Action>) -> PopupView {
        SETUP.with(|setup| *setup.borrow_mut() = Some((controller, initial, actions)));

        let mut dom = VirtualDom::new(TestPopup);
        dom.rebuild_in_place();
        for _ in 0..50 {
            let work = tokio::time::timeout(Duration::from_millis(20), dom.wait_for_work()).await;
            if work.is_err() {
                break;
            }
            dom.render_immediate(&mut NoOpMutations);
        }

        RENDERED
            .with(|rendered| rendered.borrow_mut().take())
            .expect("rendered view")
    }

    fn ready_view(text: &str) -> PopupView {
        PopupView {
            panel: Panel::Ready,
            input_text: text.to_string(),
            ..Default::default()
        }
    }

    fn stored(key: &str) -> MemoryArea {
        let sync = MemoryArea::new("sync");
        let mut items = StorageMap::new();
        items.insert("openaiApiKey".into(), key.into());
        futures::executor::block_on(sync.set(&items)).unwrap();
        sync
    }

    #[tokio::test]
    async fn test_show_settings_prefills_after_panel_switch() {
        let sync = stored("sk-12345");
        let view = run_popup(controller(&sync), ready_view(""), vec![Action::ShowSettings]).await;

        assert_eq!(view.panel, Panel::Setup);
        assert_eq!(view.api_key_input, "sk-12345");
    }

    #[tokio::test]
    async fn test_refine_in_flight_survives_settings() {
        let sync = stored("sk-12345");
        let view = run_popup(
            controller(&sync),
            ready_view("hello world"),
            vec![Action::Refine, Action::ShowSettings],
        )
        .await;

        assert_eq!(view.panel, Panel::Setup);
        assert!(!view.busy);
        assert_eq!(view.result.as_deref(), Some("Hello, world."));
    }

    #[tokio::test]
    async fn test_copy_label_resets_after_settings() {
        let sync = stored("sk-12345");
        let mut initial = ready_view("hello world");
        initial.result = Some("Hello, world.".into());
        let view = run_popup(
            controller(&sync),
            initial,
            vec![Action::CopyResult, Action::ShowSettings],
        )
        .await;

        assert_eq!(view.panel, Panel::Setup);
        assert_eq!(view.copy_label, COPY_LABEL);
    }
}
