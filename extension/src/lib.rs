pub mod config;
pub mod controller;
pub mod error;
pub mod popup_state;
pub mod services;

#[cfg(feature = "dioxus")]
pub mod components;
#[cfg(feature = "dioxus")]
pub mod icons;

#[cfg(all(target_arch = "wasm32", feature = "dioxus"))]
mod app {
    use dioxus::prelude::*;

    use crate::components::{dispatch, Action, ApiKeySetup, RefinePanel};
    use crate::config::PopupConfig;
    use crate::popup_state::{Panel, PopupView};
    use crate::services::browser;

    #[component]
    pub fn App() -> Element {
        let view = use_signal(PopupView::default);

        // Global controller, shared by both panels
        let controller =
            use_context_provider(|| browser::popup_controller(PopupConfig::embedded()));

        // Decide the initial panel once on open
        use_hook(move || dispatch(controller, view, Action::Load));

        let panel = view.read().panel;

        rsx! {
            div { class: "w-96 p-4 bg-white",
                h1 { class: "text-xl font-bold text-gray-900 mb-4", "Text Refiner" }

                match panel {
                    Panel::Setup => rsx! { ApiKeySetup { view: view } },
                    Panel::Ready => rsx! { RefinePanel { view: view } },
                }
            }
        }
    }
}

#[cfg(all(target_arch = "wasm32", feature = "dioxus"))]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run() {
    let config = config::PopupConfig::embedded();
    wasm_logger::init(wasm_logger::Config::new(config.log_level));
    log::info!("Text Refiner popup starting...");
    dioxus::launch(app::App);
}
