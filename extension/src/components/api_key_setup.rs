use dioxus::prelude::*;

use super::{dispatch, Action};
use crate::controller::PopupController;
use crate::icons;
use crate::popup_state::PopupView;

#[component]
pub fn ApiKeySetup(mut view: Signal<PopupView>) -> Element {
    let controller = use_context::<PopupController>();
    let prefix = controller.config().credential_prefix.clone();

    let api_key_input = view.read().api_key_input.clone();
    let (status_text, status_color) = match view.read().status.as_ref() {
        Some(status) => (status.text.clone(), status.tone.color()),
        None => (String::new(), ""),
    };

    let handle_save =
        move |_: Event<MouseData>| dispatch(controller.clone(), view, Action::SaveApiKey);

    rsx! {
        div { class: "space-y-4",
            div { class: "flex items-center",
                icons::KeyRound { class: Some("w-5 h-5 text-blue-600 mr-2".to_string()) }
                h2 { class: "text-lg font-semibold text-gray-900", "API Key" }
            }

            p { class: "text-sm text-gray-600",
                "Your key is kept in extension storage and only sent to the background worker."
            }

            input {
                class: "w-full px-3 py-2 border border-gray-300 rounded-lg font-mono text-sm focus:ring-2 focus:ring-blue-500 focus:border-transparent",
                r#type: "password",
                placeholder: "{prefix}...",
                value: "{api_key_input}",
                oninput: move |e| view.write().api_key_input = e.value()
            }

            button {
                class: "w-full bg-blue-600 text-white py-2 px-4 rounded-lg hover:bg-blue-700 transition",
                onclick: handle_save,
                "Save API Key"
            }

            if !status_text.is_empty() {
                p { class: "text-sm", style: "color: {status_color}", "{status_text}" }
            }
        }
    }
}
