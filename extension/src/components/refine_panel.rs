use dioxus::prelude::*;

use super::{dispatch, Action};
use crate::controller::PopupController;
use crate::icons;
use crate::popup_state::PopupView;

#[component]
pub fn RefinePanel(mut view: Signal<PopupView>) -> Element {
    let controller = use_context::<PopupController>();
    let snapshot = view.read().clone();
    let input_text = snapshot.input_text;
    let busy = snapshot.busy;
    let error = snapshot.error.unwrap_or_default();
    let show_result = snapshot.result.is_some();
    let result = snapshot.result.unwrap_or_default();
    let copy_label = snapshot.copy_label;

    let ctx_for_refine = controller.clone();
    let handle_refine =
        move |_: Event<MouseData>| dispatch(ctx_for_refine.clone(), view, Action::Refine);

    let ctx_for_copy = controller.clone();
    let handle_copy =
        move |_: Event<MouseData>| dispatch(ctx_for_copy.clone(), view, Action::CopyResult);

    let handle_settings =
        move |_: Event<MouseData>| dispatch(controller.clone(), view, Action::ShowSettings);

    rsx! {
        div { class: "space-y-4",
            textarea {
                class: "w-full h-32 px-3 py-2 border border-gray-300 rounded-lg text-sm focus:ring-2 focus:ring-blue-500 focus:border-transparent",
                placeholder: "Enter text to refine...",
                value: "{input_text}",
                oninput: move |e| view.write().input_text = e.value()
            }

            button {
                class: "w-full bg-blue-600 text-white py-2 px-4 rounded-lg hover:bg-blue-700 transition disabled:opacity-50 disabled:cursor-not-allowed",
                disabled: busy,
                onclick: handle_refine,
                div { class: "flex items-center justify-center",
                    icons::Sparkles { class: Some("w-4 h-4 mr-2".to_string()) }
                    span { "Refine" }
                }
            }

            if busy {
                div { class: "flex items-center justify-center text-sm text-gray-600",
                    div { class: "animate-spin w-4 h-4 border-2 border-blue-600 border-t-transparent rounded-full mr-2" }
                    "Refining..."
                }
            }

            if !error.is_empty() {
                div { class: "flex items-start bg-red-50 border border-red-200 rounded-lg p-3",
                    icons::AlertCircle { class: Some("w-4 h-4 text-red-600 mr-2 mt-0.5".to_string()) }
                    p { class: "text-sm text-red-800", "{error}" }
                }
            }

            if show_result {
                div { class: "bg-gray-50 border border-gray-200 rounded-lg p-4",
                    p { class: "text-sm text-gray-900 whitespace-pre-wrap select-all", "{result}" }
                    button {
                        class: "mt-3 w-full bg-gray-200 text-gray-700 py-2 px-4 rounded-lg hover:bg-gray-300 transition text-sm flex items-center justify-center",
                        onclick: handle_copy,
                        icons::Copy { class: Some("w-4 h-4 mr-2".to_string()) }
                        "{copy_label}"
                    }
                }
            }

            div { class: "pt-4 border-t border-gray-200 text-right",
                a {
                    class: "inline-flex items-center text-sm text-gray-500 hover:text-gray-700",
                    href: "#",
                    prevent_default: "onclick",
                    onclick: handle_settings,
                    icons::Settings { class: Some("w-4 h-4 mr-1".to_string()) }
                    "Settings"
                }
            }
        }
    }
}
