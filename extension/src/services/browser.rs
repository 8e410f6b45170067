// Browser extension API bindings
// One adapter per calling convention, resolved from the global object so a
// missing namespace is a recoverable error instead of a JS exception.

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::oneshot;
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::config::PopupConfig;
use crate::controller::PopupController;
use crate::error::{ChannelError, ClipboardError, StorageError};
use crate::services::clipboard::Clipboard;
use crate::services::messaging::{Delivery, MessageChannel, RefineRequest, RefineResponse};
use crate::services::storage::{
    CallingConvention, MemoryArea, StorageBackend, StorageMap, StorageTier, TieredStorage,
};
use crate::services::timer::Delay;

fn property(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn function(target: &JsValue, name: &str) -> Option<Function> {
    property(target, name).and_then(|f| f.dyn_into::<Function>().ok())
}

/// `browser` (promise-based) or `chrome` (callback-based) namespace
fn extension_namespace(convention: CallingConvention) -> Option<JsValue> {
    let global = js_sys::global();
    match convention {
        CallingConvention::Promise => {
            property(&global, "browser").or_else(|| property(&global, "chrome"))
        }
        CallingConvention::Callback => property(&global, "chrome"),
    }
}

fn last_error() -> Option<String> {
    let runtime = property(&extension_namespace(CallingConvention::Callback)?, "runtime")?;
    let error = property(&runtime, "lastError")?;
    Some(
        property(&error, "message")
            .and_then(|m| m.as_string())
            .unwrap_or_else(|| format!("{:?}", error)),
    )
}

fn js_error_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn to_json_value(json: &str) -> Result<JsValue, JsValue> {
    js_sys::JSON::parse(json)
}

fn from_js_value(value: &JsValue) -> Option<String> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    js_sys::JSON::stringify(value).ok().map(String::from)
}

/// `storage.sync` or `storage.local`
pub struct ExtensionStorageArea {
    tier: StorageTier,
    convention: CallingConvention,
}

impl ExtensionStorageArea {
    pub fn new(tier: StorageTier, convention: CallingConvention) -> Self {
        Self { tier, convention }
    }

    fn unavailable(&self) -> StorageError {
        StorageError::Unavailable(self.tier.as_str().to_string())
    }

    fn rejected(&self, message: String) -> StorageError {
        StorageError::Rejected {
            area: self.tier.as_str().to_string(),
            message,
        }
    }

    fn area(&self) -> Result<JsValue, StorageError> {
        let namespace = extension_namespace(self.convention).ok_or_else(|| self.unavailable())?;
        let storage = property(&namespace, "storage").ok_or_else(|| self.unavailable())?;
        property(&storage, self.tier.as_str()).ok_or_else(|| self.unavailable())
    }

    async fn invoke(&self, method: &str, arg: &JsValue) -> Result<JsValue, StorageError> {
        let area = self.area()?;
        let call = function(&area, method).ok_or_else(|| self.unavailable())?;

        match self.convention {
            CallingConvention::Promise => {
                let returned = call
                    .call1(&area, arg)
                    .map_err(|e| self.rejected(js_error_message(&e)))?;
                let promise: Promise = returned
                    .dyn_into()
                    .map_err(|_| StorageError::Malformed(self.tier.as_str().to_string()))?;
                JsFuture::from(promise)
                    .await
                    .map_err(|e| self.rejected(js_error_message(&e)))
            }
            CallingConvention::Callback => {
                // lastError is only set while the callback runs
                let (tx, rx) = oneshot::channel::<(JsValue, Option<String>)>();
                let callback = Closure::once(move |result: JsValue| {
                    let _ = tx.send((result, last_error()));
                });

                call.call2(&area, arg, callback.as_ref())
                    .map_err(|e| self.rejected(js_error_message(&e)))?;
                let (result, error) = rx
                    .await
                    .map_err(|_| self.rejected("callback was never invoked".to_string()))?;
                drop(callback);

                match error {
                    Some(message) => Err(self.rejected(message)),
                    None => Ok(result),
                }
            }
        }
    }
}

#[async_trait(?Send)]
impl StorageBackend for ExtensionStorageArea {
    fn name(&self) -> &str {
        self.tier.as_str()
    }

    async fn get(&self, key: &str) -> Result<StorageMap, StorageError> {
        let result = self.invoke("get", &JsValue::from_str(key)).await?;

        let Some(json) = from_js_value(&result) else {
            return Ok(StorageMap::new());
        };
        serde_json::from_str(&json).map_err(|_| StorageError::Malformed(self.tier.as_str().to_string()))
    }

    async fn set(&self, items: &StorageMap) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(items).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let items = to_json_value(&json)
            .map_err(|e| StorageError::Serialization(js_error_message(&e)))?;

        self.invoke("set", &items).await?;
        Ok(())
    }
}

/// Build the tier chain described by the configuration
pub fn tiered_storage(config: &PopupConfig) -> TieredStorage {
    let backends = config
        .tiers
        .iter()
        .map(|tier| -> Box<dyn StorageBackend> {
            match tier {
                StorageTier::Memory => Box::new(MemoryArea::new(tier.as_str())),
                _ => Box::new(ExtensionStorageArea::new(*tier, config.convention)),
            }
        })
        .collect();
    TieredStorage::new(backends)
}

/// `chrome.runtime.sendMessage` with a reply callback
pub struct RuntimeChannel;

#[async_trait(?Send)]
impl MessageChannel for RuntimeChannel {
    async fn send(&self, request: &RefineRequest) -> Result<Delivery, ChannelError> {
        let unavailable = || ChannelError::Dispatch("extension runtime is not available".to_string());
        let namespace = extension_namespace(CallingConvention::Callback).ok_or_else(unavailable)?;
        let runtime = property(&namespace, "runtime").ok_or_else(unavailable)?;
        let send_message = function(&runtime, "sendMessage").ok_or_else(unavailable)?;

        let json =
            serde_json::to_string(request).map_err(|e| ChannelError::Serialization(e.to_string()))?;
        let payload =
            to_json_value(&json).map_err(|e| ChannelError::Serialization(js_error_message(&e)))?;

        let (tx, rx) = oneshot::channel::<Delivery>();
        let callback = Closure::once(move |response: JsValue| {
            let response = from_js_value(&response).and_then(|json| RefineResponse::from_reply(&json));
            let _ = tx.send(Delivery {
                response,
                last_error: last_error(),
            });
        });

        log::info!("Sending {} request to background worker", request.action);
        send_message
            .call2(&runtime, &payload, callback.as_ref())
            .map_err(|e| ChannelError::Dispatch(js_error_message(&e)))?;

        let delivery = rx
            .await
            .map_err(|_| ChannelError::Dispatch("reply callback was dropped".to_string()))?;
        drop(callback);
        Ok(delivery)
    }
}

/// `navigator.clipboard.writeText`
pub struct NavigatorClipboard;

#[async_trait(?Send)]
impl Clipboard for NavigatorClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let window = web_sys::window().ok_or(ClipboardError::Unavailable)?;
        let navigator = window.navigator();
        let clipboard = property(&navigator, "clipboard").ok_or(ClipboardError::Unavailable)?;
        let write_text = function(&clipboard, "writeText").ok_or(ClipboardError::Unavailable)?;

        let promise: Promise = write_text
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(|e| ClipboardError::Rejected(js_error_message(&e)))?
            .dyn_into()
            .map_err(|_| ClipboardError::Unavailable)?;
        JsFuture::from(promise)
            .await
            .map_err(|e| ClipboardError::Rejected(js_error_message(&e)))?;
        Ok(())
    }
}

pub struct TimeoutDelay;

#[async_trait(?Send)]
impl Delay for TimeoutDelay {
    async fn sleep(&self, duration: Duration) {
        let millis = duration.as_millis().min(u32::MAX as u128) as u32;
        gloo_timers::future::TimeoutFuture::new(millis).await;
    }
}

/// Controller wired to the real extension APIs
pub fn popup_controller(config: PopupConfig) -> PopupController {
    let storage = tiered_storage(&config);
    log::info!("Storage tiers: {:?}", storage.tier_names());
    PopupController::new(
        config,
        storage,
        Rc::new(RuntimeChannel),
        Rc::new(NavigatorClipboard),
        Rc::new(TimeoutDelay),
    )
}
