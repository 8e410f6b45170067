// Popup view model
// Which panel is visible plus everything the panels render. All mutation goes
// through the transition functions below so the controller never touches a
// live document.

pub const COPY_LABEL: &str = "Copy to Clipboard";
pub const COPIED_LABEL: &str = "Copied!";

pub const MSG_EMPTY_KEY: &str = "Please enter a valid API key";
pub const MSG_KEY_SAVED: &str = "API key saved successfully";
pub const MSG_KEY_UNVERIFIED: &str = "API key save verification failed";
pub const MSG_EMPTY_TEXT: &str = "Please enter an English sentence to enhance";
pub const MSG_KEY_MISSING: &str = "API key not set, please configure settings first";
pub const MSG_NO_CONNECTION: &str =
    "Unable to connect to API. Check your network connection and API key.";
pub const MSG_UNEXPECTED: &str = "An error occurred while processing your request";
pub const MSG_COPY_FAILED: &str = "Failed to copy text to clipboard";

pub fn bad_key_format(prefix: &str) -> String {
    format!("Invalid API key format, should start with {}", prefix)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Panel {
    /// Credential entry
    #[default]
    Setup,
    /// Text refinement
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Error,
}

impl StatusTone {
    pub fn color(&self) -> &'static str {
        match self {
            StatusTone::Success => "#0f9d58",
            StatusTone::Error => "#d93025",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupView {
    pub panel: Panel,

    // Setup panel
    pub api_key_input: String,
    pub status: Option<StatusLine>,

    // Ready panel
    pub input_text: String,
    pub busy: bool,
    pub error: Option<String>,
    /// Rendered refinement; the result panel is shown iff this is set
    pub result: Option<String>,
    pub copy_label: String,
}

impl Default for PopupView {
    fn default() -> Self {
        Self {
            panel: Panel::Setup,
            api_key_input: String::new(),
            status: None,
            input_text: String::new(),
            busy: false,
            error: None,
            result: None,
            copy_label: COPY_LABEL.to_string(),
        }
    }
}

impl PopupView {
    pub fn show_panel(&mut self, panel: Panel) {
        self.panel = panel;
    }

    pub fn report_status(&mut self, tone: StatusTone, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            tone,
        });
    }

    /// Input rejected before any request: error shown, result hidden
    pub fn reject_input(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.result = None;
    }

    pub fn begin_refine(&mut self) {
        self.busy = true;
        self.error = None;
        self.result = None;
    }

    pub fn finish_refine(&mut self, outcome: Result<String, String>) {
        self.busy = false;
        match outcome {
            Ok(text) => self.result = Some(text),
            Err(message) => self.error = Some(message),
        }
    }

    pub fn mark_copied(&mut self) {
        self.copy_label = COPIED_LABEL.to_string();
    }

    pub fn reset_copy_label(&mut self) {
        self.copy_label = COPY_LABEL.to_string();
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn open_settings(&mut self) {
        self.panel = Panel::Setup;
    }

    pub fn prefill_api_key(&mut self, key: String) {
        self.api_key_input = key;
    }
}

/// Shared handle to the view model
///
/// The UI implements this for its reactive signal so every update re-renders;
/// a bare `PopupView` implements it for tests.
pub trait ViewHandle {
    fn snapshot(&self) -> PopupView;

    fn update(&mut self, f: impl FnOnce(&mut PopupView));
}

impl ViewHandle for PopupView {
    fn snapshot(&self) -> PopupView {
        self.clone()
    }

    fn update(&mut self, f: impl FnOnce(&mut PopupView)) {
        f(self)
    }
}
