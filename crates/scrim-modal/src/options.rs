#![forbid(unsafe_code)]

//! Modal options and the overrides merged onto them.
//!
//! [`ModalOptions`] is the resolved configuration of one modal instance.
//! [`ModalOverrides`] carries caller-supplied values; [`ModalOverrides::apply_to`]
//! merges them field by field onto a set of defaults and returns a new value,
//! leaving the defaults untouched.
//!
//! With the `config` feature, overrides can be read from TOML or JSON. Keys
//! accept both `snake_case` and the `camelCase` spellings (`escapeClose`,
//! `fadeDuration`, ...); `fade_duration` is given in milliseconds.

use std::time::Duration;

/// Resolved options for a modal instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalOptions {
    /// Escape closes the active modal.
    pub escape_close: bool,
    /// A click on the overlay itself (not the modal content) closes the modal.
    pub click_close: bool,
    /// Label of the generated close control.
    pub close_text: String,
    /// Extra classes on the close control.
    pub close_class: String,
    /// Base class of the modal element; the spinner gets `<modal_class>-spinner`.
    pub modal_class: String,
    /// Markup injected into the spinner element.
    pub spinner_html: Option<String>,
    /// Whether `show_spinner` creates a spinner at all.
    pub show_spinner: bool,
    /// Whether a close control is inserted into the modal.
    pub show_close: bool,
    /// Length of fade transitions. `None` or zero disables fading.
    pub fade_duration: Option<Duration>,
    /// Fraction of the overlay fade-in after which the modal fade-in starts.
    pub fade_delay: f64,
    /// Fade gate. The controller resets it to `false` on every open.
    pub do_fade: bool,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            escape_close: true,
            click_close: true,
            close_text: "Close".to_owned(),
            close_class: String::new(),
            modal_class: "modal".to_owned(),
            spinner_html: None,
            show_spinner: true,
            show_close: true,
            fade_duration: None,
            fade_delay: 1.0,
            do_fade: false,
        }
    }
}

impl ModalOptions {
    /// Whether open/close transitions animate.
    pub fn fades(&self) -> bool {
        self.do_fade && self.fade_duration.is_some_and(|d| !d.is_zero())
    }

    /// Fade length, zero when fading is disabled.
    pub fn fade_duration_or_zero(&self) -> Duration {
        if self.fades() {
            self.fade_duration.unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }

    /// Delay between the overlay fade-in and the modal fade-in.
    pub fn show_delay(&self) -> Duration {
        let delay = if self.fade_delay.is_finite() {
            self.fade_delay.max(0.0)
        } else {
            0.0
        };
        let secs = self.fade_duration_or_zero().as_secs_f64() * delay;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Classes of the spinner element.
    pub fn spinner_class(&self) -> String {
        format!("{}-spinner", self.modal_class)
    }

    pub fn escape_close(mut self, value: bool) -> Self {
        self.escape_close = value;
        self
    }

    pub fn click_close(mut self, value: bool) -> Self {
        self.click_close = value;
        self
    }

    pub fn close_text(mut self, value: impl Into<String>) -> Self {
        self.close_text = value.into();
        self
    }

    pub fn close_class(mut self, value: impl Into<String>) -> Self {
        self.close_class = value.into();
        self
    }

    pub fn modal_class(mut self, value: impl Into<String>) -> Self {
        self.modal_class = value.into();
        self
    }

    pub fn spinner_html(mut self, value: impl Into<String>) -> Self {
        self.spinner_html = Some(value.into());
        self
    }

    pub fn show_spinner(mut self, value: bool) -> Self {
        self.show_spinner = value;
        self
    }

    pub fn show_close(mut self, value: bool) -> Self {
        self.show_close = value;
        self
    }

    pub fn fade_duration(mut self, value: Duration) -> Self {
        self.fade_duration = Some(value);
        self
    }

    pub fn fade_delay(mut self, value: f64) -> Self {
        self.fade_delay = value;
        self
    }
}

/// Caller-supplied option values. `None` falls back to the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct ModalOverrides {
    #[cfg_attr(feature = "config", serde(alias = "escapeClose"))]
    pub escape_close: Option<bool>,
    #[cfg_attr(feature = "config", serde(alias = "clickClose"))]
    pub click_close: Option<bool>,
    #[cfg_attr(feature = "config", serde(alias = "closeText"))]
    pub close_text: Option<String>,
    #[cfg_attr(feature = "config", serde(alias = "closeClass"))]
    pub close_class: Option<String>,
    #[cfg_attr(feature = "config", serde(alias = "modalClass"))]
    pub modal_class: Option<String>,
    /// `Some(None)` resets the spinner markup to none.
    #[cfg_attr(
        feature = "config",
        serde(alias = "spinnerHtml", deserialize_with = "de::nullable")
    )]
    pub spinner_html: Option<Option<String>>,
    #[cfg_attr(feature = "config", serde(alias = "showSpinner"))]
    pub show_spinner: Option<bool>,
    #[cfg_attr(feature = "config", serde(alias = "showClose"))]
    pub show_close: Option<bool>,
    /// `Some(None)` resets the fade duration to none.
    #[cfg_attr(
        feature = "config",
        serde(alias = "fadeDuration", deserialize_with = "de::nullable_millis")
    )]
    pub fade_duration: Option<Option<Duration>>,
    #[cfg_attr(feature = "config", serde(alias = "fadeDelay"))]
    pub fade_delay: Option<f64>,
    #[cfg_attr(feature = "config", serde(alias = "doFade"))]
    pub do_fade: Option<bool>,
}

impl ModalOverrides {
    /// No overrides: every field falls back to the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge onto `defaults`, producing a new set of options.
    pub fn apply_to(&self, defaults: &ModalOptions) -> ModalOptions {
        let d = defaults;
        ModalOptions {
            escape_close: self.escape_close.unwrap_or(d.escape_close),
            click_close: self.click_close.unwrap_or(d.click_close),
            close_text: self.close_text.clone().unwrap_or_else(|| d.close_text.clone()),
            close_class: self
                .close_class
                .clone()
                .unwrap_or_else(|| d.close_class.clone()),
            modal_class: self
                .modal_class
                .clone()
                .unwrap_or_else(|| d.modal_class.clone()),
            spinner_html: self
                .spinner_html
                .clone()
                .unwrap_or_else(|| d.spinner_html.clone()),
            show_spinner: self.show_spinner.unwrap_or(d.show_spinner),
            show_close: self.show_close.unwrap_or(d.show_close),
            fade_duration: self.fade_duration.unwrap_or(d.fade_duration),
            fade_delay: self.fade_delay.unwrap_or(d.fade_delay),
            do_fade: self.do_fade.unwrap_or(d.do_fade),
        }
    }

    /// Whether no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn escape_close(mut self, value: bool) -> Self {
        self.escape_close = Some(value);
        self
    }

    pub fn click_close(mut self, value: bool) -> Self {
        self.click_close = Some(value);
        self
    }

    pub fn close_text(mut self, value: impl Into<String>) -> Self {
        self.close_text = Some(value.into());
        self
    }

    pub fn close_class(mut self, value: impl Into<String>) -> Self {
        self.close_class = Some(value.into());
        self
    }

    pub fn modal_class(mut self, value: impl Into<String>) -> Self {
        self.modal_class = Some(value.into());
        self
    }

    pub fn spinner_html(mut self, value: impl Into<String>) -> Self {
        self.spinner_html = Some(Some(value.into()));
        self
    }

    /// Override the spinner markup with none.
    pub fn clear_spinner_html(mut self) -> Self {
        self.spinner_html = Some(None);
        self
    }

    pub fn show_spinner(mut self, value: bool) -> Self {
        self.show_spinner = Some(value);
        self
    }

    pub fn show_close(mut self, value: bool) -> Self {
        self.show_close = Some(value);
        self
    }

    pub fn fade_duration(mut self, value: Duration) -> Self {
        self.fade_duration = Some(Some(value));
        self
    }

    /// Override the fade duration with none.
    pub fn no_fade_duration(mut self) -> Self {
        self.fade_duration = Some(None);
        self
    }

    pub fn fade_delay(mut self, value: f64) -> Self {
        self.fade_delay = Some(value);
        self
    }

    pub fn do_fade(mut self, value: bool) -> Self {
        self.do_fade = Some(value);
        self
    }
}

#[cfg(feature = "config")]
mod de {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    /// A present key is an override even when its value is `null`.
    pub(super) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }

    /// Milliseconds, integral or fractional, or `null`.
    pub(super) fn nullable_millis<'de, D>(
        deserializer: D,
    ) -> Result<Option<Option<Duration>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(ms) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(Some(None));
        };
        Duration::try_from_secs_f64(ms / 1000.0)
            .map(|d| Some(Some(d)))
            .map_err(|_| D::Error::custom(format!("invalid fade duration {ms} ms")))
    }
}

#[cfg(feature = "config")]
mod load {
    use std::path::Path;

    use super::{ModalOptions, ModalOverrides};
    use crate::error::ModalError;

    impl ModalOverrides {
        /// Parse overrides from TOML.
        pub fn from_toml_str(input: &str) -> Result<Self, ModalError> {
            toml::from_str(input).map_err(|e| ModalError::InvalidToml(e.to_string()))
        }

        /// Parse overrides from JSON.
        pub fn from_json_str(input: &str) -> Result<Self, ModalError> {
            serde_json::from_str(input).map_err(|e| ModalError::InvalidJson(e.to_string()))
        }

        /// Read overrides from a file. `.json` files are parsed as JSON,
        /// everything else as TOML.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ModalError> {
            let path = path.as_ref();
            let input = std::fs::read_to_string(path).map_err(|source| ModalError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json {
                Self::from_json_str(&input)
            } else {
                Self::from_toml_str(&input)
            }
        }
    }

    impl ModalOptions {
        /// Built-in defaults with the TOML overrides applied.
        pub fn from_toml_str(input: &str) -> Result<Self, ModalError> {
            Ok(ModalOverrides::from_toml_str(input)?.apply_to(&Self::default()))
        }

        /// Built-in defaults with the JSON overrides applied.
        pub fn from_json_str(input: &str) -> Result<Self, ModalError> {
            Ok(ModalOverrides::from_json_str(input)?.apply_to(&Self::default()))
        }

        /// Built-in defaults with the overrides from `path` applied.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ModalError> {
            Ok(ModalOverrides::load(path)?.apply_to(&Self::default()))
        }
    }
}
