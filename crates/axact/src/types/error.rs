/*! Error types for automation operations. */

/// Settings path quoted in permission errors so callers can point users at
/// the right pane.
pub const ACCESSIBILITY_SETTINGS_PATH: &str =
  "System Settings > Privacy & Security > Accessibility";

/// Which OS permission an operation was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
  Accessibility,
  ScreenRecording,
}

impl std::fmt::Display for Permission {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Accessibility => write!(f, "accessibility"),
      Self::ScreenRecording => write!(f, "screen recording"),
    }
  }
}

/// Errors that can occur during automation operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("{0} permission not granted; enable this process under {ACCESSIBILITY_SETTINGS_PATH}")]
  PermissionDenied(Permission),

  #[error("the OS refused to create or post an input event")]
  EventCreationFailed,

  #[error("invalid coordinates ({x}, {y})")]
  InvalidCoordinates { x: f64, y: f64 },

  #[error("invalid key code {0}")]
  InvalidKeyCode(u16),

  #[error("no key code mapping for character {0:?}")]
  UnmappableCharacter(char),

  #[error("no element matched: {0}")]
  ElementNotFound(String),

  #[error("element '{0}' has zero size and cannot be targeted")]
  ElementNotVisible(String),

  #[error("action '{action}' failed with OS code {code}")]
  ActionFailed { action: String, code: i32 },

  #[error("failed to read required attribute '{0}'")]
  ReadFailed(String),

  #[error("element is not visible and has no scrollable ancestor")]
  NoScrollContainer,

  #[error("scroll target not reached after {attempts} attempts")]
  MaxScrollAttemptsExceeded { attempts: u32 },

  #[error("element disappeared while scrolling (after {attempts} attempts)")]
  NoProgress { attempts: u32 },

  #[error("operation exceeded its deadline after {elapsed_ms} ms")]
  HardTimeout { elapsed_ms: u64 },

  #[error("screen capture failed: {0}")]
  CaptureFailed(String),

  #[error("application not found: {0}")]
  AppNotFound(String),

  #[error("application not running: {0}")]
  AppNotRunning(String),

  #[error("window not found: {0}")]
  WindowNotFound(String),

  #[error("malformed element reference: {0}")]
  MalformedReference(String),

  #[error("operation not supported on this platform: {0}")]
  NotSupported(String),
}

/// Result type for automation operations.
pub type Result<T> = std::result::Result<T, Error>;
