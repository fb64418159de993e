//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the one operation every backend must
//! support: compose a background and an overlay into a finished card.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): `image` for decode,
//! resize and JPEG encode, `resvg` for rasterizing the text overlay.

use super::params::ComposeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to decode background image: {0}")]
    Decode(String),
    #[error("failed to render overlay: {0}")]
    Overlay(String),
    #[error("failed to encode card: {0}")]
    Encode(String),
    #[error("render task failed: {0}")]
    Task(String),
}

/// Trait for image processing backends.
///
/// Composition is synchronous and CPU-bound; async callers run it on the
/// blocking pool.
pub trait ImageBackend: Send + Sync {
    /// Fill the canvas with the background (resize + centre crop), draw the
    /// overlay markup on top and encode the result as JPEG.
    fn compose(&self, params: &ComposeParams<'_>) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, every compose fails with this message.
        pub compose_failure: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Compose {
            background_len: usize,
            overlay_svg: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    /// Bytes the mock returns from a successful compose.
    pub const MOCK_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(message: &str) -> Self {
            Self {
                compose_failure: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn compose(&self, params: &ComposeParams<'_>) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Compose {
                background_len: params.background.len(),
                overlay_svg: params.overlay_svg.to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            match &self.compose_failure {
                Some(message) => Err(BackendError::Encode(message.clone())),
                None => Ok(MOCK_JPEG.to_vec()),
            }
        }
    }

    #[test]
    fn mock_records_compose() {
        let backend = MockBackend::new();

        let out = backend
            .compose(&ComposeParams {
                background: &[0; 10],
                overlay_svg: "<svg/>",
                width: 1080,
                height: 1350,
                quality: Quality::new(90),
            })
            .unwrap();
        assert_eq!(out, MOCK_JPEG);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Compose {
                background_len: 10,
                width: 1080,
                height: 1350,
                quality: 90,
                ..
            }
        ));
    }

    #[test]
    fn failing_mock_still_records() {
        let backend = MockBackend::failing("disk full");
        let result = backend.compose(&ComposeParams {
            background: &[],
            overlay_svg: "<svg/>",
            width: 10,
            height: 10,
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::Encode(m)) if m == "disk full"));
        assert_eq!(backend.get_operations().len(), 1);
    }
}
