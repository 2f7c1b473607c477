//! Test Helper Utilities
//!
//! Shared fakes, a mock Photos Library server and log capture

#![allow(dead_code)]

pub mod fakes;
pub mod log_capture;
pub mod mock_photos;

pub use fakes::{metadata, Call, FailingPreparer, FakeExport, FakeRemote, Op};
pub use log_capture::LogCapture;
pub use mock_photos::{Endpoint, MockPhotos};
