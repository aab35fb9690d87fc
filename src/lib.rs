// SPDX-License-Identifier: GPL-3.0-only

//! barscan - interval-driven barcode scanning over camera and image frames
//!
//! The crate pulls frames from a [`FrameSource`], copies them into canonical
//! RGBA [`PixelBuffer`]s, hands them to a barcode decoding library, retries
//! mirrored copies when nothing is found, and routes results to a
//! [`ResultSink`]. Frames that fail to decode are saved as PNG for offline
//! diagnosis.
//!
//! # Architecture
//!
//! - [`backends`]: frame sources (static buffers, image files)
//! - [`processor`]: frame conversion, downscaling and brightness diagnostics
//! - [`decoder`]: adapters over rqrr and (optionally) rxing
//! - [`scanner`]: the timer-gated scan loop, retry and result dispatch
//! - [`sink`]: result and diagnostic receivers
//! - [`storage`]: debug image dumps
//! - [`config`]: JSON configuration
//!
//! # Example
//!
//! ```ignore
//! let config = ScanConfig::load_or_default()?;
//! let source = ImageFileSource::new("frame.png");
//! let mut scanner = Scanner::new(&config, source, Arc::new(TracingSink));
//! scanner.start_scanning();
//! loop {
//!     scanner.tick(Instant::now());
//! }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod errors;
pub mod processor;
pub mod scanner;
pub mod sink;
pub mod storage;

// Re-export commonly used types
pub use backends::source::{FrameHandle, FrameSource, ImageFileSource, PixelFormat, RowOrder};
pub use config::ScanConfig;
pub use decoder::{BarcodeDecoder, DecodeResult, DecoderConfig, Symbology};
pub use errors::{ConfigError, ScanError, ScanResult};
pub use processor::PixelBuffer;
pub use scanner::{ScanLoopController, ScanOutcome, Scanner};
pub use sink::{MemorySink, ResultSink, TracingSink};
pub use storage::{DebugImageDump, DumpNaming};
