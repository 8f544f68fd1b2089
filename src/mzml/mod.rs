//! # mzML Parser Module
//!
//! This module provides streaming extraction of scan records from mzML files,
//! the XML-based community standard for mass spectrometry data defined by
//! HUPO-PSI.
//!
//! ## Design Goals
//!
//! - **Streaming**: Process arbitrarily large files without loading into memory
//! - **Selective**: Keep only the per-spectrum scalars QC summaries need
//! - **Lazy**: Records are produced one at a time, in document order
//!
//! ## mzML Structure
//!
//! ```text
//! indexedmzML (optional wrapper)
//! └── mzML
//!     ├── cvList (controlled vocabularies)
//!     ├── fileDescription
//!     ├── softwareList
//!     ├── dataProcessingList
//!     │   └── processingMethod
//!     │       └── userParam* (demultiplexing marker lives here)
//!     └── run
//!         └── spectrumList
//!             └── spectrum* (many)
//!                 ├── cvParam*
//!                 ├── scanList
//!                 ├── precursorList (for MS2+)
//!                 └── binaryDataArrayList (skipped unread)
//! ```

mod cv_params;
mod models;
mod streamer;

pub use cv_params::{CvParam, MS_CV_ACCESSIONS};
pub use models::*;
pub use streamer::{
    detect_demultiplexing, MzMLError, ScanRecordIterator, ScanRecordStreamer,
    DEMULTIPLEXING_USER_PARAM,
};
