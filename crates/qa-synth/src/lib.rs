//! QA Synth - contract-pattern regression test synthesis
//!
//! Pipeline per finding:
//! 1. [`HeaderLocator`] maps the finding to a header
//! 2. a [`SignatureExtractor`] lists declarations and their doc comments
//! 3. the [`contracts`] table renders gtest cases for recognized shapes
//! 4. [`TestSynthesizer`] writes one file per finding, named by content hash
//!
//! # Example
//!
//! ```rust,ignore
//! use qa_synth::{HeaderScanner, SignatureExtractor};
//!
//! let funcs = HeaderScanner::new().extract("int safe_div(int a, int b);");
//! assert_eq!(funcs[0].name, "safe_div");
//! ```

#![warn(unreachable_pub)]

pub mod contracts;
pub mod discovery;
pub mod error;
pub mod naming;
pub mod signature;
pub mod synthesizer;

pub use contracts::{classify, render_contract, ContractKind, ContractTemplate, RenderedContract, CONTRACT_TEMPLATES};
pub use discovery::{HeaderLocator, DEFAULT_SEARCH_DEPTH};
pub use error::SynthError;
pub use naming::{generated_file_name, question_id, stable_id};
pub use signature::{ContractHints, FunctionSignature, HeaderScanner, Param, SignatureExtractor};
pub use synthesizer::{SynthesisHints, SynthesisOutput, TestSynthesizer};
