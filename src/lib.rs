//! Alignment between CoNLL-U token annotations and character-offset spans.
//!
//! A classification oracle labels the plain text of a document with
//! `[start, end)` character spans. This crate produces that plain text from
//! CoNLL-U, maps the spans back onto tokens, and writes them into the MISC
//! column as `<namespace>:<label>:<span-id>=start|end` markers.
//!
//! ## Modules
//!
//! - [`document`] / [`misc`] - The CoNLL-U model
//! - [`parser`] / [`render`] - Reading and writing CoNLL-U
//! - [`projection`] / [`offsets`] - Raw text and its character-to-token table
//! - [`resolve`] - Mapping spans onto token ranges
//! - [`merge`] / [`span_id`] - Writing markers into token metadata
//! - [`pipeline`] - The whole flow with [`Diagnostics`]
//! - [`readback`] / [`report`] - Inspecting annotated documents
//! - [`evaluate`] - Character-level scores of predicted spans against gold
//!
//! ## Example
//!
//! ```
//! use conllu_align::{Aligner, SequentialIds, Span};
//!
//! let conllu = "# text = Test věta.\n\
//! 1\tTest\t_\t_\t_\t_\t_\t_\t_\t_\n\
//! 2\tvěta\t_\t_\t_\t_\t_\t_\t_\tSpaceAfter=No\n\
//! 3\t.\t_\t_\t_\t_\t_\t_\t_\t_\n";
//!
//! let annotated = Aligner::default()
//!     .annotate_text(conllu, &[Span::new(0, 10, "01_Situace")], &mut SequentialIds::default())
//!     .unwrap();
//! assert_eq!(annotated.diagnostics.resolved, 1);
//! assert!(annotated.render().contains("PonkApp3:01_Situace:s1=start"));
//! ```

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod evaluate;
pub mod labels;
pub mod merge;
pub mod misc;
pub mod offsets;
pub mod oracle;
pub mod parser;
pub mod pipeline;
pub mod projection;
pub mod readback;
pub mod render;
pub mod report;
pub mod resolve;
pub mod span_id;
pub mod spans;

// Re-exports for convenient access to core types
pub use config::AlignConfig;
pub use diagnostics::{Diagnostics, DroppedSpan, SpanWarning};
pub use document::{
    ExtraLine, Interleaved, MultiwordToken, Sentence, SurfaceUnit, Token, TokenDocument,
    TokenPosition, TokenRange,
};
pub use errors::{AlignError, AlignResult, SpanError};
pub use evaluate::{char_labels, evaluate, CharCounts, Evaluation, LabelCheck, LabelMetrics, Scores};
pub use labels::{Label, LabelSet};
pub use merge::{merge, AppliedSpan, Boundary, Marker};
pub use misc::{Misc, MiscEntry};
pub use offsets::{OffsetEntry, OffsetTable, Owner};
pub use oracle::{Oracle, ProportionalOracle, StaticOracle};
pub use parser::parse_document;
pub use pipeline::{Aligner, Annotated};
pub use projection::{
    project, AuthoritativeText, JoinedTokens, Projection, ProjectionMode, Projector,
    SentenceStrategy,
};
pub use readback::{find_markers, recover_spans, FoundMarker, RecoveredSpan};
pub use render::render_document;
pub use report::format_report;
pub use resolve::{resolve, ResolvedSpan, Span};
pub use span_id::{RandomIds, SequentialIds, SpanIdSource};
pub use spans::{load_spans, parse_spans_json};
