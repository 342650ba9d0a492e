//! The full alignment pipeline.
//!
//! `parse → project → (oracle) → resolve → merge → render`. The merge runs
//! on a copy of the input document, which is only handed back when the whole
//! batch has been applied.

use crate::config::AlignConfig;
use crate::diagnostics::{Diagnostics, SpanWarning};
use crate::document::TokenDocument;
use crate::errors::{AlignResult, SpanError};
use crate::evaluate::{evaluate, Evaluation};
use crate::labels::sanitize_label;
use crate::merge::{merge, AppliedSpan};
use crate::oracle::Oracle;
use crate::parser::parse_document;
use crate::projection::{Projection, Projector};
use crate::render::render_document;
use crate::resolve::{resolve, ResolvedSpan, Span};
use crate::span_id::SpanIdSource;

/// An annotated document together with everything needed to inspect it.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub document: TokenDocument,
    /// Projection of the input document, as the oracle saw it
    pub projection: Projection,
    /// Spans written, in oracle order
    pub applied: Vec<AppliedSpan>,
    pub diagnostics: Diagnostics,
}

impl Annotated {
    pub fn render(&self) -> String {
        render_document(&self.document)
    }
}

/// Runs the pipeline for one configuration.
///
/// Holds no mutable state, so one aligner can serve independent documents
/// from several threads.
#[derive(Debug, Clone, Default)]
pub struct Aligner {
    config: AlignConfig,
    projector: Projector,
}

impl Aligner {
    pub fn new(config: AlignConfig) -> Self {
        let projector = Projector::new(&config);
        Self { config, projector }
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    pub fn project(&self, document: &TokenDocument) -> AlignResult<Projection> {
        self.projector.project(document)
    }

    /// Parse CoNLL-U and project it.
    pub fn project_text(&self, conllu: &str) -> AlignResult<(TokenDocument, Projection)> {
        let document = parse_document(conllu)?;
        let projection = self.project(&document)?;
        Ok((document, projection))
    }

    /// Check one span's label, returning the label to resolve with.
    fn check_label(
        &self,
        index: usize,
        span: &Span,
        diagnostics: &mut Diagnostics,
    ) -> Result<Span, SpanError> {
        if span.label.is_empty() {
            return Err(SpanError::EmptyLabel {
                start: span.start,
                end: span.end,
            });
        }

        let labels = &self.config.labels;
        if !labels.is_empty() && !labels.contains(&span.label) {
            diagnostics.add_warning(SpanWarning::UnknownLabel {
                index,
                label: span.label.clone(),
            });
        }

        let mut checked = span.clone();
        if let Some(written) = sanitize_label(&span.label) {
            diagnostics.add_warning(SpanWarning::RewrittenLabel {
                index,
                label: span.label.clone(),
                written: written.clone(),
            });
            checked.label = written;
        }
        Ok(checked)
    }

    /// Resolve a batch of spans, recording drops instead of failing.
    pub fn resolve_all(
        &self,
        spans: &[Span],
        projection: &Projection,
    ) -> (Vec<ResolvedSpan>, Diagnostics) {
        let mut diagnostics = Diagnostics::new(spans.len());
        let mut resolved = Vec::with_capacity(spans.len());

        for (index, span) in spans.iter().enumerate() {
            let outcome = self
                .check_label(index, span, &mut diagnostics)
                .and_then(|checked| resolve(&checked, &projection.offsets));
            match outcome {
                Ok(span) => {
                    diagnostics.record_resolved();
                    resolved.push(span);
                }
                Err(reason) => diagnostics.record_dropped(index, span, reason),
            }
        }

        (resolved, diagnostics)
    }

    /// Annotate a parsed document with spans over its projection.
    ///
    /// `document` is not modified; the annotated copy is returned.
    pub fn annotate(
        &self,
        document: &TokenDocument,
        spans: &[Span],
        ids: &mut dyn SpanIdSource,
    ) -> AlignResult<Annotated> {
        let projection = self.project(document)?;
        self.annotate_projected(document, projection, spans, ids)
    }

    fn annotate_projected(
        &self,
        document: &TokenDocument,
        projection: Projection,
        spans: &[Span],
        ids: &mut dyn SpanIdSource,
    ) -> AlignResult<Annotated> {
        let (resolved, diagnostics) = self.resolve_all(spans, &projection);

        let mut working = document.clone();
        let applied = merge(&mut working, &resolved, &self.config.namespace, ids)?;

        log::info!("annotated document: {}", diagnostics);
        Ok(Annotated {
            document: working,
            projection,
            applied,
            diagnostics,
        })
    }

    /// Parse CoNLL-U, then annotate it with the given spans.
    pub fn annotate_text(
        &self,
        conllu: &str,
        spans: &[Span],
        ids: &mut dyn SpanIdSource,
    ) -> AlignResult<Annotated> {
        let document = parse_document(conllu)?;
        self.annotate(&document, spans, ids)
    }

    /// Parse CoNLL-U, ask the oracle for spans over its raw text, annotate.
    pub fn annotate_with(
        &self,
        conllu: &str,
        oracle: &dyn Oracle,
        ids: &mut dyn SpanIdSource,
    ) -> AlignResult<Annotated> {
        let (document, projection) = self.project_text(conllu)?;
        let spans = oracle.spans(&projection.raw_text, &self.config.labels)?;
        log::info!("oracle returned {} spans", spans.len());
        self.annotate_projected(&document, projection, &spans, ids)
    }

    /// Score predicted spans against gold spans over the raw text of `conllu`.
    pub fn evaluate_text(
        &self,
        conllu: &str,
        gold: &[Span],
        predicted: &[Span],
    ) -> AlignResult<Evaluation> {
        let (_, projection) = self.project_text(conllu)?;
        Ok(evaluate(gold, predicted, projection.char_len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AlignError;
    use crate::oracle::ProportionalOracle;
    use crate::span_id::SequentialIds;

    const VETA: &str = "# sent_id = 1
# text = Test věta.
1\tTest\ttest\tNOUN\t_\t_\t0\troot\t_\t_
2\tvěta\tvěta\tNOUN\t_\t_\t1\tnmod\t_\tSpaceAfter=No
3\t.\t.\tPUNCT\t_\t_\t1\tpunct\t_\tSpaceAfter=No
";

    #[test]
    fn test_whole_sentence_span() {
        let annotated = Aligner::default()
            .annotate_text(
                VETA,
                &[Span::new(0, 10, "01_Situace")],
                &mut SequentialIds::default(),
            )
            .unwrap();

        assert_eq!(annotated.projection.raw_text, "Test věta.");
        assert!(annotated.diagnostics.is_clean());
        insta::assert_snapshot!(annotated.render(), @r###"
        # sent_id = 1
        # text = Test věta.
        1	Test	test	NOUN	_	_	0	root	_	PonkApp3:01_Situace:s1=start
        2	věta	věta	NOUN	_	_	1	nmod	_	SpaceAfter=No
        3	.	.	PUNCT	_	_	1	punct	_	SpaceAfter=No|PonkApp3:01_Situace:s1=end
        "###);
    }

    #[test]
    fn test_five_spans_two_dropped() {
        let spans = [
            Span::new(0, 4, "01_Situace"),
            Span::new(50, 60, "02_Kontext"),
            Span::new(5, 10, "03_Postup"),
            Span::new(-8, -2, "04_Proces"),
            Span::new(-5, 3, "05_Podmínky"),
        ];
        let annotated = Aligner::default()
            .annotate_text(VETA, &spans, &mut SequentialIds::default())
            .unwrap();

        let diagnostics = &annotated.diagnostics;
        assert_eq!(diagnostics.received, 5);
        assert_eq!(diagnostics.resolved, 3);
        assert_eq!(diagnostics.dropped_count(), 2);
        assert_eq!(
            diagnostics
                .dropped
                .iter()
                .map(|d| d.index)
                .collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(diagnostics
            .dropped
            .iter()
            .all(|d| matches!(d.reason, SpanError::EmptySpan { .. })));
        assert_eq!(annotated.applied.len(), 3);
    }

    #[test]
    fn test_unknown_label_is_kept() {
        let annotated = Aligner::default()
            .annotate_text(
                VETA,
                &[Span::new(0, 4, "10_Nové")],
                &mut SequentialIds::default(),
            )
            .unwrap();

        assert_eq!(annotated.diagnostics.resolved, 1);
        assert_eq!(
            annotated.diagnostics.warnings,
            vec![SpanWarning::UnknownLabel {
                index: 0,
                label: "10_Nové".to_string()
            }]
        );
        assert!(annotated.render().contains("PonkApp3:10_Nové:s1=start"));
    }

    #[test]
    fn test_label_with_space_is_rewritten() {
        let annotated = Aligner::default()
            .annotate_text(
                VETA,
                &[Span::new(0, 4, "06_ Doporučení"), Span::new(0, 4, "")],
                &mut SequentialIds::default(),
            )
            .unwrap();

        let diagnostics = &annotated.diagnostics;
        assert_eq!(diagnostics.resolved, 1);
        assert_eq!(diagnostics.warnings.len(), 2);
        assert!(matches!(
            diagnostics.dropped[0].reason,
            SpanError::EmptyLabel { .. }
        ));
        assert!(annotated.render().contains("PonkApp3:06__Doporučení:s1=start"));
    }

    #[test]
    fn test_input_document_is_unchanged() {
        let document = parse_document(VETA).unwrap();
        let before = document.clone();
        let annotated = Aligner::default()
            .annotate(
                &document,
                &[Span::new(0, 10, "01_Situace")],
                &mut SequentialIds::default(),
            )
            .unwrap();
        assert_eq!(document, before);
        assert_ne!(annotated.document, before);
    }

    #[test]
    fn test_alignment_error_aborts() {
        let broken = VETA.replace("# text = Test věta.", "# text = Jiná věta.");
        let err = Aligner::default()
            .annotate_text(
                &broken,
                &[Span::new(0, 4, "01_Situace")],
                &mut SequentialIds::default(),
            )
            .unwrap_err();
        assert!(matches!(err, AlignError::Alignment { .. }));
    }

    #[test]
    fn test_annotate_with_oracle() {
        let annotated = Aligner::default()
            .annotate_with(VETA, &ProportionalOracle, &mut SequentialIds::default())
            .unwrap();
        // 30% of 10 chars = 3, inside "Test"
        assert_eq!(annotated.diagnostics.resolved, 2);
        let first = &annotated.applied[0].span;
        assert!(first.tokens.is_single_token());
        let second = &annotated.applied[1].span;
        assert_eq!(second.tokens.start.token, 0);
        assert_eq!(second.tokens.end.token, 2);
    }

    #[test]
    fn test_evaluate_over_raw_text() {
        let gold = [Span::new(0, 4, "01_Situace"), Span::new(5, 10, "03_Postup")];
        let predicted = [Span::new(0, 10, "01_Situace")];
        let eval = Aligner::default()
            .evaluate_text(VETA, &gold, &predicted)
            .unwrap();

        assert_eq!(eval.document_length, 10);
        let situace = &eval.per_label["01_Situace"].counts;
        assert_eq!(situace.true_positives, 4);
        assert_eq!(situace.false_positives, 6);
        assert_eq!(eval.per_label["03_Postup"].counts.false_negatives, 5);
        assert_eq!(eval.label_check.gold_only, vec!["03_Postup"]);
    }
}
