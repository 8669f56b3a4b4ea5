//! Diagnostics shared by the lexer, parser, and checker.
//!
//! Every reportable problem is a [`Diag`]: one severity, one message, one
//! primary source location, and optionally supporting locations and a fix
//! suggestion. The single-primary shape is deliberate: a Dieter diagnostic
//! always has exactly one offending site (the bad token, the argument that
//! failed to unify, the bestow outside its module), with earlier declaration
//! sites attached as [`RelatedSite`]s.
//!
//! Dispatch-probe rejections never reach this type. The checker keeps them as
//! unification failures and converts only the final no-applicable-candidate
//! verdict into a diagnostic; everything that does become a `Diag` is meant
//! for the user.

use crate::ast::Span;
use miette::{Diagnostic, LabeledSpan, Report, Severity};
use std::fmt;

/// Severity of a diagnostic.
///
/// The checker rejects a program only on errors; warnings accompany a
/// successful outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagSeverity {
    /// Rejects the program.
    Error,
    /// Reported, but the program is still accepted.
    Warning,
}

/// A supporting source location: an earlier declaration, a first definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedSite {
    /// The supporting span.
    pub span: Span,
    /// Why this location matters.
    pub note: String,
}

/// A diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    /// Severity of this diagnostic.
    pub severity: DiagSeverity,
    /// The main message.
    pub message: String,
    /// The primary location.
    pub span: Span,
    /// Text shown at the primary location.
    pub label: String,
    /// Supporting locations.
    pub related: Vec<RelatedSite>,
    /// Optional fix suggestion.
    pub help: Option<String>,
}

impl Diag {
    /// Creates an error at a source location.
    pub fn error(span: Span, message: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            severity: DiagSeverity::Error,
            message: message.into(),
            span,
            label: label.into(),
            related: Vec::new(),
            help: None,
        }
    }

    /// Creates a warning at a source location.
    pub fn warning(span: Span, message: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            severity: DiagSeverity::Warning,
            ..Self::error(span, message, label)
        }
    }

    /// Attaches a supporting location.
    pub fn related(mut self, span: Span, note: impl Into<String>) -> Self {
        self.related.push(RelatedSite {
            span,
            note: note.into(),
        });
        self
    }

    /// Attaches a fix suggestion.
    pub fn suggest(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Source text plus rendering of diagnostics against it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    content: String,
    name: Option<String>,
}

impl SourceFile {
    /// Creates a source file from text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: None,
        }
    }

    /// Creates a named source file.
    pub fn with_name(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: Some(name.into()),
        }
    }

    /// Returns the source text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the file name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Renders a diagnostic as a miette report with this source attached.
    ///
    /// The primary location becomes the primary label, related sites become
    /// secondary labels on the same report. Spans are clamped to the source,
    /// so rendering never panics on a span synthesized past the end of input.
    pub fn render(&self, diag: &Diag) -> Report {
        let mut labels = vec![LabeledSpan::new_primary_with_span(
            Some(diag.label.clone()),
            self.clamp(&diag.span),
        )];
        for site in &diag.related {
            labels.push(LabeledSpan::new_with_span(
                Some(site.note.clone()),
                self.clamp(&site.span),
            ));
        }

        let rendered = RenderedDiag {
            message: diag.message.clone(),
            severity: match diag.severity {
                DiagSeverity::Error => Severity::Error,
                DiagSeverity::Warning => Severity::Warning,
            },
            help: diag.help.clone(),
            labels,
        };

        let report = Report::new(rendered);
        match self.name() {
            Some(name) => {
                report.with_source_code(miette::NamedSource::new(name, self.content.clone()))
            }
            None => report.with_source_code(self.content.clone()),
        }
    }

    /// Renders a batch of diagnostics.
    pub fn render_all(&self, diags: &[Diag]) -> Vec<Report> {
        diags.iter().map(|diag| self.render(diag)).collect()
    }

    /// Clamps a span to this source, as a miette offset and length.
    fn clamp(&self, span: &Span) -> (usize, usize) {
        let len = self.content.len();
        let start = span.start.min(len);
        let end = span.end.clamp(start, len);
        (start, end - start)
    }
}

/// Carrier implementing miette's `Diagnostic` for a rendered [`Diag`].
#[derive(Debug)]
struct RenderedDiag {
    message: String,
    severity: Severity,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for RenderedDiag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RenderedDiag {}

impl Diagnostic for RenderedDiag {
    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        // The primary label always exists.
        Some(Box::new(self.labels.clone().into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_carries_primary_location() {
        let diag = Diag::error(4..9, "undefined qualifier 'beefy'", "no module of this name");
        assert_eq!(diag.severity, DiagSeverity::Error);
        assert_eq!(diag.span, 4..9);
        assert_eq!(diag.label, "no module of this name");
        assert!(diag.related.is_empty());
        assert!(diag.help.is_none());
    }

    #[test]
    fn related_and_suggest_accumulate() {
        let diag = Diag::error(20..25, "duplicate module 'person'", "declared again here")
            .related(0..6, "first declared here")
            .suggest("pick a different module name");

        assert_eq!(diag.related.len(), 1);
        assert_eq!(diag.related[0].span, 0..6);
        assert_eq!(diag.related[0].note, "first declared here");
        assert_eq!(diag.help.as_deref(), Some("pick a different module name"));
    }

    #[test]
    fn warning_does_not_change_the_rest() {
        let diag = Diag::warning(0..3, "shadowed variable", "shadows an outer declaration");
        assert_eq!(diag.severity, DiagSeverity::Warning);
        assert_eq!(diag.span, 0..3);
    }

    #[test]
    fn render_produces_report_with_message() {
        let src = SourceFile::with_name("module m end.", "person.dtr");
        let diag = Diag::error(7..8, "undefined qualifier 'beefy'", "here");
        let report = src.render(&diag);
        assert_eq!(report.to_string(), "undefined qualifier 'beefy'");
    }

    #[test]
    fn render_never_panics_on_wild_spans() {
        let src = SourceFile::new("x");
        let diag = Diag::error(40..90, "boom", "past the end")
            .related(7..2, "inverted span");
        let report = src.render(&diag);
        assert_eq!(report.to_string(), "boom");
    }

    #[test]
    fn clamp_bounds_offset_and_length() {
        let src = SourceFile::new("module m end.");
        assert_eq!(src.clamp(&(0..50)), (0, 13));
        assert_eq!(src.clamp(&(20..30)), (13, 0));
        let inverted = std::ops::Range { start: 5, end: 2 };
        assert_eq!(src.clamp(&inverted), (5, 0));
    }

    #[test]
    fn render_all_preserves_order() {
        let src = SourceFile::new("order a < b");
        let diags = vec![
            Diag::error(0..5, "first", "here"),
            Diag::error(6..7, "second", "there"),
        ];
        let reports = src.render_all(&diags);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].to_string(), "first");
        assert_eq!(reports[1].to_string(), "second");
    }
}
