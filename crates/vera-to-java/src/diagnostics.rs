// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Rendering of translation errors and warnings as source diagnostics

use crate::error::{TranslationError, TranslationWarning};
use anyhow::Result;
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{self, termcolor::Buffer, termcolor::WriteColor};
use vera_model::Loc;

/// Source files keyed by the `file` index used in `Loc`
pub type SourceFiles = SimpleFiles<String, String>;

fn labels(loc: Loc, message: &str) -> Vec<Label<usize>> {
    if loc == Loc::default() {
        return vec![];
    }
    vec![Label::primary(loc.file, loc.range()).with_message(message)]
}

impl TranslationError {
    pub fn code(&self) -> &'static str {
        match self {
            TranslationError::Unsupported { .. } => "E0001",
            TranslationError::Conversion { .. } => "E0002",
            TranslationError::Resolution { .. } => "E0003",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let (label, notes) = match self {
            TranslationError::Unsupported { construct, .. } => {
                (format!("{} is not translated", construct), vec![])
            }
            TranslationError::Conversion { from, to, .. } => {
                (format!("{} value used where {} is required", from, to), vec![])
            }
            TranslationError::Resolution { candidates, .. } => (
                "no applicable candidate".to_string(),
                candidates
                    .iter()
                    .map(|c| format!("rejected {}", c))
                    .collect(),
            ),
        };
        Diagnostic::new(Severity::Error)
            .with_code(self.code())
            .with_message(self.to_string())
            .with_labels(labels(self.loc(), &label))
            .with_notes(notes)
    }
}

impl TranslationWarning {
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Warning)
            .with_code(self.kind.code())
            .with_message(&self.message)
            .with_labels(labels(self.loc, ""))
    }
}

/// Write diagnostics for `errors` and `warnings` to `writer`
pub fn emit_diagnostics(
    files: &SourceFiles,
    errors: &[TranslationError],
    warnings: &[TranslationWarning],
    writer: &mut dyn WriteColor,
) -> Result<()> {
    let config = term::Config::default();
    let diagnostics = errors
        .iter()
        .map(|e| e.to_diagnostic())
        .chain(warnings.iter().map(|w| w.to_diagnostic()));
    for diagnostic in diagnostics {
        term::emit(writer, &config, files, &diagnostic)?;
    }
    Ok(())
}

/// Render diagnostics without color, for logs and tests
pub fn render_diagnostics(
    files: &SourceFiles,
    errors: &[TranslationError],
    warnings: &[TranslationWarning],
) -> Result<String> {
    let mut buffer = Buffer::no_color();
    emit_diagnostics(files, errors, warnings, &mut buffer)?;
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}
