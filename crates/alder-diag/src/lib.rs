//! Error reporting and diagnostics for Alder.
//!
//! This crate provides structured diagnostics with source location tracking.
//! Diagnostics are created by other crates (for example, `alder-infer` and
//! `alder-syntax`) and rendered here for display.

use std::fmt;

// ---------------------------------------------------------------------------
// Diagnostic severity and categories
// ---------------------------------------------------------------------------

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Source text does not parse as valid Alder syntax.
    Syntax,
    /// A symbol with the same name and namespace already exists in the
    /// current scope or an enclosing one.
    Redeclaration,
    /// A program is missing its module declaration.
    MissingModule,
    /// An enum declares the same member twice.
    DuplicateEnumMember,
    /// A type or enum declaration repeats a type parameter name.
    DuplicateTypeParameter,
    /// Identifier lookup failed in every enclosing scope.
    UnknownReference,
    /// Two types that must agree do not.
    TypeMismatch,
    /// A call target resolved to something that is not callable.
    NotCallable,
    /// `Enum.X` where `X` is not a declared member.
    UnknownEnumMember,
    /// Two enums of different identity were unified.
    EnumMismatch,
    /// No unification rule applies to the constraint.
    CouldNotUnify,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Syntax,
        Category::Redeclaration,
        Category::MissingModule,
        Category::DuplicateEnumMember,
        Category::DuplicateTypeParameter,
        Category::UnknownReference,
        Category::TypeMismatch,
        Category::NotCallable,
        Category::UnknownEnumMember,
        Category::EnumMismatch,
        Category::CouldNotUnify,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Syntax => "syntax",
            Category::Redeclaration => "redeclaration",
            Category::MissingModule => "missing_module",
            Category::DuplicateEnumMember => "duplicate_enum_member",
            Category::DuplicateTypeParameter => "duplicate_type_parameter",
            Category::UnknownReference => "unknown_reference",
            Category::TypeMismatch => "type_mismatch",
            Category::NotCallable => "not_callable",
            Category::UnknownEnumMember => "unknown_enum_member",
            Category::EnumMismatch => "enum_mismatch",
            Category::CouldNotUnify => "could_not_unify",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::Syntax => "E0001",
            Category::Redeclaration => "E0002",
            Category::MissingModule => "E0003",
            Category::DuplicateEnumMember => "E0004",
            Category::DuplicateTypeParameter => "E0005",
            Category::UnknownReference => "E0006",
            Category::TypeMismatch => "E0007",
            Category::NotCallable => "E0008",
            Category::UnknownEnumMember => "E0009",
            Category::EnumMismatch => "E0010",
            Category::CouldNotUnify => "E0011",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Syntax => "Source text does not parse as valid Alder syntax.",
            Category::Redeclaration => {
                "A value or type symbol is declared twice in one scope chain."
            }
            Category::MissingModule => "A program has no `module` declaration.",
            Category::DuplicateEnumMember => "An enum or variant type repeats a member.",
            Category::DuplicateTypeParameter => {
                "A declaration repeats a type parameter name."
            }
            Category::UnknownReference => {
                "A referenced identifier is not defined in any enclosing scope."
            }
            Category::TypeMismatch => "Expression type does not match expected type.",
            Category::NotCallable => "Only functions can be called.",
            Category::UnknownEnumMember => "The enum does not declare this member.",
            Category::EnumMismatch => "Values of two different enums were mixed.",
            Category::CouldNotUnify => "No unification rule applies to these types.",
        }
    }

    pub fn example_fix(self) -> &'static str {
        match self {
            Category::Syntax => "Fix parser-reported syntax near the highlighted span.",
            Category::Redeclaration => "Rename one of the declarations; shadowing is not allowed.",
            Category::MissingModule => "Start the file with `module Some.Name`.",
            Category::DuplicateEnumMember => "Remove or rename the repeated member.",
            Category::DuplicateTypeParameter => "Give each type parameter a distinct name.",
            Category::UnknownReference => "Define the missing name or fix the spelling.",
            Category::TypeMismatch => "Adjust the expression to match the expected type.",
            Category::NotCallable => "Call a function value, or remove the call parentheses.",
            Category::UnknownEnumMember => "Use one of the members the enum declares.",
            Category::EnumMismatch => "Construct the value from the expected enum.",
            Category::CouldNotUnify => "Add annotations so both sides name the same shape.",
        }
    }
}

// ---------------------------------------------------------------------------
// Source locations (independent of alder-ast's Span)
// ---------------------------------------------------------------------------

/// A source location for diagnostics.
///
/// Uses byte offsets. Callers convert from `alder-ast` spans to this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file_id: u32,
    pub start: u32,
    pub end: u32,
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
///
/// Every diagnostic carries enough context to produce an actionable error
/// message without exposing internal compiler state.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. E0007).
    pub code: Option<String>,
    pub severity: Severity,
    pub category: Category,
    /// Primary message: what went wrong.
    pub message: String,
    /// Where it went wrong.
    pub location: Option<SourceLocation>,
    /// Additional labeled spans (e.g., "first declaration was here").
    pub labels: Vec<DiagLabel>,
    /// Suggested fix, if any.
    pub help: Option<String>,
}

/// A labeled source span within a diagnostic.
#[derive(Debug, Clone)]
pub struct DiagLabel {
    pub location: SourceLocation,
    pub message: String,
}

impl Diagnostic {
    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            code: Some(category.code().to_string()),
            severity: Severity::Error,
            category,
            message: message.into(),
            location: None,
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self {
            code: Some(category.code().to_string()),
            severity: Severity::Warning,
            category,
            message: message.into(),
            location: None,
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_label(mut self, location: SourceLocation, message: impl Into<String>) -> Self {
        self.labels.push(DiagLabel {
            location,
            message: message.into(),
        });
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        if let Some(code) = &self.code {
            write!(f, "{prefix}[{code}]: {}", self.message)?;
        } else {
            write!(f, "{prefix}: {}", self.message)?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error type for crates that produce diagnostics
// ---------------------------------------------------------------------------

/// Error type wrapping one or more diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.first().map(|d| d.to_string()).unwrap_or_default())]
pub struct DiagnosticError(pub Vec<Diagnostic>);

impl DiagnosticError {
    pub fn single(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }

    pub fn multiple(diags: Vec<Diagnostic>) -> Self {
        Self(diags)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }

    /// The category of the first diagnostic, if any.
    pub fn category(&self) -> Option<Category> {
        self.0.first().map(|d| d.category)
    }
}
