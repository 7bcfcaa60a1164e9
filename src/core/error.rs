//! Error handling for viewmill
//!
//! This module provides the error types and user-friendly error reporting for the
//! view resolution engine. The error system is designed around two core principles:
//! 1. **Strongly-typed errors** for precise error handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! The error system consists of two main types:
//! - [`ViewmillError`] - Enumerated error types for all failure cases in viewmill
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Error Categories
//!
//! Errors are organized into several categories:
//! - **Configuration**: [`ViewmillError::ConfigError`], [`ViewmillError::UnknownDirective`],
//!   [`ViewmillError::AssetNotFound`], [`ViewmillError::CyclicInheritance`], etc.
//! - **Validation**: [`ViewmillError::ValidationError`] raised during registry build
//! - **Lookup**: [`ViewmillError::ViewNotDefined`], [`ViewmillError::TemplateNotFound`],
//!   [`ViewmillError::ModuleNotFound`]
//! - **Rendering**: [`ViewmillError::AccessDenied`], [`ViewmillError::ProviderNotFound`]
//! - **Registry protection**: [`ViewmillError::WriteNotAllowed`]
//!
//! Configuration and validation errors are fatal to the registry build; no view can
//! be served until the configuration is fixed. Lookup and rendering errors are local
//! to a single render call.
//!
//! # Error Conversion and Context
//!
//! Common library errors are automatically converted:
//! - [`std::io::Error`] → [`ViewmillError::IoError`]
//! - [`toml::de::Error`] → [`ViewmillError::TomlError`]
//! - [`serde_json::Error`] → [`ViewmillError::JsonError`]
//! - [`tera::Error`] → [`ViewmillError::TemplateError`]
//!
//! Use [`user_friendly_error`] to convert any error into a user-friendly format with
//! contextual suggestions.
//!
//! # Examples
//!
//! ```rust,no_run
//! use viewmill::core::{ViewmillError, ErrorContext, user_friendly_error};
//!
//! fn lookup() -> Result<(), ViewmillError> {
//!     Err(ViewmillError::ViewNotDefined { id: "articles/home".to_string() })
//! }
//!
//! match lookup() {
//!     Ok(_) => println!("found"),
//!     Err(e) => {
//!         let ctx = user_friendly_error(anyhow::Error::from(e));
//!         ctx.display(); // Shows colored error with suggestions
//!     }
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for viewmill operations
///
/// This enum represents all possible errors that can occur while synthesizing,
/// validating, resolving, and rendering view definitions. Each variant is designed
/// to provide specific context about the failure and enable appropriate error
/// handling strategies.
///
/// # Design Philosophy
///
/// - **Specific Error Types**: Each error variant represents a specific failure mode
/// - **Rich Context**: Errors include relevant details like definition ids, paths,
///   and fragment sources
/// - **User-Friendly**: Error messages are written for end users, not just developers
/// - **Actionable**: Most errors provide clear guidance on how to resolve the issue
///
/// # Examples
///
/// ## Pattern Matching on Errors
///
/// ```rust,no_run
/// use viewmill::core::ViewmillError;
///
/// fn handle_error(error: ViewmillError) {
///     match error {
///         ViewmillError::ProjectNotFound => {
///             eprintln!("Run from a directory containing viewmill.toml");
///         }
///         ViewmillError::ViewNotDefined { id } => {
///             eprintln!("No view registered under '{}'", id);
///         }
///         ViewmillError::AccessDenied { id } => {
///             eprintln!("Access to '{}' requires authentication", id);
///         }
///         _ => {
///             eprintln!("Unexpected error: {}", error);
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum ViewmillError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Project file (viewmill.toml) not found
    ///
    /// This error occurs when viewmill cannot locate a viewmill.toml file in the
    /// current directory or any parent directory up to the filesystem root.
    #[error("Project file viewmill.toml not found in current directory or any parent directory")]
    ProjectNotFound,

    /// Project file parsing error
    #[error("Invalid project file syntax in {file}")]
    ProjectParseError {
        /// Path to the project file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// Fragment file parsing error
    #[error("Invalid fragment syntax in {file}")]
    FragmentParseError {
        /// Path to the fragment file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// Unknown directive key in a module entry
    ///
    /// Any key carrying the reserved `@` prefix other than the recognized
    /// directives (`@inherits`, `@path`) is a configuration error, raised
    /// during synthesis before any definition is produced.
    #[error("Unknown directive '{directive}' in module '{module}' ({fragment})")]
    UnknownDirective {
        /// The unrecognized directive key, including the sigil
        directive: String,
        /// Module entry carrying the directive
        module: String,
        /// Fragment source path for diagnostics
        fragment: String,
    },

    /// Relative asset path did not resolve to an existing file
    #[error("Asset '{path}' not found for module '{module}' ({fragment})")]
    AssetNotFound {
        /// The asset path as written in the fragment
        path: String,
        /// Module entry declaring the asset
        module: String,
        /// Fragment source path the asset was resolved against
        fragment: String,
    },

    /// `@inherits` names a module with no merged entry
    #[error("Module '{module}' inherits from unknown module '{target}'")]
    MissingInheritanceTarget {
        /// Module carrying the directive
        module: String,
        /// The inheritance target that does not exist
        target: String,
    },

    /// Cyclic inheritance detected
    ///
    /// Raised both for `@inherits` cycles between module entries during
    /// synthesis and for parent-pointer cycles in the module descriptor graph.
    ///
    /// # Fields
    /// - `chain`: the cycle, rendered as `a -> b -> a`
    #[error("Cyclic inheritance detected: {chain}")]
    CyclicInheritance {
        /// String representation of the inheritance cycle
        chain: String,
    },

    /// Definition validation failed
    #[error("View definition '{id}' is missing required property '{property}'")]
    ValidationError {
        /// Identifier of the offending definition
        id: String,
        /// The required property that is empty or absent
        property: String,
    },

    /// View identifier not present in the registry
    #[error("View '{id}' is not defined")]
    ViewNotDefined {
        /// The identifier that was looked up
        id: String,
    },

    /// Module descriptor lookup failed
    #[error("Module '{id}' is not declared in the project file")]
    ModuleNotFound {
        /// The module identifier that was looked up
        id: String,
    },

    /// No template candidate resolved to an existing file
    #[error("No template found for view '{id}'")]
    TemplateNotFound {
        /// Identifier of the view being rendered
        id: String,
        /// Every candidate path that was probed, in order
        tried: Vec<String>,
    },

    /// Access predicate rejected the render
    #[error("Access denied for view '{id}'")]
    AccessDenied {
        /// Identifier of the view that was denied
        id: String,
    },

    /// Named provider is not registered for the module
    #[error("Provider '{name}' not registered for module '{module}'")]
    ProviderNotFound {
        /// Module the view belongs to
        module: String,
        /// The provider name that failed to resolve
        name: String,
    },

    /// Mutation attempted on the read-only registry
    #[error("View registry is read-only: cannot write '{id}'")]
    WriteNotAllowed {
        /// The identifier the caller attempted to write
        id: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Template engine error
    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for ViewmillError {
    fn clone(&self) -> Self {
        match self {
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::ProjectNotFound => Self::ProjectNotFound,
            Self::ProjectParseError {
                file,
                reason,
            } => Self::ProjectParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::FragmentParseError {
                file,
                reason,
            } => Self::FragmentParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::UnknownDirective {
                directive,
                module,
                fragment,
            } => Self::UnknownDirective {
                directive: directive.clone(),
                module: module.clone(),
                fragment: fragment.clone(),
            },
            Self::AssetNotFound {
                path,
                module,
                fragment,
            } => Self::AssetNotFound {
                path: path.clone(),
                module: module.clone(),
                fragment: fragment.clone(),
            },
            Self::MissingInheritanceTarget {
                module,
                target,
            } => Self::MissingInheritanceTarget {
                module: module.clone(),
                target: target.clone(),
            },
            Self::CyclicInheritance {
                chain,
            } => Self::CyclicInheritance {
                chain: chain.clone(),
            },
            Self::ValidationError {
                id,
                property,
            } => Self::ValidationError {
                id: id.clone(),
                property: property.clone(),
            },
            Self::ViewNotDefined {
                id,
            } => Self::ViewNotDefined {
                id: id.clone(),
            },
            Self::ModuleNotFound {
                id,
            } => Self::ModuleNotFound {
                id: id.clone(),
            },
            Self::TemplateNotFound {
                id,
                tried,
            } => Self::TemplateNotFound {
                id: id.clone(),
                tried: tried.clone(),
            },
            Self::AccessDenied {
                id,
            } => Self::AccessDenied {
                id: id.clone(),
            },
            Self::ProviderNotFound {
                module,
                name,
            } => Self::ProviderNotFound {
                module: module.clone(),
                name: name.clone(),
            },
            Self::WriteNotAllowed {
                id,
            } => Self::WriteNotAllowed {
                id: id.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::TemplateError(e) => Self::Other {
                message: format!("Template error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps a [`ViewmillError`] and adds optional user-friendly
/// messages, suggestions for resolution, and additional details. This is the
/// primary way viewmill presents errors to CLI users.
///
/// # Display Format
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use viewmill::core::{ViewmillError, ErrorContext};
///
/// let context = ErrorContext::new(ViewmillError::ProjectNotFound)
///     .with_suggestion("Create a viewmill.toml file in your project directory")
///     .with_details("viewmill searches current and parent directories for viewmill.toml");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying viewmill error
    pub error: ViewmillError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`ViewmillError`]
    ///
    /// This creates a basic error context with no additional suggestions or
    /// details. Use [`with_suggestion`] and [`with_details`] to add
    /// user-friendly information.
    ///
    /// [`with_suggestion`]: ErrorContext::with_suggestion
    /// [`with_details`]: ErrorContext::with_details
    #[must_use]
    pub const fn new(error: ViewmillError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    ///
    /// Suggestions should be actionable steps that users can take to resolve
    /// the error. They are displayed in green in the terminal.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    ///
    /// Details provide context about why the error occurred or what it means.
    /// They are displayed in yellow in the terminal.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Create an [`ErrorContext`] with only a suggestion (no specific error)
    ///
    /// This is useful for generic errors where you want to provide a suggestion
    /// but don't have a specific [`ViewmillError`] variant.
    pub fn suggestion(suggestion: impl Into<String>) -> Self {
        Self {
            error: ViewmillError::Other {
                message: String::new(),
            },
            suggestion: Some(suggestion.into()),
            details: None,
        }
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// This method prints the error, details, and suggestion to stderr using
    /// color coding:
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Extension trait for converting [`ViewmillError`] to [`anyhow::Error`] with context
pub trait IntoAnyhowWithContext {
    /// Convert the error to an [`anyhow::Error`] with the provided context
    fn into_anyhow_with_context(self, context: ErrorContext) -> anyhow::Error;
}

impl IntoAnyhowWithContext for ViewmillError {
    fn into_anyhow_with_context(self, context: ErrorContext) -> anyhow::Error {
        anyhow::Error::new(ErrorContext {
            error: self,
            suggestion: context.suggestion,
            details: context.details,
        })
    }
}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// This function is the main entry point for converting arbitrary errors into
/// user-friendly error messages for CLI display. It recognizes common error types
/// and provides appropriate context and suggestions.
///
/// # Error Recognition
///
/// The function recognizes and provides specific handling for:
/// - [`ViewmillError`] variants with tailored suggestions
/// - [`std::io::Error`] with filesystem-specific guidance
/// - [`toml::de::Error`] with TOML syntax help
/// - Template rendering errors with Tera syntax guidance
/// - Generic errors with the full error chain
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(vm_error) = error.downcast_ref::<ViewmillError>() {
        return create_error_context(vm_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ViewmillError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion(
                    "Check file ownership or run with permissions to read the project tree",
                )
                .with_details("viewmill could not read or write a file it needs");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ViewmillError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details("A required file or directory cannot be found");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(ViewmillError::ProjectParseError {
            file: "viewmill.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax. Verify quotes, brackets, and indentation")
        .with_details("TOML parsing errors are usually caused by syntax issues like missing quotes or mismatched brackets");
    }

    if let Some(tera_error) = error.downcast_ref::<tera::Error>() {
        let mut message = tera_error.to_string();
        let mut source = std::error::Error::source(tera_error);
        while let Some(cause) = source {
            message.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }

        return ErrorContext::new(ViewmillError::Other {
            message,
        })
        .with_suggestion(
            "Check template syntax: variables use {{ var }}, comments use {# #}, control flow uses {% %}. \
             Ensure all variables referenced in the template exist in the bound context",
        )
        .with_details(
            "Template errors occur when Tera cannot render the template. Common issues:\n\
             - Undefined variables (use {% if var is defined %} to check)\n\
             - Syntax errors (unclosed {{ or {% delimiters)\n\
             - Invalid filters or functions",
        );
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> = error
        .chain()
        .skip(1) // Skip the root cause which is already in to_string()
        .map(std::string::ToString::to_string)
        .collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ViewmillError::Other {
        message,
    })
}

/// Create appropriate [`ErrorContext`] with suggestions for specific viewmill errors
///
/// This internal function maps each [`ViewmillError`] variant to an appropriate
/// [`ErrorContext`] with tailored suggestions and details. It's used by
/// [`user_friendly_error`] to provide consistent, helpful error messages.
fn create_error_context(error: ViewmillError) -> ErrorContext {
    match &error {
        ViewmillError::ProjectNotFound => ErrorContext::new(ViewmillError::ProjectNotFound)
            .with_suggestion("Create a viewmill.toml file in your project directory, or pass --project <dir>")
            .with_details("viewmill looks for viewmill.toml in the current directory and parent directories up to the filesystem root"),

        ViewmillError::ProjectParseError { file, reason } => ErrorContext::new(ViewmillError::ProjectParseError {
            file: file.clone(),
            reason: reason.clone(),
        })
            .with_suggestion(format!(
                "Check the TOML syntax in {file}. Common issues: missing quotes, unmatched brackets, invalid characters"
            ))
            .with_details(reason.clone()),

        ViewmillError::FragmentParseError { file, reason } => ErrorContext::new(ViewmillError::FragmentParseError {
            file: file.clone(),
            reason: reason.clone(),
        })
            .with_suggestion(format!("Check the TOML syntax in {file}"))
            .with_details(reason.clone()),

        ViewmillError::UnknownDirective { directive, module, fragment } => ErrorContext::new(ViewmillError::UnknownDirective {
            directive: directive.clone(),
            module: module.clone(),
            fragment: fragment.clone(),
        })
            .with_suggestion("Recognized directives are '@inherits' and '@path'. Remove or rename the offending key")
            .with_details(format!(
                "Keys prefixed with '@' are synthesis directives, not view options. '{directive}' is not a recognized directive"
            )),

        ViewmillError::AssetNotFound { path, module, fragment } => ErrorContext::new(ViewmillError::AssetNotFound {
            path: path.clone(),
            module: module.clone(),
            fragment: fragment.clone(),
        })
            .with_suggestion(format!(
                "Verify that '{path}' exists relative to the fragment directory, or set '@path' to the correct base directory"
            ))
            .with_details(format!(
                "Relative asset paths are resolved against the directory of the declaring fragment ({fragment})"
            )),

        ViewmillError::MissingInheritanceTarget { module, target } => ErrorContext::new(ViewmillError::MissingInheritanceTarget {
            module: module.clone(),
            target: target.clone(),
        })
            .with_suggestion(format!(
                "Define views for module '{target}' in a fragment, or remove the '@inherits' directive from '{module}'"
            ))
            .with_details("'@inherits' can only name a module that has its own view configuration"),

        ViewmillError::CyclicInheritance { chain } => ErrorContext::new(ViewmillError::CyclicInheritance {
            chain: chain.clone(),
        })
            .with_suggestion("Review the '@inherits' directives and module parents, and break the cycle")
            .with_details(format!(
                "Inheritance chain detected: {chain}. Modules cannot inherit from themselves directly or indirectly"
            )),

        ViewmillError::ValidationError { id, property } => ErrorContext::new(ViewmillError::ValidationError {
            id: id.clone(),
            property: property.clone(),
        })
            .with_suggestion(format!(
                "Set a non-empty '{property}' for view '{id}' in its fragment"
            ))
            .with_details("Every view definition requires non-empty 'title', 'type', 'module', and 'renders' properties"),

        ViewmillError::ViewNotDefined { id } => ErrorContext::new(ViewmillError::ViewNotDefined {
            id: id.clone(),
        })
            .with_suggestion("Run 'viewmill list' to see the registered view identifiers")
            .with_details("View identifiers take the form '<module>/<type>'"),

        ViewmillError::ModuleNotFound { id } => ErrorContext::new(ViewmillError::ModuleNotFound {
            id: id.clone(),
        })
            .with_suggestion(format!(
                "Add a [modules.\"{id}\"] entry to viewmill.toml with the module's path"
            ))
            .with_details("Template resolution walks the module hierarchy declared in the project file"),

        ViewmillError::TemplateNotFound { id, tried } => ErrorContext::new(ViewmillError::TemplateNotFound {
            id: id.clone(),
            tried: tried.clone(),
        })
            .with_suggestion("Create one of the candidate template files, or check the module's 'templates' directory")
            .with_details(format!("Tried, in order:\n  {}", tried.join("\n  "))),

        ViewmillError::AccessDenied { id } => ErrorContext::new(ViewmillError::AccessDenied {
            id: id.clone(),
        })
            .with_suggestion("Authenticate, or remove the access callback from the view definition")
            .with_details(format!("The access predicate configured for '{id}' rejected the request")),

        ViewmillError::ProviderNotFound { module, name } => ErrorContext::new(ViewmillError::ProviderNotFound {
            module: module.clone(),
            name: name.clone(),
        })
            .with_suggestion(format!(
                "Register a provider factory named '{name}' for module '{module}' before rendering"
            ))
            .with_details("Views with a 'provider' option need a matching entry in the provider registry"),

        ViewmillError::WriteNotAllowed { id } => ErrorContext::new(ViewmillError::WriteNotAllowed {
            id: id.clone(),
        })
            .with_suggestion("Change the view configuration fragments and rebuild instead of mutating the registry")
            .with_details("The registry is immutable once built; definitions only change through synthesis"),

        _ => ErrorContext::new(error.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ViewmillError::ProjectNotFound;
        assert_eq!(
            error.to_string(),
            "Project file viewmill.toml not found in current directory or any parent directory"
        );

        let error = ViewmillError::ViewNotDefined {
            id: "articles/home".to_string(),
        };
        assert_eq!(error.to_string(), "View 'articles/home' is not defined");

        let error = ViewmillError::UnknownDirective {
            directive: "@weight".to_string(),
            module: "articles".to_string(),
            fragment: "fragments/views.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unknown directive '@weight' in module 'articles' (fragments/views.toml)"
        );

        let error = ViewmillError::WriteNotAllowed {
            id: "articles/home".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "View registry is read-only: cannot write 'articles/home'"
        );
    }

    #[test]
    fn test_error_context() {
        let ctx = ErrorContext::new(ViewmillError::ProjectNotFound)
            .with_suggestion("Create a viewmill.toml file")
            .with_details("viewmill.toml declares modules and search roots");

        assert_eq!(ctx.suggestion, Some("Create a viewmill.toml file".to_string()));
        assert_eq!(
            ctx.details,
            Some("viewmill.toml declares modules and search roots".to_string())
        );
    }

    #[test]
    fn test_error_context_display() {
        let ctx =
            ErrorContext::new(ViewmillError::ProjectNotFound).with_suggestion("Create the file");

        let display = format!("{ctx}");
        assert!(display.contains("viewmill.toml not found"));
        assert!(display.contains("Create the file"));
    }

    #[test]
    fn test_user_friendly_error_not_found() {
        use std::io::{Error, ErrorKind};

        let io_error = Error::new(ErrorKind::NotFound, "file not found");
        let anyhow_error = anyhow::Error::from(io_error);

        let ctx = user_friendly_error(anyhow_error);
        match ctx.error {
            ViewmillError::IoError(_) => {}
            _ => panic!("Expected IoError"),
        }
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_view_not_defined() {
        let error = ViewmillError::ViewNotDefined {
            id: "articles/list".to_string(),
        };
        let ctx = user_friendly_error(anyhow::Error::from(error));

        match ctx.error {
            ViewmillError::ViewNotDefined {
                ref id,
            } => assert_eq!(id, "articles/list"),
            _ => panic!("Expected ViewNotDefined"),
        }
        assert!(ctx.suggestion.as_deref().unwrap_or_default().contains("viewmill list"));
    }

    #[test]
    fn test_user_friendly_error_template_not_found_lists_candidates() {
        let error = ViewmillError::TemplateNotFound {
            id: "articles/list".to_string(),
            tried: vec!["a/list.tera".to_string(), "a/list.html".to_string()],
        };
        let ctx = user_friendly_error(anyhow::Error::from(error));

        let details = ctx.details.expect("details expected");
        assert!(details.contains("a/list.tera"));
        assert!(details.contains("a/list.html"));
    }

    #[test]
    fn test_clone_preserves_structured_variants() {
        let error = ViewmillError::ValidationError {
            id: "articles/home".to_string(),
            property: "title".to_string(),
        };
        let cloned = error.clone();
        assert_eq!(error.to_string(), cloned.to_string());
    }

    #[test]
    fn test_clone_io_error_degrades_to_other() {
        let error = ViewmillError::IoError(std::io::Error::other("boom"));
        match error.clone() {
            ViewmillError::Other {
                message,
            } => assert!(message.contains("boom")),
            _ => panic!("Expected Other"),
        }
    }

    #[test]
    fn test_user_friendly_error_generic_includes_chain() {
        let inner = anyhow::anyhow!("root cause");
        let outer = inner.context("outer failure");
        let ctx = user_friendly_error(outer);

        match ctx.error {
            ViewmillError::Other {
                ref message,
            } => {
                assert!(message.contains("outer failure"));
                assert!(message.contains("Caused by"));
                assert!(message.contains("root cause"));
            }
            _ => panic!("Expected Other"),
        }
    }
}
