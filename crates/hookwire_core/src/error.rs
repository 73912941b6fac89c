// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while resolving and invoking a stored binding.

/// Why a single binding did not run.
///
/// Every variant aborts only the binding it was raised for; the remaining
/// bindings of the same listener still run.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// No method matches the stored name and argument shape
    #[error("no method {type_name}.{method} matches the stored arguments")]
    Unmatched {
        /// Owner type name as stored
        type_name: String,
        /// Method name as stored
        method: String,
    },

    /// The call target is missing, or has no component of the owner type
    #[error("call target unavailable: {0}")]
    UnresolvedTarget(String),

    /// An enum or static-context type name is not registered
    #[error("type not registered: {0}")]
    UnresolvedType(String),

    /// An argument was stored without a kind
    #[error("argument {0} has no value")]
    UnsetArgument(usize),

    /// The method itself failed
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Failure reported by a registered method
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationError {
    /// The method body failed
    #[error("{0}")]
    Failed(String),

    /// An argument had a different runtime type than the method expected
    #[error("argument {index} is not a {expected}")]
    ArgumentType {
        /// Argument position
        index: usize,
        /// Expected type
        expected: &'static str,
    },

    /// The receiver is not an instance of the expected component type
    #[error("receiver is not a {expected}")]
    ReceiverType {
        /// Expected Rust type
        expected: &'static str,
    },

    /// An instance method was called without a receiver
    #[error("method requires an instance receiver")]
    StaticReceiver,
}
