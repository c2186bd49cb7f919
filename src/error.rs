//! Error and warning types raised while building call graphs.

use crate::ir::MethodRef;

/// Failures raised by the call graph algorithms.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub(crate) enum AnalysisError {
    /// An edge was requested for a method that is not yet a node.
    #[error("call graph has no node for {method}")]
    UnknownNode { method: MethodRef },

    /// A call result type could not be derived because the callee returns nothing.
    #[error("no return statement found in {method}")]
    UnresolvedReturnType { method: MethodRef },
}

pub(crate) type AnalysisResult<T> = Result<T, AnalysisError>;

/// Dispatch site that resolved to no target method.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct AmbiguousDispatch {
    pub(crate) caller: MethodRef,
    pub(crate) signature: MethodRef,
}
