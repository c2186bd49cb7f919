#![allow(dead_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Intermediate representation for a loaded JVM class.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Class {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) super_name: Option<String>,
    #[serde(default)]
    pub(crate) interfaces: Vec<String>,
    #[serde(default)]
    pub(crate) is_interface: bool,
    #[serde(default)]
    pub(crate) is_abstract: bool,
    #[serde(default)]
    pub(crate) methods: Vec<Method>,
}

/// Intermediate representation for a method and its statement body.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Method {
    pub(crate) name: String,
    pub(crate) descriptor: String,
    #[serde(default)]
    pub(crate) access: MethodAccess,
    /// Absent for abstract and native methods.
    #[serde(default)]
    pub(crate) body: Option<Vec<Statement>>,
}

/// Method access flags relevant to dispatch.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub(crate) struct MethodAccess {
    #[serde(default)]
    pub(crate) is_static: bool,
    #[serde(default)]
    pub(crate) is_abstract: bool,
    #[serde(default)]
    pub(crate) is_native: bool,
}

/// Identity of a method: declaring class plus signature.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub(crate) struct MethodRef {
    pub(crate) class: String,
    pub(crate) name: String,
    pub(crate) descriptor: String,
}

impl MethodRef {
    pub(crate) fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub(crate) fn declaring_class(&self) -> &str {
        &self.class
    }

    pub(crate) fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub(crate) fn with_class(&self, class: &str) -> MethodRef {
        MethodRef::new(class, self.name.clone(), self.descriptor.clone())
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.class, self.name, self.descriptor)
    }
}

/// Statement of a method body in three-address form.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub(crate) enum Statement {
    Assign { target: Value, value: Expr },
    Invoke { call: InvokeExpr },
    Return {
        #[serde(default)]
        value: Option<Value>,
    },
    Other,
}

impl Statement {
    /// Call expression carried by this statement, if it is an invoke site.
    pub(crate) fn invoke(&self) -> Option<&InvokeExpr> {
        match self {
            Statement::Invoke { call } => Some(call),
            Statement::Assign {
                value: Expr::Invoke { call },
                ..
            } => Some(call),
            _ => None,
        }
    }
}

/// Right-hand side of an assignment.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub(crate) enum Expr {
    New { class: String },
    Use { value: Value },
    Cast { class: String, value: Value },
    Invoke { call: InvokeExpr },
    Constant,
}

/// Program value that can hold a reference.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(tag = "value", rename_all = "snake_case")]
pub(crate) enum Value {
    Local { name: String },
    This,
    Parameter { index: usize },
    Field { owner: String, name: String },
}

/// Call expression inside a statement.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct InvokeExpr {
    pub(crate) kind: CallKind,
    pub(crate) method: MethodRef,
    #[serde(default)]
    pub(crate) receiver: Option<Value>,
    #[serde(default)]
    pub(crate) args: Vec<Value>,
}

impl InvokeExpr {
    pub(crate) fn classify(&self) -> CallKind {
        self.kind
    }

    pub(crate) fn signature(&self) -> &MethodRef {
        &self.method
    }

    /// Receiver value; static calls have none.
    pub(crate) fn receiver(&self) -> Option<&Value> {
        match self.kind {
            CallKind::Virtual | CallKind::Interface | CallKind::Special => {
                self.receiver.as_ref()
            }
            CallKind::Static => None,
        }
    }

    /// Constructor call that allocates, as opposed to `this`/`super` chaining.
    pub(crate) fn is_instantiation(&self) -> bool {
        self.kind == CallKind::Special
            && self.method.is_constructor()
            && self.receiver != Some(Value::This)
    }
}

/// Call classification used by dispatch resolution.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CallKind {
    Virtual,
    Interface,
    Special,
    Static,
}

impl CallKind {
    pub(crate) fn is_dispatched(self) -> bool {
        matches!(self, CallKind::Virtual | CallKind::Interface)
    }
}
