//! Program builders shared by the unit tests.

use crate::ir::{
    CallKind, Class, Expr, InvokeExpr, Method, MethodAccess, MethodRef, Statement, Value,
};
use crate::program::Program;

pub(crate) const VOID: &str = "()V";
pub(crate) const MAIN: &str = "([Ljava/lang/String;)V";

pub(crate) fn method(name: &str, body: Vec<Statement>) -> Method {
    method_with(name, VOID, false, body)
}

pub(crate) fn method_with(
    name: &str,
    descriptor: &str,
    is_static: bool,
    body: Vec<Statement>,
) -> Method {
    Method {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        access: MethodAccess {
            is_static,
            is_abstract: false,
            is_native: false,
        },
        body: Some(body),
    }
}

pub(crate) fn static_method(name: &str, body: Vec<Statement>) -> Method {
    method_with(name, VOID, true, body)
}

pub(crate) fn abstract_method(name: &str) -> Method {
    Method {
        name: name.to_string(),
        descriptor: VOID.to_string(),
        access: MethodAccess {
            is_static: false,
            is_abstract: true,
            is_native: false,
        },
        body: None,
    }
}

pub(crate) fn native_static_method(name: &str, descriptor: &str) -> Method {
    Method {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        access: MethodAccess {
            is_static: true,
            is_abstract: false,
            is_native: true,
        },
        body: None,
    }
}

pub(crate) fn main_method(body: Vec<Statement>) -> Method {
    method_with("main", MAIN, true, body)
}

pub(crate) fn constructor() -> Method {
    method("<init>", vec![return_void()])
}

pub(crate) fn class(
    name: &str,
    super_name: Option<&str>,
    interfaces: &[&str],
    methods: Vec<Method>,
) -> Class {
    Class {
        name: name.to_string(),
        super_name: super_name.map(str::to_string),
        interfaces: interfaces.iter().map(|name| name.to_string()).collect(),
        is_interface: false,
        is_abstract: false,
        methods,
    }
}

/// Concrete class with a no-op constructor and `m()`.
pub(crate) fn class_with_m(name: &str, super_name: Option<&str>, interfaces: &[&str]) -> Class {
    class(
        name,
        super_name,
        interfaces,
        vec![constructor(), method("m", vec![return_void()])],
    )
}

pub(crate) fn abstract_class(name: &str, super_name: Option<&str>, methods: Vec<Method>) -> Class {
    Class {
        is_abstract: true,
        ..class(name, super_name, &[], methods)
    }
}

pub(crate) fn interface(name: &str, methods: Vec<Method>) -> Class {
    Class {
        is_interface: true,
        is_abstract: true,
        ..class(name, None, &[], methods)
    }
}

/// Program whose entry points are the `main` methods of its classes.
pub(crate) fn program_of(classes: Vec<Class>) -> Program {
    let entry_points = Program::main_methods(&classes);
    Program::new(classes, entry_points)
}

pub(crate) fn local(name: &str) -> Value {
    Value::Local {
        name: name.to_string(),
    }
}

pub(crate) fn void(class: &str, name: &str) -> MethodRef {
    MethodRef::new(class, name, VOID)
}

pub(crate) fn main_of(class: &str) -> MethodRef {
    MethodRef::new(class, "main", MAIN)
}

/// `target = new class; specialinvoke target.<class: void <init>()>()`
pub(crate) fn allocate(target: &str, class: &str) -> Vec<Statement> {
    vec![
        Statement::Assign {
            target: local(target),
            value: Expr::New {
                class: class.to_string(),
            },
        },
        invoke(CallKind::Special, Some(local(target)), void(class, "<init>")),
    ]
}

pub(crate) fn copy(target: &str, source: &str) -> Statement {
    Statement::Assign {
        target: local(target),
        value: Expr::Use { value: local(source) },
    }
}

pub(crate) fn cast(target: &str, class: &str, source: &str) -> Statement {
    Statement::Assign {
        target: local(target),
        value: Expr::Cast {
            class: class.to_string(),
            value: local(source),
        },
    }
}

pub(crate) fn invoke(kind: CallKind, receiver: Option<Value>, method: MethodRef) -> Statement {
    Statement::Invoke {
        call: InvokeExpr {
            kind,
            method,
            receiver,
            args: Vec::new(),
        },
    }
}

pub(crate) fn call_static(class: &str, name: &str) -> Statement {
    invoke(CallKind::Static, None, void(class, name))
}

pub(crate) fn call_virtual(receiver: &str, class: &str, name: &str) -> Statement {
    invoke(CallKind::Virtual, Some(local(receiver)), void(class, name))
}

pub(crate) fn call_interface(receiver: &str, class: &str, name: &str) -> Statement {
    invoke(CallKind::Interface, Some(local(receiver)), void(class, name))
}

/// `target = class.name()` for a static method returning a reference.
pub(crate) fn assign_static(target: &str, method: MethodRef) -> Statement {
    Statement::Assign {
        target: local(target),
        value: Expr::Invoke {
            call: InvokeExpr {
                kind: CallKind::Static,
                method,
                receiver: None,
                args: Vec::new(),
            },
        },
    }
}

pub(crate) fn return_value(name: &str) -> Statement {
    Statement::Return {
        value: Some(local(name)),
    }
}

pub(crate) fn return_void() -> Statement {
    Statement::Return { value: None }
}

/// Interface `I` implemented by `X` and `Y`; only `X` is constructed and
/// reaches an `I`-typed receiver.
pub(crate) fn interface_scenario() -> Program {
    program_of(vec![
        interface("app/I", vec![abstract_method("m")]),
        class_with_m("app/X", None, &["app/I"]),
        class_with_m("app/Y", None, &["app/I"]),
        class(
            "app/Main",
            None,
            &[],
            vec![main_method(
                [
                    allocate("r1", "app/X"),
                    vec![
                        cast("r2", "app/I", "r1"),
                        call_interface("r2", "app/I", "m"),
                        return_void(),
                    ],
                ]
                .concat(),
            )],
        ),
    ])
}

pub(crate) fn factory_get() -> MethodRef {
    MethodRef::new("app/Factory", "get", "()Lapp/Base;")
}

/// `v = Factory.get(); v.m();` where `get` returns a `Z`. A sibling `W` is
/// constructed but never reaches `v`.
pub(crate) fn factory_scenario() -> Program {
    program_of(vec![
        abstract_class("app/Base", None, vec![abstract_method("m")]),
        class_with_m("app/Z", Some("app/Base"), &[]),
        class_with_m("app/W", Some("app/Base"), &[]),
        class(
            "app/Factory",
            None,
            &[],
            vec![method_with(
                "get",
                "()Lapp/Base;",
                true,
                [allocate("r0", "app/Z"), vec![return_value("r0")]].concat(),
            )],
        ),
        class(
            "app/Main",
            None,
            &[],
            vec![main_method(
                [
                    allocate("w", "app/W"),
                    vec![
                        assign_static("v", factory_get()),
                        call_virtual("v", "app/Base", "m"),
                        return_void(),
                    ],
                ]
                .concat(),
            )],
        ),
    ])
}

/// `a = new C(); loop { a = b; b = a; } b.m();` with an unrelated `D` allocation.
pub(crate) fn cycle_scenario() -> Program {
    program_of(vec![
        abstract_class("app/Base", None, vec![abstract_method("m")]),
        class_with_m("app/C", Some("app/Base"), &[]),
        class_with_m("app/D", Some("app/Base"), &[]),
        class(
            "app/Main",
            None,
            &[],
            vec![main_method(
                [
                    allocate("a", "app/C"),
                    allocate("d", "app/D"),
                    vec![
                        copy("a", "b"),
                        copy("b", "a"),
                        Statement::Other,
                        call_virtual("b", "app/Base", "m"),
                        call_virtual("a", "app/Base", "m"),
                        return_void(),
                    ],
                ]
                .concat(),
            )],
        ),
    ])
}

/// `main -> f`, `f -> f`, `f -> g`, `g -> f`.
pub(crate) fn recursion_scenario() -> Program {
    program_of(vec![
        class(
            "app/Rec",
            None,
            &[],
            vec![
                static_method(
                    "f",
                    vec![call_static("app/Rec", "f"), call_static("app/Rec", "g"), return_void()],
                ),
                static_method("g", vec![call_static("app/Rec", "f"), return_void()]),
            ],
        ),
        class(
            "app/Main",
            None,
            &[],
            vec![main_method(vec![call_static("app/Rec", "f"), return_void()])],
        ),
    ])
}

/// `main` calls `make` before `use`, so the traversal meets the dispatch in
/// `use` before the allocation in `make` has been processed.
pub(crate) fn late_instantiation_scenario() -> Program {
    program_of(vec![
        interface("app/I", vec![abstract_method("m")]),
        class_with_m("app/X", None, &["app/I"]),
        class(
            "app/Main",
            None,
            &[],
            vec![
                main_method(vec![
                    call_static("app/Main", "make"),
                    call_static("app/Main", "use"),
                    return_void(),
                ]),
                static_method(
                    "use",
                    vec![
                        Statement::Assign {
                            target: local("r"),
                            value: Expr::Use { value: shared_field() },
                        },
                        call_interface("r", "app/I", "m"),
                        return_void(),
                    ],
                ),
                static_method(
                    "make",
                    [
                        allocate("x", "app/X"),
                        vec![
                            Statement::Assign {
                                target: shared_field(),
                                value: Expr::Use { value: local("x") },
                            },
                            return_void(),
                        ],
                    ]
                    .concat(),
                ),
            ],
        ),
    ])
}

fn shared_field() -> Value {
    Value::Field {
        owner: "app/Main".to_string(),
        name: "shared".to_string(),
    }
}

/// `x = new X; x.m(); i = Main.shared; i.n();` where only `X.m` allocates the
/// `Y` that reaches `i`, so `Y.n` is found once `X.m` has been reached.
pub(crate) fn dispatch_instantiation_scenario() -> Program {
    program_of(vec![
        interface("app/I", vec![abstract_method("n")]),
        class(
            "app/X",
            None,
            &[],
            vec![
                constructor(),
                method(
                    "m",
                    [
                        allocate("y", "app/Y"),
                        vec![
                            Statement::Assign {
                                target: shared_field(),
                                value: Expr::Use { value: local("y") },
                            },
                            return_void(),
                        ],
                    ]
                    .concat(),
                ),
            ],
        ),
        class("app/Y", None, &["app/I"], vec![constructor(), method("n", vec![return_void()])]),
        class(
            "app/Main",
            None,
            &[],
            vec![main_method(
                [
                    allocate("x", "app/X"),
                    vec![
                        call_virtual("x", "app/X", "m"),
                        Statement::Assign {
                            target: local("i"),
                            value: Expr::Use { value: shared_field() },
                        },
                        call_interface("i", "app/I", "n"),
                        return_void(),
                    ],
                ]
                .concat(),
            )],
        ),
    ])
}

/// Calls on `java/lang` receivers the snapshot does not define.
pub(crate) fn library_receiver_scenario() -> Program {
    program_of(vec![class(
        "app/Main",
        None,
        &[],
        vec![main_method(
            [
                allocate("sb", "java/lang/StringBuilder"),
                vec![
                    call_virtual("sb", "java/lang/StringBuilder", "reverse"),
                    call_static("java/lang/System", "gc"),
                    return_void(),
                ],
            ]
            .concat(),
        )],
    )])
}

/// Every scenario above, for properties that must hold on any program.
pub(crate) fn all_scenarios() -> Vec<(&'static str, Program)> {
    vec![
        ("interface", interface_scenario()),
        ("factory", factory_scenario()),
        ("cycle", cycle_scenario()),
        ("recursion", recursion_scenario()),
        ("late_instantiation", late_instantiation_scenario()),
        ("dispatch_instantiation", dispatch_instantiation_scenario()),
        ("library_receiver", library_receiver_scenario()),
    ]
}
