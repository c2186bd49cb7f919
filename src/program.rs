use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::warn;

use crate::ir::{Class, Method, MethodRef, Statement};

const MAIN_NAME: &str = "main";
const MAIN_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

/// Read-only view of a loaded program used by the call graph algorithms.
pub(crate) trait ProgramModel: Sync {
    fn entry_points(&self) -> Vec<MethodRef>;

    fn has_body(&self, method: &MethodRef) -> bool;

    /// Body statements, empty for methods without a body.
    fn statements(&self, method: &MethodRef) -> &[Statement];

    /// True when the snapshot defines `class`.
    fn has_class(&self, class: &str) -> bool;

    /// All methods that may receive a call to `signature` on a receiver whose
    /// static type is `declaring_class`.
    fn resolve_overrides(
        &self,
        declaring_class: &str,
        signature: &MethodRef,
    ) -> BTreeSet<MethodRef>;

    /// Method executed for `signature` when the receiver's runtime class is `receiver_class`.
    fn dispatch(&self, receiver_class: &str, signature: &MethodRef) -> Option<MethodRef>;

    fn is_subtype(&self, sub: &str, sup: &str) -> bool;

    /// True when the class can be instantiated.
    fn is_concrete(&self, class: &str) -> bool;
}

/// In-memory program snapshot with precomputed subtype links.
#[derive(Debug, Default)]
pub(crate) struct Program {
    classes: BTreeMap<String, Class>,
    /// Direct subclasses and implementors keyed by supertype name.
    subtypes: BTreeMap<String, BTreeSet<String>>,
    entry_points: Vec<MethodRef>,
}

impl Program {
    /// Build a program. The first definition of a class name wins.
    pub(crate) fn new(classes: Vec<Class>, entry_points: Vec<MethodRef>) -> Self {
        let mut by_name = BTreeMap::new();
        for class in classes {
            if by_name.contains_key(&class.name) {
                warn!(class = %class.name, "duplicate class definition ignored");
                continue;
            }
            by_name.insert(class.name.clone(), class);
        }

        let mut subtypes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for class in by_name.values() {
            for parent in class.super_name.iter().chain(class.interfaces.iter()) {
                subtypes
                    .entry(parent.clone())
                    .or_default()
                    .insert(class.name.clone());
            }
        }

        Self {
            classes: by_name,
            subtypes,
            entry_points,
        }
    }

    /// Static `main(String[])` methods declared on the given classes.
    pub(crate) fn main_methods<'a>(classes: impl IntoIterator<Item = &'a Class>) -> Vec<MethodRef> {
        classes
            .into_iter()
            .flat_map(|class| {
                class
                    .methods
                    .iter()
                    .filter(|method| {
                        method.access.is_static
                            && method.name == MAIN_NAME
                            && method.descriptor == MAIN_DESCRIPTOR
                    })
                    .map(|method| MethodRef::new(&class.name, &method.name, &method.descriptor))
            })
            .collect()
    }

    pub(crate) fn class(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    pub(crate) fn method(&self, method: &MethodRef) -> Option<&Method> {
        self.class(&method.class)?
            .methods
            .iter()
            .find(|candidate| {
                candidate.name == method.name && candidate.descriptor == method.descriptor
            })
    }

    /// `class` followed by every transitive subtype, breadth first.
    fn subtypes_inclusive(&self, class: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([class.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(children) = self.subtypes.get(&current) {
                queue.extend(children.iter().cloned());
            }
            order.push(current);
        }
        order
    }

    /// Non-abstract method declared directly on `class` matching `signature`.
    fn declared_implementation(&self, class: &str, signature: &MethodRef) -> Option<MethodRef> {
        let method = self.method(&signature.with_class(class))?;
        if method.access.is_abstract {
            return None;
        }
        Some(signature.with_class(class))
    }

    /// Default method inherited through the superinterfaces of `class` and its superclasses.
    fn default_implementation(&self, class: &str, signature: &MethodRef) -> Option<MethodRef> {
        let mut queue = VecDeque::new();
        let mut current = self.class(class);
        while let Some(entry) = current {
            queue.extend(entry.interfaces.iter().cloned());
            current = entry.super_name.as_deref().and_then(|name| self.class(name));
        }

        let mut seen = BTreeSet::new();
        while let Some(interface) = queue.pop_front() {
            if !seen.insert(interface.clone()) {
                continue;
            }
            if let Some(found) = self.declared_implementation(&interface, signature) {
                if self.has_body(&found) {
                    return Some(found);
                }
            }
            if let Some(entry) = self.class(&interface) {
                queue.extend(entry.interfaces.iter().cloned());
            }
        }
        None
    }
}

impl ProgramModel for Program {
    fn entry_points(&self) -> Vec<MethodRef> {
        self.entry_points.clone()
    }

    fn has_body(&self, method: &MethodRef) -> bool {
        self.method(method)
            .map(|method| {
                !method.access.is_abstract && !method.access.is_native && method.body.is_some()
            })
            .unwrap_or(false)
    }

    fn statements(&self, method: &MethodRef) -> &[Statement] {
        if !self.has_body(method) {
            return &[];
        }
        self.method(method)
            .and_then(|method| method.body.as_deref())
            .unwrap_or(&[])
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn resolve_overrides(
        &self,
        declaring_class: &str,
        signature: &MethodRef,
    ) -> BTreeSet<MethodRef> {
        self.subtypes_inclusive(declaring_class)
            .iter()
            .filter(|class| self.is_concrete(class))
            .filter_map(|class| self.dispatch(class, signature))
            .collect()
    }

    fn dispatch(&self, receiver_class: &str, signature: &MethodRef) -> Option<MethodRef> {
        let mut current = Some(receiver_class);
        while let Some(class) = current {
            if let Some(found) = self.declared_implementation(class, signature) {
                return Some(found);
            }
            current = self
                .class(class)
                .and_then(|entry| entry.super_name.as_deref());
        }
        self.default_implementation(receiver_class, signature)
    }

    fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([sub.to_string()]);
        while let Some(current) = queue.pop_front() {
            if current == sup {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(entry) = self.class(&current) {
                queue.extend(entry.super_name.iter().cloned());
                queue.extend(entry.interfaces.iter().cloned());
            }
        }
        false
    }

    fn is_concrete(&self, class: &str) -> bool {
        self.class(class)
            .map(|entry| !entry.is_interface && !entry.is_abstract)
            .unwrap_or(false)
    }
}
