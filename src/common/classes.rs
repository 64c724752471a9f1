//! Lookup over the program's class declarations.
//!
//! Declaration order is semantically significant (it fixes the vtable
//! global slots and the static-attribute region), so the index keeps the
//! original slice and searches it linearly.

use crate::{
    common::ast::{OpalClass, OpalMethod, OpalTypedName},
    error::ContextualError,
};

#[derive(Debug, Clone, Copy)]
pub struct ClassIndex<'a> {
    classes: &'a [OpalClass],
}

impl<'a> ClassIndex<'a> {
    pub fn new(classes: &'a [OpalClass]) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &'a [OpalClass] {
        self.classes
    }

    pub fn get_opt(&self, name: &str) -> Option<&'a OpalClass> {
        self.classes.iter().find(|class| class.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&'a OpalClass, ContextualError> {
        self.get_opt(name)
            .ok_or_else(|| ContextualError::UnknownClass(name.to_string()))
    }

    /// Position of a class in declaration order
    /// (the global slot holding its vtable pointer).
    pub fn position(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|class| class.name == name)
    }

    /// All strict ancestors of a class, bottom-to-top.
    ///
    /// Terminates only on an acyclic hierarchy; the checker establishes
    /// that before anything else walks the chain.
    pub fn ancestors(&self, class: &'a OpalClass) -> Result<Vec<&'a OpalClass>, ContextualError> {
        let mut chain = Vec::new();
        let mut current = class;

        while let Some(extends) = &current.extends {
            current = self.get(&extends.name)?;
            chain.push(current);
        }

        Ok(chain)
    }

    /// Resolve an instance method, most-derived first: the class' own
    /// methods shadow same-named ancestor methods. Returns the owning
    /// class alongside the declaration, since labels and vtable entries
    /// are formed from the defining class.
    pub fn find_method(
        &self,
        name: &str,
        class: &'a OpalClass,
    ) -> Option<(&'a OpalClass, &'a OpalMethod)> {
        if let Some(method) = class.instance_methods.iter().find(|m| m.name == name) {
            return Some((class, method));
        }

        let extends = class.extends.as_ref()?;
        self.find_method(name, self.get_opt(&extends.name)?)
    }

    /// Resolve an instance attribute through the ancestor chain,
    /// most-derived first.
    pub fn find_instance_attribute(
        &self,
        name: &str,
        class: &'a OpalClass,
    ) -> Option<&'a OpalTypedName> {
        if let Some(attribute) = class.instance_attributes.iter().find(|a| a.name == name) {
            return Some(attribute);
        }

        let extends = class.extends.as_ref()?;
        self.find_instance_attribute(name, self.get_opt(&extends.name)?)
    }

    /// Static attributes are never inherited: own list only.
    pub fn static_attribute(
        &self,
        name: &str,
        class: &'a OpalClass,
    ) -> Option<&'a OpalTypedName> {
        class.static_attributes.iter().find(|a| a.name == name)
    }

    /// Static methods are never inherited: own list only.
    pub fn static_method(&self, name: &str, class: &'a OpalClass) -> Option<&'a OpalMethod> {
        class.static_methods.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ast::{OpalConstructor, OpalExtends, OpalStatement};

    fn class(name: &str, extends: Option<&str>) -> OpalClass {
        OpalClass {
            name: name.to_string(),
            extends: extends.map(|super_name| OpalExtends {
                name: super_name.to_string(),
                arguments: Vec::new(),
            }),
            constructor: OpalConstructor {
                name: name.to_string(),
                parameters: Vec::new(),
                body: OpalStatement::Block {
                    variables: Vec::new(),
                    statements: Vec::new(),
                },
            },
            instance_attributes: Vec::new(),
            static_attributes: Vec::new(),
            instance_methods: Vec::new(),
            static_methods: Vec::new(),
        }
    }

    fn method(name: &str, is_override: bool) -> OpalMethod {
        OpalMethod {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: None,
            is_override,
            body: OpalStatement::Return,
        }
    }

    #[test]
    fn test_lookup_and_position() {
        let classes = vec![class("Point", None), class("Circle", Some("Point"))];
        let index = ClassIndex::new(&classes);

        assert!(index.get("Point").is_ok());
        assert_eq!(index.position("Circle"), Some(1));
        assert!(matches!(
            index.get("Square"),
            Err(ContextualError::UnknownClass(name)) if name == "Square"
        ));
    }

    #[test]
    fn test_ancestor_chain_is_bottom_to_top() {
        let classes = vec![
            class("A", None),
            class("B", Some("A")),
            class("C", Some("B")),
        ];
        let index = ClassIndex::new(&classes);

        let chain = index.ancestors(index.get("C").unwrap()).unwrap();
        let names: Vec<_> = chain.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_method_resolution_shadows_ancestors() {
        let mut base = class("Shape", None);
        base.instance_methods.push(method("area", false));
        base.instance_methods.push(method("name", false));

        let mut derived = class("Circle", Some("Shape"));
        derived.instance_methods.push(method("area", true));

        let classes = vec![base, derived];
        let index = ClassIndex::new(&classes);
        let circle = index.get("Circle").unwrap();

        let (owner, _) = index.find_method("area", circle).unwrap();
        assert_eq!(owner.name, "Circle");

        let (owner, _) = index.find_method("name", circle).unwrap();
        assert_eq!(owner.name, "Shape");

        assert!(index.find_method("perimeter", circle).is_none());
    }

    #[test]
    fn test_statics_are_not_inherited() {
        let mut base = class("Shape", None);
        base.static_methods.push(method("count", false));

        let derived = class("Circle", Some("Shape"));

        let classes = vec![base, derived];
        let index = ClassIndex::new(&classes);

        assert!(index
            .static_method("count", index.get("Shape").unwrap())
            .is_some());
        assert!(index
            .static_method("count", index.get("Circle").unwrap())
            .is_none());
    }
}
