//! Memory layout and label naming shared by every emission site.
//!
//! Instance objects: slot 0 holds the vtable pointer, attributes follow
//! in ancestor-first order. Globals: slots `0..N-1` hold the vtable
//! pointers of the `N` declared classes, the static attributes of all
//! classes follow, grouped by class in declaration order.

use crate::{
    common::{
        ast::{OpalClass, OpalTypedName},
        classes::ClassIndex,
    },
    error::ContextualError,
};

// region: instance layout

/// Instance attributes of a class, ancestor-first; a class' own
/// attributes come last.
pub fn all_attributes<'a>(
    classes: &ClassIndex<'a>,
    class: &'a OpalClass,
) -> Result<Vec<&'a OpalTypedName>, ContextualError> {
    let mut chain = classes.ancestors(class)?;
    chain.reverse();
    chain.push(class);

    Ok(chain
        .iter()
        .flat_map(|link| link.instance_attributes.iter())
        .collect())
}

/// 1-based heap slot of an instance attribute (slot 0 is the vtable
/// pointer). A redeclared name resolves to the most-derived slot.
pub fn attribute_offset(
    classes: &ClassIndex,
    class_name: &str,
    attribute: &str,
) -> Result<usize, ContextualError> {
    let class = classes.get(class_name)?;
    let attributes = all_attributes(classes, class)?;

    let from_end = attributes
        .iter()
        .rev()
        .position(|candidate| candidate.name == attribute)
        .ok_or_else(|| ContextualError::UnknownAttribute {
            class: class_name.to_string(),
            attribute: attribute.to_string(),
        })?;

    Ok(attributes.len() - from_end)
}

// endregion

// region: global layout

/// Global slot holding the vtable pointer of a class.
pub fn class_global_slot(classes: &ClassIndex, class_name: &str) -> Result<usize, ContextualError> {
    classes
        .position(class_name)
        .ok_or_else(|| ContextualError::UnknownClass(class_name.to_string()))
}

/// Total cell count of the static-attribute region.
pub fn static_region_size(classes: &ClassIndex) -> usize {
    classes
        .classes()
        .iter()
        .map(|class| class.static_attributes.len())
        .sum()
}

/// Global slot of a static attribute: past the vtable pointers, past
/// every earlier class' statics, at the attribute's declared position.
pub fn static_attribute_offset(
    classes: &ClassIndex,
    class_name: &str,
    attribute: &str,
) -> Result<usize, ContextualError> {
    let mut offset = classes.classes().len();

    for class in classes.classes() {
        if class.name == class_name {
            let position = class
                .static_attributes
                .iter()
                .position(|candidate| candidate.name == attribute)
                .ok_or_else(|| ContextualError::UnknownStaticAttribute {
                    class: class_name.to_string(),
                    attribute: attribute.to_string(),
                })?;

            return Ok(offset + position);
        }

        offset += class.static_attributes.len();
    }

    Err(ContextualError::UnknownClass(class_name.to_string()))
}

// endregion

// region: vtable

/// Dispatch table of a concrete class: one slot per dynamically
/// dispatchable method, ancestor-first, declaration order within each
/// class. An override keeps the ancestor's slot and only changes the
/// owning class the label is formed from.
#[derive(Debug)]
pub struct Vtable {
    entries: Vec<VtableEntry>,
}

#[derive(Debug)]
pub struct VtableEntry {
    pub method: String,
    pub owner: String,
}

impl Vtable {
    pub fn build(classes: &ClassIndex, class: &OpalClass) -> Result<Self, ContextualError> {
        let mut chain = classes.ancestors(class)?;
        chain.reverse();
        chain.push(class);

        let mut entries: Vec<VtableEntry> = Vec::new();
        for link in chain {
            for method in &link.instance_methods {
                match entries.iter_mut().find(|entry| entry.method == method.name) {
                    Some(entry) => entry.owner = link.name.clone(),
                    None => entries.push(VtableEntry {
                        method: method.name.clone(),
                        owner: link.name.clone(),
                    }),
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[VtableEntry] {
        &self.entries
    }

    /// 0-based dispatch slot of a method.
    pub fn offset(&self, method: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.method == method)
    }
}

// endregion

// region: labels

/// Code label of a method: class name, byte length of the method name,
/// method name. Instance and static methods share this flat namespace.
pub fn method_label(class_name: &str, method_name: &str) -> String {
    format!("{class_name}_{}_{method_name}", method_name.len())
}

/// Code label of a constructor.
pub fn constructor_label(class_name: &str) -> String {
    format!("_CTOR_{class_name}_")
}

// endregion
