//! Small lopdf helpers shared by the normalizer and the compositor.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Result;

/// Name of the object variant, for error messages.
pub(crate) fn type_name(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "Null",
        Object::Boolean(_) => "Boolean",
        Object::Integer(_) => "Integer",
        Object::Real(_) => "Real",
        Object::Name(_) => "Name",
        Object::String(..) => "String",
        Object::Array(_) => "Array",
        Object::Dictionary(_) => "Dictionary",
        Object::Stream(_) => "Stream",
        Object::Reference(_) => "Reference",
    }
}

/// Follows one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Looks `key` up on the page dictionary, then on each ancestor.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut cur: &Dictionary = doc.get_object(page_id)?.as_dict()?;
    let mut seen = vec![page_id];
    loop {
        if let Ok(obj) = cur.get(key) {
            return Ok(Some(obj));
        }
        match cur.get(b"Parent") {
            Ok(Object::Reference(pid)) if !seen.contains(pid) => {
                seen.push(*pid);
                cur = doc.get_object(*pid)?.as_dict()?;
            }
            _ => return Ok(None),
        }
    }
}

/// Owned copy of a dictionary given directly or by reference.
pub(crate) fn owned_dict(doc: &Document, obj: &Object) -> Result<Dictionary> {
    Ok(resolve(doc, obj)?.as_dict()?.clone())
}

/// The page's resource dictionary (inherited if needed) as an owned copy,
/// empty when there is none.
pub(crate) fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    match inherited(doc, page_id, b"Resources")? {
        Some(obj) => owned_dict(doc, obj),
        None => Ok(Dictionary::new()),
    }
}

/// Copies every indirect object reachable from `root` out of `doc`.
/// `/Parent` back-links are not followed.
pub(crate) fn collect_closure(
    doc: &Document,
    root: &Object,
) -> Result<BTreeMap<ObjectId, Object>> {
    let mut found = BTreeMap::new();
    let mut pending = Vec::new();
    push_refs(root, &mut pending);
    while let Some(id) = pending.pop() {
        if found.contains_key(&id) {
            continue;
        }
        let obj = doc.get_object(id)?.clone();
        push_refs(&obj, &mut pending);
        found.insert(id, obj);
    }
    Ok(found)
}

fn push_refs(obj: &Object, out: &mut Vec<ObjectId>) {
    match obj {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|o| push_refs(o, out)),
        Object::Dictionary(dict) => push_dict_refs(dict, out),
        Object::Stream(stream) => push_dict_refs(&stream.dict, out),
        _ => {}
    }
}

fn push_dict_refs(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    for (key, value) in dict.iter() {
        if key.as_slice() != b"Parent" {
            push_refs(value, out);
        }
    }
}

/// Rewrites references in place through `map`; unmapped references are
/// replaced with null so nothing points back into a foreign document.
pub(crate) fn remap_refs(obj: &mut Object, map: &BTreeMap<ObjectId, ObjectId>) {
    match obj {
        Object::Reference(id) => {
            let replacement = map.get(id).map_or(Object::Null, |new_id| Object::Reference(*new_id));
            *obj = replacement;
        }
        Object::Array(items) => items.iter_mut().for_each(|o| remap_refs(o, map)),
        Object::Dictionary(dict) => remap_dict_refs(dict, map),
        Object::Stream(stream) => remap_dict_refs(&mut stream.dict, map),
        _ => {}
    }
}

pub(crate) fn remap_dict_refs(dict: &mut Dictionary, map: &BTreeMap<ObjectId, ObjectId>) {
    for (_, value) in dict.iter_mut() {
        remap_refs(value, map);
    }
}

/// Every name bound in any category of a resource dictionary.
pub(crate) fn resource_names(doc: &Document, resources: &Dictionary) -> BTreeSet<Vec<u8>> {
    let mut names = BTreeSet::new();
    for (_, category) in resources.iter() {
        if let Ok(Object::Dictionary(entries)) = resolve(doc, category) {
            names.extend(entries.iter().map(|(name, _)| name.clone()));
        }
    }
    names
}
