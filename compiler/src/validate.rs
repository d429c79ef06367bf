use std::collections::{HashMap, HashSet};

use crate::ast::{Document, ServiceKind, Type, Value};
use crate::error::{Diagnostic, QuillError};
use crate::strcase;
use crate::token::Token;

/// Whole-bag semantic validation over every parsed document. Checks run in a
/// fixed order and the first failure halts the run. The only mutations are
/// resolving variable constants in place and filling in auto-assigned error
/// codes, so a second pass over an already-validated bag is a no-op.
pub fn validate(docs: &mut [Document]) -> Result<(), QuillError> {
    check_casing(docs)?;
    check_unique_names(docs)?;
    resolve_constants(docs)?;
    check_custom_types(docs)?;
    assign_error_codes(docs)?;
    check_rpc_streams(docs)?;
    check_http_stream_placement(docs)?;
    check_byte_arrays(docs)?;

    Ok(())
}

fn error_at(tok: &Token, message: &str) -> QuillError {
    QuillError::Diagnostic(Diagnostic::new(tok, message))
}

fn check_casing(docs: &[Document]) -> Result<(), QuillError> {
    for doc in docs {
        for c in &doc.consts {
            if !strcase::is_pascal(c.identifier.name()) {
                return Err(error_at(&c.identifier.token, "name should be PascalCase"));
            }
        }

        for e in &doc.enums {
            if !strcase::is_pascal(e.name.name()) {
                return Err(error_at(&e.name.token, "name should be PascalCase"));
            }

            for set in &e.sets {
                if set.name.name() == "_" {
                    continue;
                }

                if !strcase::is_pascal(set.name.name()) {
                    return Err(error_at(&set.name.token, "name should be PascalCase"));
                }
            }
        }

        for m in &doc.models {
            if !strcase::is_pascal(m.name.name()) {
                return Err(error_at(&m.name.token, "name should be PascalCase"));
            }

            for f in &m.fields {
                if !strcase::is_pascal(f.name.name()) {
                    return Err(error_at(&f.name.token, "name should be PascalCase"));
                }

                for o in &f.options.list {
                    if !strcase::is_pascal(o.name.name()) {
                        return Err(error_at(&o.name.token, "name should be PascalCase"));
                    }
                }
            }
        }

        for s in &doc.services {
            if !strcase::is_pascal(s.name.name()) {
                return Err(error_at(&s.name.token, "name should be PascalCase"));
            }

            for m in &s.methods {
                if !strcase::is_pascal(m.name.name()) {
                    return Err(error_at(&m.name.token, "name should be PascalCase"));
                }

                for a in &m.args {
                    if !strcase::is_camel(a.name.name()) {
                        return Err(error_at(&a.name.token, "name should be camelCase"));
                    }
                }

                for r in &m.returns {
                    if !strcase::is_camel(r.name.name()) {
                        return Err(error_at(&r.name.token, "name should be camelCase"));
                    }
                }

                for o in &m.options.list {
                    if !strcase::is_pascal(o.name.name()) {
                        return Err(error_at(&o.name.token, "name should be PascalCase"));
                    }
                }
            }
        }

        for e in &doc.errors {
            if !strcase::is_pascal(e.name.name()) {
                return Err(error_at(&e.name.token, "name should be PascalCase"));
            }
        }
    }

    Ok(())
}

fn check_unique_names(docs: &[Document]) -> Result<(), QuillError> {
    let mut names: HashSet<&str> = HashSet::new();

    for doc in docs {
        for c in &doc.consts {
            if !names.insert(c.identifier.name()) {
                return Err(error_at(&c.identifier.token, "name is already used"));
            }
        }
    }

    for doc in docs {
        for e in &doc.enums {
            if !names.insert(e.name.name()) {
                return Err(error_at(&e.name.token, "name is already used"));
            }

            let mut keys: HashSet<&str> = HashSet::new();
            for set in &e.sets {
                if set.name.name() == "_" {
                    continue;
                }

                if !keys.insert(set.name.name()) {
                    return Err(error_at(&set.name.token, "key is already used in the same enum"));
                }
            }
        }
    }

    for doc in docs {
        for m in &doc.models {
            if !names.insert(m.name.name()) {
                return Err(error_at(&m.name.token, "name is already used"));
            }

            let mut fields: HashSet<&str> = HashSet::new();
            for f in &m.fields {
                if !fields.insert(f.name.name()) {
                    return Err(error_at(
                        &f.name.token,
                        "field name is already used in the same model",
                    ));
                }

                let mut options: HashSet<&str> = HashSet::new();
                for o in &f.options.list {
                    if !options.insert(o.name.name()) {
                        return Err(error_at(
                            &o.name.token,
                            "option name is already used in the same field",
                        ));
                    }
                }
            }
        }
    }

    for doc in docs {
        for s in &doc.services {
            if !names.insert(s.name.name()) {
                return Err(error_at(&s.name.token, "name is already used"));
            }

            let mut methods: HashSet<&str> = HashSet::new();
            for m in &s.methods {
                if !methods.insert(m.name.name()) {
                    return Err(error_at(
                        &m.name.token,
                        "method name is already used in the same service",
                    ));
                }

                let mut args: HashSet<&str> = HashSet::new();
                for a in &m.args {
                    if !args.insert(a.name.name()) {
                        return Err(error_at(
                            &a.name.token,
                            "argument name is already used in the same method",
                        ));
                    }

                    if a.name.name() == "err" {
                        return Err(error_at(&a.name.token, "err is a reserved name"));
                    }
                }

                let mut returns: HashSet<&str> = HashSet::new();
                for r in &m.returns {
                    if !returns.insert(r.name.name()) {
                        return Err(error_at(
                            &r.name.token,
                            "return name is already used in the same method",
                        ));
                    }

                    if r.name.name() == "err" {
                        return Err(error_at(&r.name.token, "err is a reserved name"));
                    }

                    if args.contains(r.name.name()) {
                        return Err(error_at(
                            &r.name.token,
                            "return name is already used in the same method as argument",
                        ));
                    }
                }

                let mut options: HashSet<&str> = HashSet::new();
                for o in &m.options.list {
                    if !options.insert(o.name.name()) {
                        return Err(error_at(
                            &o.name.token,
                            "option name is already used in the same method",
                        ));
                    }
                }
            }
        }
    }

    for doc in docs {
        for e in &doc.errors {
            if !names.insert(e.name.name()) {
                return Err(error_at(&e.name.token, "name is already used"));
            }
        }
    }

    Ok(())
}

/// Follows a variable chain through the constant map. The recursion depth is
/// capped at the number of declared constants, which also catches cycles.
fn find_const_value(
    const_map: &HashMap<String, Value>,
    name: &str,
    depth: usize,
) -> Option<Value> {
    if depth > const_map.len() {
        return None;
    }

    match const_map.get(name)? {
        Value::Variable(v) => find_const_value(const_map, &v.token.value, depth + 1),
        value => Some(value.clone()),
    }
}

fn resolve_value(const_map: &HashMap<String, Value>, value: &mut Value) -> Result<(), QuillError> {
    if let Value::Variable(variable) = value {
        match find_const_value(const_map, &variable.token.value, 0) {
            Some(resolved) => *value = resolved,
            None => return Err(error_at(&variable.token, "constant is not defined")),
        }
    }

    Ok(())
}

fn resolve_constants(docs: &mut [Document]) -> Result<(), QuillError> {
    let const_map: HashMap<String, Value> = docs
        .iter()
        .flat_map(|doc| &doc.consts)
        .map(|c| (c.identifier.name().to_string(), c.value.clone()))
        .collect();

    for doc in docs.iter_mut() {
        for c in &mut doc.consts {
            resolve_value(&const_map, &mut c.value)?;
        }

        for m in &mut doc.models {
            for f in &mut m.fields {
                for o in &mut f.options.list {
                    resolve_value(&const_map, &mut o.value)?;
                }
            }
        }

        for s in &mut doc.services {
            for m in &mut s.methods {
                for o in &mut m.options.list {
                    resolve_value(&const_map, &mut o.value)?;
                }
            }
        }
    }

    Ok(())
}

fn check_type_exists(types: &HashSet<&str>, typ: &Type) -> Result<(), QuillError> {
    match typ {
        Type::Map { value, .. } => check_type_exists(types, value),
        Type::Array { elem, .. } => check_type_exists(types, elem),
        Type::Custom { token } => {
            if !types.contains(token.value.as_str()) {
                return Err(error_at(token, "type is not defined"));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_custom_types(docs: &[Document]) -> Result<(), QuillError> {
    let mut types: HashSet<&str> = HashSet::new();

    for doc in docs {
        for m in &doc.models {
            types.insert(m.name.name());
        }

        for e in &doc.enums {
            types.insert(e.name.name());
        }
    }

    for doc in docs {
        for m in &doc.models {
            for f in &m.fields {
                check_type_exists(&types, &f.typ)?;
            }
        }

        for s in &doc.services {
            for m in &s.methods {
                for a in &m.args {
                    check_type_exists(&types, &a.typ)?;
                }

                for r in &m.returns {
                    check_type_exists(&types, &r.typ)?;
                }
            }
        }
    }

    Ok(())
}

/// Zero-coded errors receive unique codes strictly greater than every
/// explicit code, assigned in name-sorted order so the result does not
/// depend on the order the input files were supplied in.
fn assign_error_codes(docs: &mut [Document]) -> Result<(), QuillError> {
    let mut order: Vec<(usize, usize)> = Vec::new();
    for (di, doc) in docs.iter().enumerate() {
        for ei in 0..doc.errors.len() {
            order.push((di, ei));
        }
    }

    order.sort_by(|&(ad, ae), &(bd, be)| {
        docs[ad].errors[ae]
            .name
            .name()
            .cmp(docs[bd].errors[be].name.name())
    });

    let mut max_code: i64 = 0;
    let mut reserved: HashSet<i64> = HashSet::new();

    for &(di, ei) in &order {
        let e = &docs[di].errors[ei];
        if reserved.contains(&e.code) {
            return Err(error_at(&e.token, "code is already used"));
        }
        if e.code != 0 {
            reserved.insert(e.code);
            max_code = max_code.max(e.code);
        }
    }

    for &(di, ei) in &order {
        if docs[di].errors[ei].code == 0 {
            max_code += 1;
            docs[di].errors[ei].code = max_code;
        }
    }

    Ok(())
}

fn check_rpc_streams(docs: &[Document]) -> Result<(), QuillError> {
    for doc in docs {
        for s in &doc.services {
            if s.kind != ServiceKind::Rpc {
                continue;
            }

            for m in &s.methods {
                for a in &m.args {
                    if a.stream {
                        return Err(error_at(&a.name.token, "stream is not allowed in rpc service"));
                    }
                }

                for r in &m.returns {
                    if r.stream {
                        return Err(error_at(&r.name.token, "stream is not allowed in rpc service"));
                    }
                }
            }
        }
    }

    Ok(())
}

fn check_http_stream_placement(docs: &[Document]) -> Result<(), QuillError> {
    for doc in docs {
        for s in &doc.services {
            if s.kind != ServiceKind::Http {
                continue;
            }

            for m in &s.methods {
                let mut has_stream = false;
                for (i, a) in m.args.iter().enumerate() {
                    if a.stream {
                        if has_stream {
                            return Err(error_at(&a.name.token, "stream should be the last argument"));
                        }
                        has_stream = true;
                    } else if has_stream {
                        return Err(error_at(
                            &m.args[i - 1].name.token,
                            "stream should be the last argument",
                        ));
                    }
                }

                has_stream = false;
                for (i, r) in m.returns.iter().enumerate() {
                    if r.stream {
                        if has_stream {
                            return Err(error_at(
                                &r.name.token,
                                "stream should be the only return type",
                            ));
                        }
                        has_stream = true;
                    } else if has_stream {
                        return Err(error_at(
                            &m.returns[i - 1].name.token,
                            "stream should be the only return type",
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

fn check_byte_arrays(docs: &[Document]) -> Result<(), QuillError> {
    for doc in docs {
        for m in &doc.models {
            for f in &m.fields {
                if let Some(byte_tok) = f.typ.array_of_byte() {
                    return Err(QuillError::Diagnostic(Diagnostic::spanning(
                        f.typ.token(),
                        byte_tok,
                        "byte array is not allowed in model fields",
                    )));
                }
            }
        }
    }

    Ok(())
}
