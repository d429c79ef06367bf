use std::collections::BTreeSet;
use std::collections::HashSet;

use crate::ast::{format_node, Document, Field, Type, Value};
use crate::gen::{classify_method, MethodKind};
use crate::strcase;
use crate::token::TokenKind;

// Go back-end: a record-typed target. Emits constants, enums as sized
// integer types, models as tagged structs, error values, service interfaces
// and the server/client glue around the fixed per-shape handler templates.

struct GoConst {
    name: String,
    value: String,
}

struct GoEnumKey {
    name: String,
    value: i64,
}

struct GoEnum {
    name: String,
    typ: String,
    keys: Vec<GoEnumKey>,
}

struct GoField {
    name: String,
    typ: String,
    tag: String,
}

struct GoModel {
    name: String,
    embeds: Vec<String>,
    fields: Vec<GoField>,
}

struct GoArg {
    name: String,
    typ: String,
    stream: bool,
}

struct GoReturn {
    name: String,
    typ: String,
    stream: bool,
}

struct GoMethod {
    name: String,
    service_name: String,
    args: Vec<GoArg>,
    returns: Vec<GoReturn>,
    kind: MethodKind,
    timeout_ns: Option<i64>,
    max_size_bytes: Option<i64>,
}

struct GoService {
    name: String,
    methods: Vec<GoMethod>,
}

struct GoError {
    name: String,
    code: i64,
    message: String,
}

/// Which runtime helpers the emitted file needs. JSON-shaped handlers are
/// keyed by return arity, the streaming ones are on/off.
#[derive(Default)]
struct Shapes {
    json_to_json: BTreeSet<usize>,
    upload_to_json: BTreeSet<usize>,
    json_to_binary: bool,
    json_to_sse: bool,
    upload_to_binary: bool,
    upload_to_sse: bool,
}

impl Shapes {
    fn track(&mut self, method: &GoMethod) {
        match method.kind {
            MethodKind::JsonToJson => {
                self.json_to_json.insert(method.returns.len());
            }
            MethodKind::UploadToJson => {
                self.upload_to_json.insert(method.returns.len());
            }
            MethodKind::JsonToBinary => self.json_to_binary = true,
            MethodKind::JsonToSse => self.json_to_sse = true,
            MethodKind::UploadToBinary => self.upload_to_binary = true,
            MethodKind::UploadToSse => self.upload_to_sse = true,
        }
    }

    fn any_upload(&self) -> bool {
        !self.upload_to_json.is_empty() || self.upload_to_binary || self.upload_to_sse
    }

    fn any_sse(&self) -> bool {
        self.json_to_sse || self.upload_to_sse
    }

    fn any_binary(&self) -> bool {
        self.json_to_binary || self.upload_to_binary
    }
}

pub(crate) fn generate(pkg: &str, doc: &Document) -> String {
    let model_names: HashSet<&str> = doc.models.iter().map(|m| m.name.name()).collect();
    let is_model = |name: &str| model_names.contains(name);

    let constants: Vec<GoConst> = doc
        .consts
        .iter()
        .map(|c| GoConst {
            name: c.identifier.name().to_string(),
            value: go_value(&c.value),
        })
        .collect();

    let enums: Vec<GoEnum> = doc
        .enums
        .iter()
        .map(|e| GoEnum {
            name: e.name.name().to_string(),
            typ: format!("int{}", e.size),
            keys: e
                .sets
                .iter()
                .filter(|set| set.name.name() != "_")
                .map(|set| GoEnumKey {
                    name: set.name.name().to_string(),
                    value: set.value.value,
                })
                .collect(),
        })
        .collect();

    let models: Vec<GoModel> = doc
        .models
        .iter()
        .map(|m| GoModel {
            name: m.name.name().to_string(),
            embeds: m.extends.iter().map(|e| e.name.name().to_string()).collect(),
            fields: m
                .fields
                .iter()
                .map(|f| GoField {
                    name: f.name.name().to_string(),
                    typ: go_type(&f.typ, &is_model),
                    tag: go_field_tag(f),
                })
                .collect(),
        })
        .collect();

    let build_services = |kind| -> Vec<GoService> {
        doc.services
            .iter()
            .filter(|s| s.kind == kind)
            .map(|service| GoService {
                name: service.name.name().to_string(),
                methods: service
                    .methods
                    .iter()
                    .map(|method| {
                        let mut timeout_ns = None;
                        let mut max_size_bytes = None;

                        for option in &method.options.list {
                            match option.name.name() {
                                "Timeout" => {
                                    if let Value::Duration(v) = &option.value {
                                        timeout_ns = Some(v.total_nanoseconds());
                                    }
                                }
                                "TotalMaxSize" => {
                                    if let Value::ByteSize(v) = &option.value {
                                        max_size_bytes = Some(v.total_bytes());
                                    }
                                }
                                _ => {}
                            }
                        }

                        GoMethod {
                            name: method.name.name().to_string(),
                            service_name: service.name.name().to_string(),
                            args: method
                                .args
                                .iter()
                                .map(|a| GoArg {
                                    name: strcase::to_camel(a.name.name()),
                                    typ: go_type(&a.typ, &is_model),
                                    stream: a.stream,
                                })
                                .collect(),
                            returns: method
                                .returns
                                .iter()
                                .map(|r| GoReturn {
                                    name: strcase::to_camel(r.name.name()),
                                    typ: go_type(&r.typ, &is_model),
                                    stream: r.stream,
                                })
                                .collect(),
                            kind: classify_method(method),
                            timeout_ns,
                            max_size_bytes,
                        }
                    })
                    .collect(),
            })
            .collect()
    };

    let http_services = build_services(crate::ast::ServiceKind::Http);
    let rpc_services = build_services(crate::ast::ServiceKind::Rpc);

    let errors: Vec<GoError> = doc
        .errors
        .iter()
        .map(|e| GoError {
            name: e.name.name().to_string(),
            code: e.code,
            message: e.msg.value.clone(),
        })
        .collect();

    // only the helpers for shapes that actually appear are emitted
    let mut shapes = Shapes::default();
    for service in http_services.iter().chain(rpc_services.iter()) {
        for method in &service.methods {
            shapes.track(method);
        }
    }

    let has_services = !http_services.is_empty() || !rpc_services.is_empty();
    let has_timeout = http_services
        .iter()
        .chain(rpc_services.iter())
        .flat_map(|s| &s.methods)
        .any(|m| m.timeout_ns.is_some());
    let uses_timestamp = document_uses_timestamp(doc);

    let mut out: Vec<String> = Vec::new();

    out.push("// Code generated by quill; DO NOT EDIT.".to_string());
    out.push(String::new());
    out.push(format!("package {}", pkg));
    out.push(String::new());

    let mut imports: BTreeSet<&str> = BTreeSet::new();
    if has_services {
        imports.extend([
            "bytes",
            "context",
            "encoding/json",
            "errors",
            "io",
            "net/http",
        ]);
    }
    if !rpc_services.is_empty() {
        imports.insert("net/http/httptest");
    }
    if shapes.any_sse() {
        imports.extend(["bufio", "fmt", "strings"]);
    }
    if shapes.any_binary() {
        imports.insert("mime");
    }
    if shapes.any_upload() {
        imports.insert("mime/multipart");
    }
    if uses_timestamp || has_timeout {
        imports.insert("time");
    }

    if !imports.is_empty() {
        out.push("import (".to_string());
        for import in &imports {
            out.push(format!("\t\"{}\"", import));
        }
        out.push(")".to_string());
        out.push(String::new());
    }

    if !constants.is_empty() {
        out.push("const (".to_string());
        for c in &constants {
            out.push(format!("\t{} = {}", c.name, c.value));
        }
        out.push(")".to_string());
        out.push(String::new());
    }

    for e in &enums {
        out.push(format!("type {} {}", e.name, e.typ));
        out.push(String::new());
        if !e.keys.is_empty() {
            out.push("const (".to_string());
            for key in &e.keys {
                out.push(format!("\t{}_{} {} = {}", e.name, key.name, e.name, key.value));
            }
            out.push(")".to_string());
            out.push(String::new());
        }
    }

    for m in &models {
        out.push(format!("type {} struct {{", m.name));
        for embed in &m.embeds {
            out.push(format!("\t{}", embed));
        }
        for f in &m.fields {
            out.push(format!("\t{} {} `{}`", f.name, f.typ, f.tag));
        }
        out.push("}".to_string());
        out.push(String::new());
    }

    if !errors.is_empty() || has_services {
        out.push(ERROR_RUNTIME.to_string());
    }

    if !errors.is_empty() {
        out.push("var (".to_string());
        for e in &errors {
            out.push(format!(
                "\t{} = NewError({}, {})",
                e.name,
                e.code,
                go_quote(&e.message)
            ));
        }
        out.push(")".to_string());
        out.push(String::new());
    }

    if has_services {
        out.push(SERVER_RUNTIME.to_string());
        if shapes.any_upload() {
            out.push(UPLOAD_RUNTIME.to_string());
        }
        emit_caller(&mut out, &shapes, !rpc_services.is_empty());
    }

    for service in http_services.iter().chain(rpc_services.iter()) {
        emit_interface(&mut out, service);
        emit_register(&mut out, service);
        emit_client(&mut out, service);
    }

    emit_handlers(&mut out, &shapes);

    let mut source = out.join("\n");
    if !source.ends_with('\n') {
        source.push('\n');
    }
    source
}

fn document_uses_timestamp(doc: &Document) -> bool {
    fn has_timestamp(typ: &Type) -> bool {
        match typ {
            Type::Timestamp { .. } => true,
            Type::Array { elem, .. } => has_timestamp(elem),
            Type::Map { key, value, .. } => has_timestamp(key) || has_timestamp(value),
            _ => false,
        }
    }

    doc.models
        .iter()
        .flat_map(|m| &m.fields)
        .any(|f| has_timestamp(&f.typ))
        || doc.services.iter().any(|s| {
            s.methods.iter().any(|m| {
                m.args.iter().any(|a| has_timestamp(&a.typ))
                    || m.returns.iter().any(|r| has_timestamp(&r.typ))
            })
        })
}

fn go_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn go_value(value: &Value) -> String {
    match value {
        Value::String(v) => {
            if v.token.kind == TokenKind::ConstStringSingleQuote {
                go_quote(&v.value)
            } else {
                format_node(value)
            }
        }
        Value::Int(v) => v.value.to_string(),
        Value::ByteSize(v) => v.total_bytes().to_string(),
        Value::Duration(v) => v.total_nanoseconds().to_string(),
        Value::Null(_) => "nil".to_string(),
        _ => format_node(value),
    }
}

fn go_type(typ: &Type, is_model: &dyn Fn(&str) -> bool) -> String {
    match typ {
        Type::Custom { token } => {
            // models are passed around indirectly, enums by value
            if is_model(&token.value) {
                format!("*{}", token.value)
            } else {
                token.value.clone()
            }
        }
        Type::Any { .. } => "any".to_string(),
        Type::Int { size, .. } => format!("int{}", size),
        Type::Uint { size, .. } => format!("uint{}", size),
        Type::Byte { .. } => "byte".to_string(),
        Type::Float { size, .. } => format!("float{}", size),
        Type::String { .. } => "string".to_string(),
        Type::Bool { .. } => "bool".to_string(),
        Type::Timestamp { .. } => "time.Time".to_string(),
        Type::Map { key, value, .. } => {
            format!("map[{}]{}", go_type(key, is_model), go_type(value, is_model))
        }
        Type::Array { elem, .. } => format!("[]{}", go_type(elem, is_model)),
    }
}

/// JSON tag for a model field: key defaults to the camelCase field name, the
/// `Json` option overrides it ("-" drops the field), `JsonOmitEmpty` appends
/// omitempty, optional fields get both omitempty and omitzero.
fn go_field_tag(field: &Field) -> String {
    let mut json_tag = strcase::to_camel(field.name.name());
    let mut has_omit_empty_option = false;
    let mut omit_empty = false;

    for option in &field.options.list {
        match option.name.name().to_lowercase().as_str() {
            "json" => match &option.value {
                Value::String(v) => json_tag = v.token.value.clone(),
                Value::Bool(v) => {
                    if !v.value {
                        json_tag = "-".to_string();
                    }
                }
                _ => {}
            },
            "jsonomitempty" => {
                has_omit_empty_option = true;
                if let Value::Bool(v) = &option.value {
                    omit_empty = v.value;
                }
            }
            _ => {}
        }
    }

    if omit_empty && json_tag != "-" {
        json_tag.push_str(",omitempty");
    }

    if field.optional {
        if !has_omit_empty_option {
            json_tag.push_str(",omitempty");
        }
        json_tag.push_str(",omitzero");
    }

    format!("json:\"{}\"", json_tag)
}

/// `ctx context.Context` plus each argument; a streamed byte array becomes
/// the pull-callback `UploadFunc`.
fn go_method_args(args: &[GoArg]) -> String {
    let mut sb = String::from("ctx context.Context");

    for arg in args {
        sb.push_str(", ");
        sb.push_str(&arg.name);
        sb.push(' ');
        if arg.stream && arg.typ == "[]byte" {
            sb.push_str("UploadFunc");
        } else {
            sb.push_str(&arg.typ);
        }
    }

    sb
}

/// Named returns: a streamed non-byte return becomes a receive channel with
/// a paired error channel, a streamed byte array becomes a reader plus
/// filename/content-type strings.
fn go_method_returns(returns: &[GoReturn]) -> String {
    let mut sb = String::new();
    let mut is_channel = false;

    for (i, ret) in returns.iter().enumerate() {
        if i > 0 {
            sb.push_str(", ");
        }

        sb.push_str(&ret.name);
        sb.push(' ');

        if ret.stream && ret.typ != "[]byte" {
            sb.push_str("<-chan ");
            sb.push_str(&ret.typ);
            is_channel = true;
        } else if ret.stream && ret.typ == "[]byte" {
            sb.push_str("io.Reader, ");
            sb.push_str(&ret.name);
            sb.push_str("Filename string, ");
            sb.push_str(&ret.name);
            sb.push_str("ContentType string");
        } else {
            sb.push_str(&ret.typ);
        }
    }

    if !returns.is_empty() {
        sb.push_str(", ");
    }

    if is_channel {
        sb.push_str("errs <-chan error");
    } else {
        sb.push_str("err error");
    }

    sb
}

fn method_path(method: &GoMethod) -> String {
    format!("/{}/{}", method.service_name, method.name)
}

fn upload_arg_name(method: &GoMethod) -> Option<&str> {
    method
        .args
        .iter()
        .find(|a| a.stream && a.typ == "[]byte")
        .map(|a| a.name.as_str())
}

fn emit_interface(out: &mut Vec<String>, service: &GoService) {
    out.push(format!("type {} interface {{", service.name));
    for method in &service.methods {
        out.push(format!(
            "\t{}({}) ({})",
            method.name,
            go_method_args(&method.args),
            go_method_returns(&method.returns)
        ));
    }
    out.push("}".to_string());
    out.push(String::new());
}

/// The inline args struct the handler decodes the JSON body (or the `args`
/// multipart field) into.
fn args_struct(method: &GoMethod, indent: &str) -> String {
    let plain: Vec<&GoArg> = method
        .args
        .iter()
        .filter(|a| !(a.stream && a.typ == "[]byte"))
        .collect();

    if plain.is_empty() {
        return "struct{}".to_string();
    }

    let mut sb = String::from("struct {\n");
    for arg in plain {
        sb.push_str(indent);
        sb.push_str(&format!(
            "\t{} {} `json:\"{}\"`\n",
            strcase::to_pascal(&arg.name),
            arg.typ,
            arg.name
        ));
    }
    sb.push_str(indent);
    sb.push('}');
    sb
}

/// The expression list the handler closure forwards to the service method.
fn call_args(method: &GoMethod) -> String {
    let mut sb = String::from("ctx");

    for arg in &method.args {
        sb.push_str(", ");
        if arg.stream && arg.typ == "[]byte" {
            sb.push_str("file");
        } else {
            sb.push_str("args.");
            sb.push_str(&strcase::to_pascal(&arg.name));
        }
    }

    sb
}

/// The closure's return type list, matching the handler helper's signature.
fn closure_returns(method: &GoMethod) -> String {
    match method.kind {
        MethodKind::JsonToJson | MethodKind::UploadToJson => {
            let mut parts: Vec<String> = method.returns.iter().map(|r| r.typ.clone()).collect();
            parts.push("error".to_string());
            parts.join(", ")
        }
        MethodKind::JsonToSse | MethodKind::UploadToSse => {
            let elem = method
                .returns
                .iter()
                .find(|r| r.stream)
                .map(|r| r.typ.as_str())
                .unwrap_or("any");
            format!("<-chan {}, <-chan error", elem)
        }
        MethodKind::JsonToBinary | MethodKind::UploadToBinary => {
            "io.Reader, string, string, error".to_string()
        }
    }
}

fn handler_name(method: &GoMethod) -> String {
    match method.kind {
        MethodKind::JsonToJson => format!("handleJsonToJson{}", method.returns.len()),
        MethodKind::JsonToSse => "handleJsonToSse".to_string(),
        MethodKind::JsonToBinary => "handleJsonToBinary".to_string(),
        MethodKind::UploadToJson => format!("handleUploadToJson{}", method.returns.len()),
        MethodKind::UploadToSse => "handleUploadToSse".to_string(),
        MethodKind::UploadToBinary => "handleUploadToBinary".to_string(),
    }
}

fn emit_register(out: &mut Vec<String>, service: &GoService) {
    out.push(format!(
        "func Register{}Server(reg HandleRegistry, service {}) {{",
        service.name, service.name
    ));

    for method in &service.methods {
        let upload = matches!(
            method.kind,
            MethodKind::UploadToJson | MethodKind::UploadToBinary | MethodKind::UploadToSse
        );
        let file_param = if upload { ", file UploadFunc" } else { "" };

        out.push(format!(
            "\treg.Register(\"{}\", func(w http.ResponseWriter, r *http.Request) {{",
            method_path(method)
        ));

        if let Some(max) = method.max_size_bytes {
            out.push(format!("\t\tr.Body = http.MaxBytesReader(w, r.Body, {})", max));
        }

        if let Some(timeout) = method.timeout_ns {
            out.push(format!(
                "\t\tctx, cancel := context.WithTimeout(r.Context(), {}*time.Nanosecond)",
                timeout
            ));
            out.push("\t\tdefer cancel()".to_string());
            out.push("\t\tr = r.WithContext(ctx)".to_string());
        }

        out.push(format!(
            "\t\t{}(w, r, func(ctx context.Context, args {}{}) ({}) {{",
            handler_name(method),
            args_struct(method, "\t\t"),
            file_param,
            closure_returns(method)
        ));
        out.push(format!(
            "\t\t\treturn service.{}({})",
            method.name,
            call_args(method)
        ));
        out.push("\t\t})".to_string());
        out.push("\t})".to_string());
    }

    out.push("}".to_string());
    out.push(String::new());
}

fn client_type_name(service: &GoService) -> String {
    strcase::to_camel(&service.name) + "Client"
}

fn emit_client(out: &mut Vec<String>, service: &GoService) {
    let client = client_type_name(service);

    out.push(format!("type {} struct {{", client));
    out.push("\tcaller Caller".to_string());
    out.push("}".to_string());
    out.push(String::new());
    out.push(format!(
        "func Create{}Client(caller Caller) {} {{",
        service.name, service.name
    ));
    out.push(format!("\treturn &{}{{caller: caller}}", client));
    out.push("}".to_string());
    out.push(String::new());

    for method in &service.methods {
        out.push(format!(
            "func (c *{}) {}({}) ({}) {{",
            client,
            method.name,
            go_method_args(&method.args),
            go_method_returns(&method.returns)
        ));

        let path = method_path(method);
        let args_map = client_args_map(method);

        match method.kind {
            MethodKind::JsonToJson | MethodKind::UploadToJson => {
                // pointer returns are allocated up front so a failed call
                // still hands back an empty value
                let pointers: Vec<&GoReturn> = method
                    .returns
                    .iter()
                    .filter(|r| r.typ.starts_with('*'))
                    .collect();
                if !pointers.is_empty() {
                    let names: Vec<&str> = pointers.iter().map(|r| r.name.as_str()).collect();
                    let news: Vec<String> = pointers
                        .iter()
                        .map(|r| format!("new({})", r.typ.trim_start_matches('*')))
                        .collect();
                    out.push(format!("\t{} = {}", names.join(", "), news.join(", ")));
                }

                let mut outs = String::new();
                for ret in &method.returns {
                    outs.push_str(", ");
                    if !ret.typ.starts_with('*') {
                        outs.push('&');
                    }
                    outs.push_str(&ret.name);
                }

                if method.kind == MethodKind::JsonToJson {
                    out.push(format!(
                        "\terr = c.caller.CallJson(ctx, \"{}\", {}{})",
                        path, args_map, outs
                    ));
                } else {
                    out.push(format!(
                        "\terr = c.caller.CallUpload(ctx, \"{}\", {}, {}{})",
                        path,
                        args_map,
                        upload_arg_name(method).unwrap_or("nil"),
                        outs
                    ));
                }
                out.push("\treturn".to_string());
            }
            MethodKind::JsonToSse => {
                let elem = sse_elem(method);
                out.push(format!(
                    "\traw, rawErrs := c.caller.CallSse(ctx, \"{}\", {})",
                    path, args_map
                ));
                out.push(format!("\treturn sseChan[{}](raw, rawErrs)", elem));
            }
            MethodKind::UploadToSse => {
                let elem = sse_elem(method);
                out.push(format!(
                    "\traw, rawErrs := c.caller.CallUploadSse(ctx, \"{}\", {}, {})",
                    path,
                    args_map,
                    upload_arg_name(method).unwrap_or("nil")
                ));
                out.push(format!("\treturn sseChan[{}](raw, rawErrs)", elem));
            }
            MethodKind::JsonToBinary => {
                out.push(format!(
                    "\treturn c.caller.CallBinary(ctx, \"{}\", {})",
                    path, args_map
                ));
            }
            MethodKind::UploadToBinary => {
                out.push(format!(
                    "\treturn c.caller.CallUploadBinary(ctx, \"{}\", {}, {})",
                    path,
                    args_map,
                    upload_arg_name(method).unwrap_or("nil")
                ));
            }
        }

        out.push("}".to_string());
        out.push(String::new());
    }
}

fn sse_elem(method: &GoMethod) -> String {
    method
        .returns
        .iter()
        .find(|r| r.stream)
        .map(|r| r.typ.clone())
        .unwrap_or_else(|| "any".to_string())
}

fn client_args_map(method: &GoMethod) -> String {
    let plain: Vec<&GoArg> = method
        .args
        .iter()
        .filter(|a| !a.stream)
        .collect();

    if plain.is_empty() {
        return "map[string]any{}".to_string();
    }

    let entries: Vec<String> = plain
        .iter()
        .map(|a| format!("\"{}\": {}", a.name, a.name))
        .collect();

    format!("map[string]any{{{}}}", entries.join(", "))
}

fn args_generics(arity: usize) -> String {
    let mut sb = String::from("A");
    for i in 1..=arity {
        sb.push_str(&format!(", R{}", i));
    }
    sb.push_str(" any");
    sb
}

fn returns_generics(arity: usize) -> String {
    let mut parts: Vec<String> = (1..=arity).map(|i| format!("R{}", i)).collect();
    parts.push("error".to_string());
    parts.join(", ")
}

fn result_vars(arity: usize) -> Vec<String> {
    (1..=arity).map(|i| format!("r{}", i)).collect()
}

fn emit_handlers(out: &mut Vec<String>, shapes: &Shapes) {
    for &arity in &shapes.json_to_json {
        let vars = result_vars(arity);
        let lhs = if arity == 0 {
            "err :=".to_string()
        } else {
            format!("{}, err :=", vars.join(", "))
        };

        out.push(format!(
            "func handleJsonToJson{}[{}](w http.ResponseWriter, r *http.Request, fn func(ctx context.Context, args A) ({})) {{",
            arity,
            args_generics(arity),
            returns_generics(arity)
        ));
        out.push("\tvar args A".to_string());
        out.push("\tif err := decodeArgs(r, &args); err != nil {".to_string());
        out.push("\t\twriteError(w, err)".to_string());
        out.push("\t\treturn".to_string());
        out.push("\t}".to_string());
        out.push(format!("\t{} fn(r.Context(), args)", lhs));
        out.push("\tif err != nil {".to_string());
        out.push("\t\twriteError(w, err)".to_string());
        out.push("\t\treturn".to_string());
        out.push("\t}".to_string());
        out.push(format!("\twriteJson(w, []any{{{}}})", vars.join(", ")));
        out.push("}".to_string());
        out.push(String::new());
    }

    for &arity in &shapes.upload_to_json {
        let vars = result_vars(arity);
        let lhs = if arity == 0 {
            "err :=".to_string()
        } else {
            format!("{}, err :=", vars.join(", "))
        };

        out.push(format!(
            "func handleUploadToJson{}[{}](w http.ResponseWriter, r *http.Request, fn func(ctx context.Context, args A, file UploadFunc) ({})) {{",
            arity,
            args_generics(arity),
            returns_generics(arity)
        ));
        out.push("\tvar args A".to_string());
        out.push("\tfile, err := uploadArgs(r, &args)".to_string());
        out.push("\tif err != nil {".to_string());
        out.push("\t\twriteError(w, err)".to_string());
        out.push("\t\treturn".to_string());
        out.push("\t}".to_string());
        if arity == 0 {
            out.push("\terr = fn(r.Context(), args, file)".to_string());
        } else {
            out.push(format!("\t{} fn(r.Context(), args, file)", lhs));
        }
        out.push("\tif err != nil {".to_string());
        out.push("\t\twriteError(w, err)".to_string());
        out.push("\t\treturn".to_string());
        out.push("\t}".to_string());
        out.push(format!("\twriteJson(w, []any{{{}}})", vars.join(", ")));
        out.push("}".to_string());
        out.push(String::new());
    }

    if shapes.json_to_sse {
        out.push(HANDLE_JSON_TO_SSE.to_string());
    }
    if shapes.upload_to_sse {
        out.push(HANDLE_UPLOAD_TO_SSE.to_string());
    }
    if shapes.json_to_binary {
        out.push(HANDLE_JSON_TO_BINARY.to_string());
    }
    if shapes.upload_to_binary {
        out.push(HANDLE_UPLOAD_TO_BINARY.to_string());
    }
    if shapes.any_binary() {
        out.push(SERVE_BINARY.to_string());
    }
    if shapes.any_sse() {
        out.push(SSE_CHAN.to_string());
    }
}

fn emit_caller(out: &mut Vec<String>, shapes: &Shapes, has_rpc: bool) {
    out.push("// Caller performs one method call against a server.".to_string());
    out.push("type Caller interface {".to_string());
    out.push("\tCallJson(ctx context.Context, path string, args any, outs ...any) error".to_string());
    if shapes.json_to_sse {
        out.push("\tCallSse(ctx context.Context, path string, args any) (<-chan json.RawMessage, <-chan error)".to_string());
    }
    if shapes.json_to_binary {
        out.push("\tCallBinary(ctx context.Context, path string, args any) (io.Reader, string, string, error)".to_string());
    }
    if !shapes.upload_to_json.is_empty() {
        out.push("\tCallUpload(ctx context.Context, path string, args any, file UploadFunc, outs ...any) error".to_string());
    }
    if shapes.upload_to_sse {
        out.push("\tCallUploadSse(ctx context.Context, path string, args any, file UploadFunc) (<-chan json.RawMessage, <-chan error)".to_string());
    }
    if shapes.upload_to_binary {
        out.push("\tCallUploadBinary(ctx context.Context, path string, args any, file UploadFunc) (io.Reader, string, string, error)".to_string());
    }
    out.push("}".to_string());
    out.push(String::new());

    out.push(HTTP_CLIENT_RUNTIME.to_string());

    if shapes.any_sse() {
        out.push(CLIENT_STREAM_SSE.to_string());
    }
    if shapes.json_to_sse {
        out.push(CLIENT_CALL_SSE.to_string());
    }
    if shapes.json_to_binary {
        out.push(CLIENT_CALL_BINARY.to_string());
    }
    if shapes.any_upload() {
        out.push(CLIENT_UPLOAD_REQUEST.to_string());
    }
    if !shapes.upload_to_json.is_empty() {
        out.push(CLIENT_CALL_UPLOAD.to_string());
    }
    if shapes.upload_to_sse {
        out.push(CLIENT_CALL_UPLOAD_SSE.to_string());
    }
    if shapes.upload_to_binary {
        out.push(CLIENT_CALL_UPLOAD_BINARY.to_string());
    }

    if has_rpc {
        out.push(MEMORY_CALLER_RUNTIME.to_string());

        // the memory caller only speaks JSON; rpc services can never carry
        // streams, so the remaining Caller methods are hard failures
        if shapes.json_to_sse {
            out.push("func (c *MemoryCaller) CallSse(ctx context.Context, path string, args any) (<-chan json.RawMessage, <-chan error) {".to_string());
            out.push("\treturn nil, closedErrChan(NewError(0, \"streaming is not supported over the memory caller\"))".to_string());
            out.push("}".to_string());
            out.push(String::new());
        }
        if shapes.json_to_binary {
            out.push("func (c *MemoryCaller) CallBinary(ctx context.Context, path string, args any) (io.Reader, string, string, error) {".to_string());
            out.push("\treturn nil, \"\", \"\", NewError(0, \"streaming is not supported over the memory caller\")".to_string());
            out.push("}".to_string());
            out.push(String::new());
        }
        if !shapes.upload_to_json.is_empty() {
            out.push("func (c *MemoryCaller) CallUpload(ctx context.Context, path string, args any, file UploadFunc, outs ...any) error {".to_string());
            out.push("\treturn NewError(0, \"uploads are not supported over the memory caller\")".to_string());
            out.push("}".to_string());
            out.push(String::new());
        }
        if shapes.upload_to_sse {
            out.push("func (c *MemoryCaller) CallUploadSse(ctx context.Context, path string, args any, file UploadFunc) (<-chan json.RawMessage, <-chan error) {".to_string());
            out.push("\treturn nil, closedErrChan(NewError(0, \"uploads are not supported over the memory caller\"))".to_string());
            out.push("}".to_string());
            out.push(String::new());
        }
        if shapes.upload_to_binary {
            out.push("func (c *MemoryCaller) CallUploadBinary(ctx context.Context, path string, args any, file UploadFunc) (io.Reader, string, string, error) {".to_string());
            out.push("\treturn nil, \"\", \"\", NewError(0, \"uploads are not supported over the memory caller\")".to_string());
            out.push("}".to_string());
            out.push(String::new());
        }
        if shapes.any_sse() {
            out.push(CLOSED_ERR_CHAN.to_string());
        }
    }
}

const ERROR_RUNTIME: &str = r#"// Error is the wire form of a service failure.
type Error struct {
	Code int64  `json:"code"`
	Msg  string `json:"msg"`
}

func (e *Error) Error() string {
	return e.Msg
}

func NewError(code int64, msg string) *Error {
	return &Error{Code: code, Msg: msg}
}
"#;

const SERVER_RUNTIME: &str = r#"// HandleRegistry collects the generated method handlers.
type HandleRegistry interface {
	Register(path string, handler http.HandlerFunc)
}

type MemoryHandleRegistry struct {
	handlers map[string]http.HandlerFunc
}

func NewMemoryHandleRegistry() *MemoryHandleRegistry {
	return &MemoryHandleRegistry{handlers: make(map[string]http.HandlerFunc)}
}

func (m *MemoryHandleRegistry) Register(path string, handler http.HandlerFunc) {
	m.handlers[path] = handler
}

// NewHttpHandler exposes every registered method on a single http.Handler.
func NewHttpHandler(reg *MemoryHandleRegistry) http.Handler {
	mux := http.NewServeMux()
	for path, handler := range reg.handlers {
		mux.HandleFunc(path, handler)
	}
	return mux
}

func writeError(w http.ResponseWriter, err error) {
	wireErr := &Error{}
	if !errors.As(err, &wireErr) {
		wireErr = NewError(0, err.Error())
	}
	w.Header().Set("Content-Type", "application/json")
	w.WriteHeader(http.StatusBadRequest)
	_ = json.NewEncoder(w).Encode(wireErr)
}

func writeJson(w http.ResponseWriter, outs []any) {
	w.Header().Set("Content-Type", "application/json")
	_ = json.NewEncoder(w).Encode(outs)
}

func decodeArgs[A any](r *http.Request, args *A) error {
	if r.Body == nil {
		return nil
	}
	if err := json.NewDecoder(r.Body).Decode(args); err != nil && err != io.EOF {
		return err
	}
	return nil
}

func decodeOuts(body io.Reader, outs []any) error {
	var raw []json.RawMessage
	if err := json.NewDecoder(body).Decode(&raw); err != nil {
		return err
	}
	for i, out := range outs {
		if i >= len(raw) {
			break
		}
		if err := json.Unmarshal(raw[i], out); err != nil {
			return err
		}
	}
	return nil
}
"#;

const UPLOAD_RUNTIME: &str = r#"// UploadFunc pulls the next file to send; returning io.EOF ends the stream.
type UploadFunc func() (filename string, content io.Reader, err error)

func uploadArgs[A any](r *http.Request, args *A) (UploadFunc, error) {
	reader, err := r.MultipartReader()
	if err != nil {
		return nil, err
	}

	part, err := reader.NextPart()
	if err != nil && err != io.EOF {
		return nil, err
	}
	if part != nil && part.FormName() == "args" {
		if err := json.NewDecoder(part).Decode(args); err != nil && err != io.EOF {
			return nil, err
		}
	}

	file := func() (string, io.Reader, error) {
		part, err := reader.NextPart()
		if err != nil {
			return "", nil, err
		}
		return part.FileName(), part, nil
	}

	return file, nil
}
"#;

const HTTP_CLIENT_RUNTIME: &str = r#"type HttpClient struct {
	host   string
	client *http.Client
}

func NewHttpClient(host string, client *http.Client) *HttpClient {
	return &HttpClient{host: host, client: client}
}

func (c *HttpClient) post(ctx context.Context, path string, args any) (*http.Response, error) {
	body, err := json.Marshal(args)
	if err != nil {
		return nil, err
	}
	req, err := http.NewRequestWithContext(ctx, http.MethodPost, c.host+path, bytes.NewReader(body))
	if err != nil {
		return nil, err
	}
	req.Header.Set("Content-Type", "application/json")
	return c.do(req)
}

func (c *HttpClient) do(req *http.Request) (*http.Response, error) {
	resp, err := c.client.Do(req)
	if err != nil {
		return nil, err
	}
	if resp.StatusCode >= 400 {
		defer resp.Body.Close()
		wireErr := &Error{}
		if err := json.NewDecoder(resp.Body).Decode(wireErr); err != nil {
			return nil, NewError(0, resp.Status)
		}
		return nil, wireErr
	}
	return resp, nil
}

func (c *HttpClient) CallJson(ctx context.Context, path string, args any, outs ...any) error {
	resp, err := c.post(ctx, path, args)
	if err != nil {
		return err
	}
	defer resp.Body.Close()
	return decodeOuts(resp.Body, outs)
}
"#;

const CLIENT_STREAM_SSE: &str = r#"func streamSse(ctx context.Context, body io.Reader, events chan<- json.RawMessage, errs chan<- error) {
	scanner := bufio.NewScanner(body)
	for scanner.Scan() {
		line := scanner.Text()
		if !strings.HasPrefix(line, "data: ") {
			continue
		}
		select {
		case events <- json.RawMessage(strings.TrimPrefix(line, "data: ")):
		case <-ctx.Done():
			errs <- ctx.Err()
			return
		}
	}
	if err := scanner.Err(); err != nil {
		errs <- err
	}
}
"#;

const CLIENT_CALL_SSE: &str = r#"func (c *HttpClient) CallSse(ctx context.Context, path string, args any) (<-chan json.RawMessage, <-chan error) {
	events := make(chan json.RawMessage)
	errs := make(chan error, 1)

	go func() {
		defer close(events)
		defer close(errs)

		resp, err := c.post(ctx, path, args)
		if err != nil {
			errs <- err
			return
		}
		defer resp.Body.Close()

		streamSse(ctx, resp.Body, events, errs)
	}()

	return events, errs
}
"#;

const CLIENT_CALL_BINARY: &str = r#"func (c *HttpClient) CallBinary(ctx context.Context, path string, args any) (io.Reader, string, string, error) {
	resp, err := c.post(ctx, path, args)
	if err != nil {
		return nil, "", "", err
	}

	filename := ""
	if _, params, err := mime.ParseMediaType(resp.Header.Get("Content-Disposition")); err == nil {
		filename = params["filename"]
	}

	return resp.Body, filename, resp.Header.Get("Content-Type"), nil
}
"#;

const CLIENT_UPLOAD_REQUEST: &str = r#"func (c *HttpClient) uploadRequest(ctx context.Context, path string, args any, file UploadFunc) (*http.Request, error) {
	pr, pw := io.Pipe()
	form := multipart.NewWriter(pw)

	go func() {
		defer pw.Close()
		defer form.Close()

		argsJson, err := json.Marshal(args)
		if err != nil {
			pw.CloseWithError(err)
			return
		}
		if err := form.WriteField("args", string(argsJson)); err != nil {
			pw.CloseWithError(err)
			return
		}

		if file == nil {
			return
		}

		for {
			filename, content, err := file()
			if err == io.EOF {
				return
			}
			if err != nil {
				pw.CloseWithError(err)
				return
			}
			part, err := form.CreateFormFile("files", filename)
			if err != nil {
				pw.CloseWithError(err)
				return
			}
			if _, err := io.Copy(part, content); err != nil {
				pw.CloseWithError(err)
				return
			}
		}
	}()

	req, err := http.NewRequestWithContext(ctx, http.MethodPost, c.host+path, pr)
	if err != nil {
		return nil, err
	}
	req.Header.Set("Content-Type", form.FormDataContentType())
	return req, nil
}
"#;

const CLIENT_CALL_UPLOAD: &str = r#"func (c *HttpClient) CallUpload(ctx context.Context, path string, args any, file UploadFunc, outs ...any) error {
	req, err := c.uploadRequest(ctx, path, args, file)
	if err != nil {
		return err
	}
	resp, err := c.do(req)
	if err != nil {
		return err
	}
	defer resp.Body.Close()
	return decodeOuts(resp.Body, outs)
}
"#;

const CLIENT_CALL_UPLOAD_SSE: &str = r#"func (c *HttpClient) CallUploadSse(ctx context.Context, path string, args any, file UploadFunc) (<-chan json.RawMessage, <-chan error) {
	events := make(chan json.RawMessage)
	errs := make(chan error, 1)

	go func() {
		defer close(events)
		defer close(errs)

		req, err := c.uploadRequest(ctx, path, args, file)
		if err != nil {
			errs <- err
			return
		}
		resp, err := c.do(req)
		if err != nil {
			errs <- err
			return
		}
		defer resp.Body.Close()

		streamSse(ctx, resp.Body, events, errs)
	}()

	return events, errs
}
"#;

const CLIENT_CALL_UPLOAD_BINARY: &str = r#"func (c *HttpClient) CallUploadBinary(ctx context.Context, path string, args any, file UploadFunc) (io.Reader, string, string, error) {
	req, err := c.uploadRequest(ctx, path, args, file)
	if err != nil {
		return nil, "", "", err
	}
	resp, err := c.do(req)
	if err != nil {
		return nil, "", "", err
	}

	filename := ""
	if _, params, err := mime.ParseMediaType(resp.Header.Get("Content-Disposition")); err == nil {
		filename = params["filename"]
	}

	return resp.Body, filename, resp.Header.Get("Content-Type"), nil
}
"#;

const MEMORY_CALLER_RUNTIME: &str = r#"// MemoryCaller dispatches calls straight into a registry with no network
// in between.
type MemoryCaller struct {
	reg *MemoryHandleRegistry
}

func NewRpcCallerMemory(reg *MemoryHandleRegistry) *MemoryCaller {
	return &MemoryCaller{reg: reg}
}

func (c *MemoryCaller) CallJson(ctx context.Context, path string, args any, outs ...any) error {
	handler, ok := c.reg.handlers[path]
	if !ok {
		return NewError(0, "unknown method: "+path)
	}

	body, err := json.Marshal(args)
	if err != nil {
		return err
	}
	req, err := http.NewRequestWithContext(ctx, http.MethodPost, path, bytes.NewReader(body))
	if err != nil {
		return err
	}

	rec := httptest.NewRecorder()
	handler(rec, req)

	resp := rec.Result()
	defer resp.Body.Close()
	if resp.StatusCode >= 400 {
		wireErr := &Error{}
		if err := json.NewDecoder(resp.Body).Decode(wireErr); err != nil {
			return NewError(0, resp.Status)
		}
		return wireErr
	}

	return decodeOuts(resp.Body, outs)
}
"#;

const CLOSED_ERR_CHAN: &str = r#"func closedErrChan(err error) <-chan error {
	errs := make(chan error, 1)
	errs <- err
	close(errs)
	return errs
}
"#;

const HANDLE_JSON_TO_SSE: &str = r#"func handleJsonToSse[A, R any](w http.ResponseWriter, r *http.Request, fn func(ctx context.Context, args A) (<-chan R, <-chan error)) {
	var args A
	if err := decodeArgs(r, &args); err != nil {
		writeError(w, err)
		return
	}

	events, errs := fn(r.Context(), args)
	serveSse(w, r, events, errs)
}
"#;

const HANDLE_UPLOAD_TO_SSE: &str = r#"func handleUploadToSse[A, R any](w http.ResponseWriter, r *http.Request, fn func(ctx context.Context, args A, file UploadFunc) (<-chan R, <-chan error)) {
	var args A
	file, err := uploadArgs(r, &args)
	if err != nil {
		writeError(w, err)
		return
	}

	events, errs := fn(r.Context(), args, file)
	serveSse(w, r, events, errs)
}
"#;

const HANDLE_JSON_TO_BINARY: &str = r#"func handleJsonToBinary[A any](w http.ResponseWriter, r *http.Request, fn func(ctx context.Context, args A) (io.Reader, string, string, error)) {
	var args A
	if err := decodeArgs(r, &args); err != nil {
		writeError(w, err)
		return
	}

	content, filename, contentType, err := fn(r.Context(), args)
	if err != nil {
		writeError(w, err)
		return
	}
	serveBinary(w, content, filename, contentType)
}
"#;

const HANDLE_UPLOAD_TO_BINARY: &str = r#"func handleUploadToBinary[A any](w http.ResponseWriter, r *http.Request, fn func(ctx context.Context, args A, file UploadFunc) (io.Reader, string, string, error)) {
	var args A
	file, err := uploadArgs(r, &args)
	if err != nil {
		writeError(w, err)
		return
	}

	content, filename, contentType, err := fn(r.Context(), args, file)
	if err != nil {
		writeError(w, err)
		return
	}
	serveBinary(w, content, filename, contentType)
}
"#;

const SSE_CHAN: &str = r#"func serveSse[R any](w http.ResponseWriter, r *http.Request, events <-chan R, errs <-chan error) {
	flusher, _ := w.(http.Flusher)
	w.Header().Set("Content-Type", "text/event-stream")
	w.Header().Set("Cache-Control", "no-cache")
	w.WriteHeader(http.StatusOK)

	for events != nil || errs != nil {
		select {
		case event, ok := <-events:
			if !ok {
				events = nil
				continue
			}
			data, err := json.Marshal(event)
			if err != nil {
				return
			}
			fmt.Fprintf(w, "data: %s\n\n", data)
			if flusher != nil {
				flusher.Flush()
			}
		case err, ok := <-errs:
			if !ok {
				errs = nil
				continue
			}
			fmt.Fprintf(w, "event: error\ndata: %q\n\n", err.Error())
			return
		case <-r.Context().Done():
			return
		}
	}
}

func sseChan[R any](raw <-chan json.RawMessage, rawErrs <-chan error) (<-chan R, <-chan error) {
	out := make(chan R)
	errs := make(chan error, 1)

	go func() {
		defer close(out)
		defer close(errs)

		for raw != nil || rawErrs != nil {
			select {
			case msg, ok := <-raw:
				if !ok {
					raw = nil
					continue
				}
				var event R
				if err := json.Unmarshal(msg, &event); err != nil {
					errs <- err
					return
				}
				out <- event
			case err, ok := <-rawErrs:
				if !ok {
					rawErrs = nil
					continue
				}
				errs <- err
			}
		}
	}()

	return out, errs
}
"#;

const SERVE_BINARY: &str = r#"func serveBinary(w http.ResponseWriter, content io.Reader, filename string, contentType string) {
	if contentType == "" {
		contentType = "application/octet-stream"
	}
	w.Header().Set("Content-Type", contentType)
	if filename != "" {
		w.Header().Set("Content-Disposition", mime.FormatMediaType("attachment", map[string]string{"filename": filename}))
	}
	_, _ = io.Copy(w, content)
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_document, Parser};
    use crate::validate::validate;

    fn gen(inputs: &[&str]) -> String {
        let mut docs: Vec<Document> = inputs
            .iter()
            .map(|input| {
                let mut parser = Parser::new(input);
                parse_document(&mut parser).expect(input)
            })
            .collect();
        validate(&mut docs).unwrap();
        generate("rpc", &crate::gen::merge_documents(&docs))
    }

    #[test]
    fn test_constants_expand_to_smallest_unit() {
        let out = gen(&["const MaxUpload = 10gb\nconst Wait = 1h\nconst Chunk = 1mb"]);
        assert!(out.contains("MaxUpload = 10737418240"));
        assert!(out.contains("Wait = 3600000000000"));
        assert!(out.contains("Chunk = 1048576"));
    }

    #[test]
    fn test_resolved_constant_emits_literal() {
        let out = gen(&["const X = Y\nconst Y = 7"]);
        assert!(out.contains("X = 7"));
        assert!(out.contains("Y = 7"));
    }

    #[test]
    fn test_enum_width_and_placeholders() {
        let out = gen(&["enum Emotion {\n    _\n    Happy\n    Excited = 300\n}"]);
        assert!(out.contains("type Emotion int16"));
        assert!(out.contains("Emotion_Happy Emotion = 1"));
        assert!(out.contains("Emotion_Excited Emotion = 300"));
        assert!(!out.contains("Emotion__"));
    }

    #[test]
    fn test_model_field_tags() {
        let out = gen(&[concat!(
            "model Person {\n",
            "    FirstName: string\n",
            "    Nick?: string\n",
            "    Internal: string {\n",
            "        Json = false\n",
            "    }\n",
            "    Renamed: string {\n",
            "        Json = \"alias\"\n",
            "        JsonOmitEmpty\n",
            "    }\n",
            "}"
        )]);
        assert!(out.contains("FirstName string `json:\"firstName\"`"));
        assert!(out.contains("Nick string `json:\"nick,omitempty,omitzero\"`"));
        assert!(out.contains("Internal string `json:\"-\"`"));
        assert!(out.contains("Renamed string `json:\"alias,omitempty\"`"));
    }

    #[test]
    fn test_model_reference_is_indirect_enum_is_not() {
        let out = gen(&[concat!(
            "enum Kind {\n    A\n}\n\n",
            "model Inner {\n    Id: int64\n}\n\n",
            "model Outer {\n    Inner: Inner\n    Kind: Kind\n    Stamp: timestamp\n}"
        )]);
        assert!(out.contains("Inner *Inner `json:\"inner\"`"));
        assert!(out.contains("Kind Kind `json:\"kind\"`"));
        assert!(out.contains("Stamp time.Time `json:\"stamp\"`"));
    }

    #[test]
    fn test_extends_become_embedded_structs() {
        let out = gen(&[concat!(
            "model Base {\n    Id: int64\n}\n\n",
            "model User {\n    ...Base\n    Name: string\n}"
        )]);
        assert!(out.contains("type User struct {\n\tBase\n\tName string `json:\"name\"`"));
    }

    #[test]
    fn test_error_values() {
        let out = gen(&[
            "error ErrA { Msg = \"a\" }\nerror ErrB { Code = 5 Msg = \"b\" }",
        ]);
        assert!(out.contains("ErrA = NewError(6, \"a\")"));
        assert!(out.contains("ErrB = NewError(5, \"b\")"));
    }

    #[test]
    fn test_only_used_helpers_are_emitted() {
        let out = gen(&[concat!(
            "service HttpS {\n",
            "    One(a: string) => (b: string)\n",
            "    Two(a: string, b: string) => (c: string, d: string)\n",
            "}"
        )]);
        assert!(out.contains("func handleJsonToJson1["));
        assert!(out.contains("func handleJsonToJson2["));
        assert!(!out.contains("handleJsonToSse"));
        assert!(!out.contains("handleJsonToBinary"));
        assert!(!out.contains("handleUploadToJson"));
        assert!(!out.contains("UploadFunc"));
    }

    #[test]
    fn test_sse_method_emits_sse_helper() {
        let out = gen(&["service HttpS {\n    M() => (r: stream any)\n}"]);
        assert!(out.contains("func handleJsonToSse["));
        assert!(out.contains("serveSse"));
        assert!(out.contains("CallSse"));
        assert!(!out.contains("handleJsonToJson"));
    }

    #[test]
    fn test_upload_and_binary_shapes() {
        let out = gen(&[concat!(
            "service HttpFileService {\n",
            "    Upload(name: string, data: stream []byte) => (id: string)\n",
            "    Download(id: string) => (content: stream []byte)\n",
            "}"
        )]);
        assert!(out.contains("func handleUploadToJson1["));
        assert!(out.contains("func handleJsonToBinary["));
        assert!(out.contains("data UploadFunc"));
        assert!(out.contains("content io.Reader, contentFilename string, contentContentType string"));
    }

    #[test]
    fn test_rpc_service_gets_memory_caller() {
        let out = gen(&[concat!(
            "model Reply {\n    Text: string\n}\n\n",
            "service RpcGreetingService {\n    SayHello(name: string) => (reply: Reply)\n}"
        )]);
        assert!(out.contains("func RegisterRpcGreetingServiceServer(reg HandleRegistry, service RpcGreetingService)"));
        assert!(out.contains("func CreateRpcGreetingServiceClient(caller Caller) RpcGreetingService"));
        assert!(out.contains("func NewRpcCallerMemory"));
        assert!(out.contains("reply = new(Reply)"));
    }

    #[test]
    fn test_method_options_configure_handler() {
        let out = gen(&[concat!(
            "service HttpS {\n",
            "    M(a: string) {\n",
            "        Timeout = 1h\n",
            "        TotalMaxSize = 1mb\n",
            "    }\n",
            "}"
        )]);
        assert!(out.contains("http.MaxBytesReader(w, r.Body, 1048576)"));
        assert!(out.contains("context.WithTimeout(r.Context(), 3600000000000*time.Nanosecond)"));
    }

    #[test]
    fn test_deterministic_output() {
        let input = "model A {\n    B: string\n}\n\nservice HttpS {\n    M(a: string) => (b: A)\n}";
        assert_eq!(gen(&[input]), gen(&[input]));
    }
}
