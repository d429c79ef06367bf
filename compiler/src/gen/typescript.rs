use crate::ast::{format_node, Document, Model, Service, ServiceKind, Type, Value};
use crate::gen::{classify_method, MethodKind};
use crate::strcase;
use crate::token::TokenKind;

// TypeScript back-end: a structurally-typed target with a JSON-interop
// fetch client. Only HTTP services are rendered; RPC services are a
// server-side concern and never reach the browser bundle.

struct TsConst {
    name: String,
    value: String,
}

struct TsEnumKey {
    name: String,
    value: String,
}

struct TsEnum {
    name: String,
    keys: Vec<TsEnumKey>,
}

struct TsField {
    name: String,
    typ: String,
    optional: bool,
}

struct TsModel {
    name: String,
    extends: Vec<String>,
    fields: Vec<TsField>,
}

struct TsArg {
    name: String,
    typ: String,
    stream: bool,
}

struct TsMethod {
    name: String,
    service_name: String,
    kind: MethodKind,
    args: Vec<TsArg>,
    return_types: Vec<String>,
    sse_elem: String,
}

struct TsService {
    name: String,
    methods: Vec<TsMethod>,
}

struct TsError {
    name: String,
    code: i64,
}

#[derive(Default)]
struct Shapes {
    json: bool,
    blob: bool,
    sse: bool,
    upload: bool,
    upload_blob: bool,
    upload_sse: bool,
}

impl Shapes {
    fn track(&mut self, kind: MethodKind) {
        match kind {
            MethodKind::JsonToJson => self.json = true,
            MethodKind::JsonToBinary => self.blob = true,
            MethodKind::JsonToSse => self.sse = true,
            MethodKind::UploadToJson => self.upload = true,
            MethodKind::UploadToBinary => self.upload_blob = true,
            MethodKind::UploadToSse => self.upload_sse = true,
        }
    }

    fn any_sse(&self) -> bool {
        self.sse || self.upload_sse
    }

    fn any_upload(&self) -> bool {
        self.upload || self.upload_blob || self.upload_sse
    }
}

pub(crate) fn generate(pkg: &str, doc: &Document) -> String {
    let constants: Vec<TsConst> = doc
        .consts
        .iter()
        .map(|c| TsConst {
            name: c.identifier.name().to_string(),
            value: ts_value(&c.value),
        })
        .collect();

    let enums: Vec<TsEnum> = doc
        .enums
        .iter()
        .map(|e| TsEnum {
            name: e.name.name().to_string(),
            keys: e
                .sets
                .iter()
                .filter(|set| set.name.name() != "_")
                .map(|set| TsEnumKey {
                    name: set.name.name().to_string(),
                    value: strcase::to_snake(set.name.name()),
                })
                .collect(),
        })
        .collect();

    let models: Vec<TsModel> = doc.models.iter().map(ts_model).collect();

    let services: Vec<TsService> = doc
        .services
        .iter()
        .filter(|s| s.kind == ServiceKind::Http)
        .map(ts_service)
        .collect();

    let errors: Vec<TsError> = doc
        .errors
        .iter()
        .map(|e| TsError {
            name: e.name.name().to_string(),
            code: e.code,
        })
        .collect();

    let mut shapes = Shapes::default();
    for service in &services {
        for method in &service.methods {
            shapes.track(method.kind);
        }
    }

    let has_services = !services.is_empty();

    let mut out: Vec<String> = Vec::new();

    out.push("// Code generated by quill; DO NOT EDIT.".to_string());
    out.push(format!("// package: {}", pkg));
    out.push(String::new());

    if uses_byte(doc) {
        out.push("export type byte = number;".to_string());
        out.push(String::new());
    }

    if !constants.is_empty() {
        for c in &constants {
            out.push(format!("export const {} = {};", c.name, c.value));
        }
        out.push(String::new());
    }

    for e in &enums {
        out.push(format!("export enum {} {{", e.name));
        for key in &e.keys {
            out.push(format!("  {} = \"{}\",", key.name, key.value));
        }
        out.push("}".to_string());
        out.push(String::new());
    }

    for m in &models {
        let extends = if m.extends.is_empty() {
            String::new()
        } else {
            format!(" extends {}", m.extends.join(", "))
        };
        out.push(format!("export interface {}{} {{", m.name, extends));
        for f in &m.fields {
            let optional = if f.optional { "?" } else { "" };
            out.push(format!("  {}{}: {};", f.name, optional, f.typ));
        }
        out.push("}".to_string());
        out.push(String::new());
    }

    if !errors.is_empty() || has_services {
        out.push(API_ERROR.to_string());
    }

    if !errors.is_empty() {
        out.push("export const errorCodes = {".to_string());
        for e in &errors {
            out.push(format!("  {}: {},", e.name, e.code));
        }
        out.push("} as const;".to_string());
        out.push(String::new());
    }

    if has_services {
        out.push(REQ_OPTS.to_string());
        if shapes.any_upload() {
            out.push(FILE_DATA.to_string());
        }
        if shapes.any_sse() {
            out.push(SUBSCRIPTION.to_string());
        }
        emit_client(&mut out, &shapes);
    }

    for service in &services {
        emit_service(&mut out, service);
    }

    let mut source = out.join("\n");
    if !source.ends_with('\n') {
        source.push('\n');
    }
    source
}

fn ts_model(model: &Model) -> TsModel {
    TsModel {
        name: model.name.name().to_string(),
        extends: model.extends.iter().map(|e| e.name.name().to_string()).collect(),
        fields: model
            .fields
            .iter()
            .filter_map(|field| {
                let mut name = strcase::to_snake(field.name.name());

                for option in &field.options.list {
                    if option.name.name() == "Json" {
                        match &option.value {
                            Value::String(v) => name = v.value.clone(),
                            Value::Bool(v) => {
                                if !v.value {
                                    name = String::new();
                                }
                            }
                            _ => {}
                        }
                        break;
                    }
                }

                // fields dropped from the JSON form never reach the client
                if name.is_empty() || name == "-" {
                    return None;
                }

                Some(TsField {
                    name,
                    typ: ts_type(&field.typ),
                    optional: field.optional,
                })
            })
            .collect(),
    }
}

fn ts_service(service: &Service) -> TsService {
    TsService {
        name: service.name.name().to_string(),
        methods: service
            .methods
            .iter()
            .map(|method| {
                let kind = classify_method(method);

                TsMethod {
                    name: method.name.name().to_string(),
                    service_name: service.name.name().to_string(),
                    kind,
                    args: method
                        .args
                        .iter()
                        .map(|a| TsArg {
                            name: a.name.name().to_string(),
                            typ: ts_type(&a.typ),
                            stream: a.stream,
                        })
                        .collect(),
                    return_types: method.returns.iter().map(|r| ts_type(&r.typ)).collect(),
                    sse_elem: method
                        .returns
                        .iter()
                        .find(|r| r.stream)
                        .map(|r| ts_type(&r.typ))
                        .unwrap_or_else(|| "any".to_string()),
                }
            })
            .collect(),
    }
}

fn ts_value(value: &Value) -> String {
    match value {
        Value::String(v) => {
            if v.token.kind == TokenKind::ConstStringSingleQuote {
                format!("\"{}\"", v.value.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                format_node(value)
            }
        }
        Value::Int(v) => v.value.to_string(),
        Value::ByteSize(v) => v.total_bytes().to_string(),
        Value::Duration(v) => v.total_nanoseconds().to_string(),
        _ => format_node(value),
    }
}

fn ts_type(typ: &Type) -> String {
    match typ {
        Type::Bool { .. } => "boolean".to_string(),
        Type::Int { .. } | Type::Uint { .. } | Type::Float { .. } => "number".to_string(),
        Type::String { .. } => "string".to_string(),
        Type::Any { .. } => "any".to_string(),
        Type::Timestamp { .. } => "string".to_string(),
        Type::Byte { .. } => "byte".to_string(),
        Type::Array { elem, .. } => format!("{}[]", ts_type(elem)),
        Type::Map { key, value, .. } => {
            format!("{{ [key: {}]: {} }}", ts_key_type(key), ts_type(value))
        }
        Type::Custom { token } => token.value.clone(),
    }
}

/// Index signature parameters only admit string and number.
fn ts_key_type(typ: &Type) -> String {
    match typ {
        Type::String { .. } => "string".to_string(),
        _ => "number".to_string(),
    }
}

fn uses_byte(doc: &Document) -> bool {
    fn has_byte(typ: &Type) -> bool {
        match typ {
            Type::Byte { .. } => true,
            Type::Array { elem, .. } => has_byte(elem),
            Type::Map { key, value, .. } => has_byte(key) || has_byte(value),
            _ => false,
        }
    }

    doc.models
        .iter()
        .flat_map(|m| &m.fields)
        .any(|f| has_byte(&f.typ))
        || doc
            .services
            .iter()
            .filter(|s| s.kind == ServiceKind::Http)
            .any(|s| {
                s.methods.iter().any(|m| {
                    m.args.iter().any(|a| has_byte(&a.typ))
                        || m.returns.iter().any(|r| has_byte(&r.typ))
                })
            })
}

/// `name: type` for every argument plus the trailing options parameter; a
/// streamed argument is projected as an upload-file list.
fn ts_args(args: &[TsArg]) -> String {
    let mut sb = String::new();

    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            sb.push_str(", ");
        }
        sb.push_str(&arg.name);
        sb.push_str(": ");
        if arg.stream {
            sb.push_str("fileData[]");
        } else {
            sb.push_str(&arg.typ);
        }
    }

    if !sb.is_empty() {
        sb.push_str(", ");
    }
    sb.push_str("_opts?: reqOpts");

    sb
}

/// The JSON parameter object sent with the request; stream args stay out.
fn ts_params(args: &[TsArg]) -> String {
    let names: Vec<&str> = args
        .iter()
        .filter(|a| !a.stream)
        .map(|a| a.name.as_str())
        .collect();

    if names.is_empty() {
        return "{}".to_string();
    }

    format!("{{ {} }}", names.join(", "))
}

fn ts_upload_arg(args: &[TsArg]) -> &str {
    args.iter()
        .find(|a| a.stream && a.typ == "byte[]")
        .map(|a| a.name.as_str())
        .unwrap_or("undefined")
}

fn ts_tuple(return_types: &[String]) -> String {
    format!("[{}]", return_types.join(", "))
}

fn emit_service(out: &mut Vec<String>, service: &TsService) {
    out.push(format!(
        "export function create{}Client(client: Client) {{",
        service.name
    ));
    out.push("  return {".to_string());

    for method in &service.methods {
        let path = format!("/{}/{}", method.service_name, method.name);
        let args = ts_args(&method.args);
        let params = ts_params(&method.args);

        match method.kind {
            MethodKind::JsonToJson => {
                let tuple = ts_tuple(&method.return_types);
                out.push(format!(
                    "    async {}({}): Promise<{}> {{",
                    method.name, args, tuple
                ));
                out.push(format!(
                    "      return client.callJson(\"{}\", {}, _opts) as Promise<{}>;",
                    path, params, tuple
                ));
                out.push("    },".to_string());
            }
            MethodKind::JsonToBinary => {
                out.push(format!(
                    "    async {}({}): Promise<Blob> {{",
                    method.name, args
                ));
                out.push(format!(
                    "      return client.callBlob(\"{}\", {}, _opts);",
                    path, params
                ));
                out.push("    },".to_string());
            }
            MethodKind::JsonToSse => {
                out.push(format!(
                    "    {}({}): subscription<{}> {{",
                    method.name, args, method.sse_elem
                ));
                out.push(format!(
                    "      return client.callSse<{}>(\"{}\", {}, _opts);",
                    method.sse_elem, path, params
                ));
                out.push("    },".to_string());
            }
            MethodKind::UploadToJson => {
                let tuple = ts_tuple(&method.return_types);
                out.push(format!(
                    "    async {}({}): Promise<{}> {{",
                    method.name, args, tuple
                ));
                out.push(format!(
                    "      return client.callUpload(\"{}\", {}, {}, _opts) as Promise<{}>;",
                    path,
                    params,
                    ts_upload_arg(&method.args),
                    tuple
                ));
                out.push("    },".to_string());
            }
            MethodKind::UploadToBinary => {
                out.push(format!(
                    "    async {}({}): Promise<Blob> {{",
                    method.name, args
                ));
                out.push(format!(
                    "      return client.callUploadBlob(\"{}\", {}, {}, _opts);",
                    path,
                    params,
                    ts_upload_arg(&method.args)
                ));
                out.push("    },".to_string());
            }
            MethodKind::UploadToSse => {
                out.push(format!(
                    "    {}({}): subscription<{}> {{",
                    method.name, args, method.sse_elem
                ));
                out.push(format!(
                    "      return client.callUploadSse<{}>(\"{}\", {}, {}, _opts);",
                    method.sse_elem,
                    path,
                    params,
                    ts_upload_arg(&method.args)
                ));
                out.push("    },".to_string());
            }
        }
    }

    out.push("  };".to_string());
    out.push("}".to_string());
    out.push(String::new());
}

fn emit_client(out: &mut Vec<String>, shapes: &Shapes) {
    out.push(CLIENT_HEAD.to_string());

    if shapes.json {
        out.push(CLIENT_CALL_JSON.to_string());
    }
    if shapes.blob {
        out.push(CLIENT_CALL_BLOB.to_string());
    }
    if shapes.any_sse() {
        out.push(CLIENT_SSE_CORE.to_string());
    }
    if shapes.sse {
        out.push(CLIENT_CALL_SSE.to_string());
    }
    if shapes.any_upload() {
        out.push(CLIENT_UPLOAD_BODY.to_string());
    }
    if shapes.upload {
        out.push(CLIENT_CALL_UPLOAD.to_string());
    }
    if shapes.upload_blob {
        out.push(CLIENT_CALL_UPLOAD_BLOB.to_string());
    }
    if shapes.upload_sse {
        out.push(CLIENT_CALL_UPLOAD_SSE.to_string());
    }

    out.push("}".to_string());
    out.push(String::new());
}

const API_ERROR: &str = r#"export class ApiError extends Error {
  constructor(
    public code: number,
    msg: string,
  ) {
    super(msg);
    this.name = "ApiError";
  }
}
"#;

const REQ_OPTS: &str = r#"export interface reqOpts {
  headers?: Record<string, string>;
  signal?: AbortSignal;
}
"#;

const FILE_DATA: &str = r#"export interface fileData {
  name: string;
  content: Blob;
}
"#;

const SUBSCRIPTION: &str = r#"export interface subscription<T> {
  close(): void;
  onMessage(cb: (msg: T) => void): void;
  onError(cb: (err: Error) => void): void;
}
"#;

const CLIENT_HEAD: &str = r#"export class Client {
  constructor(
    private host: string,
    private fetcher: typeof fetch = fetch,
  ) {}

  private async request(
    path: string,
    body: BodyInit,
    headers: Record<string, string>,
    opts?: reqOpts,
  ): Promise<Response> {
    const resp = await this.fetcher(this.host + path, {
      method: "POST",
      body,
      headers: { ...headers, ...(opts?.headers ?? {}) },
      signal: opts?.signal,
    });
    if (!resp.ok) {
      let code = 0;
      let msg = resp.statusText;
      try {
        const data = await resp.json();
        code = data.code ?? 0;
        msg = data.msg ?? msg;
      } catch {
        // the body was not a structured error
      }
      throw new ApiError(code, msg);
    }
    return resp;
  }
"#;

const CLIENT_CALL_JSON: &str = r#"  async callJson(path: string, params: unknown, opts?: reqOpts): Promise<unknown> {
    const resp = await this.request(
      path,
      JSON.stringify(params),
      { "Content-Type": "application/json" },
      opts,
    );
    return resp.json();
  }
"#;

const CLIENT_CALL_BLOB: &str = r#"  async callBlob(path: string, params: unknown, opts?: reqOpts): Promise<Blob> {
    const resp = await this.request(
      path,
      JSON.stringify(params),
      { "Content-Type": "application/json" },
      opts,
    );
    return resp.blob();
  }
"#;

const CLIENT_SSE_CORE: &str = r#"  private sse<T>(path: string, body: BodyInit, headers: Record<string, string>, opts?: reqOpts): subscription<T> {
    const messageHandlers: Array<(msg: T) => void> = [];
    const errorHandlers: Array<(err: Error) => void> = [];
    const controller = new AbortController();
    if (opts?.signal) {
      opts.signal.addEventListener("abort", () => controller.abort());
    }

    (async () => {
      const resp = await this.request(path, body, headers, {
        ...opts,
        signal: controller.signal,
      });
      if (!resp.body) {
        throw new ApiError(0, "response has no body");
      }

      const reader = resp.body.getReader();
      const decoder = new TextDecoder();
      let buffer = "";

      for (;;) {
        const { done, value } = await reader.read();
        if (done) {
          break;
        }
        buffer += decoder.decode(value, { stream: true });

        let index = buffer.indexOf("\n\n");
        while (index >= 0) {
          const chunk = buffer.slice(0, index);
          buffer = buffer.slice(index + 2);
          for (const line of chunk.split("\n")) {
            if (line.startsWith("data: ")) {
              const msg = JSON.parse(line.slice(6)) as T;
              for (const handler of messageHandlers) {
                handler(msg);
              }
            }
          }
          index = buffer.indexOf("\n\n");
        }
      }
    })().catch((err) => {
      for (const handler of errorHandlers) {
        handler(err as Error);
      }
    });

    return {
      close: () => controller.abort(),
      onMessage: (cb) => {
        messageHandlers.push(cb);
      },
      onError: (cb) => {
        errorHandlers.push(cb);
      },
    };
  }
"#;

const CLIENT_CALL_SSE: &str = r#"  callSse<T>(path: string, params: unknown, opts?: reqOpts): subscription<T> {
    return this.sse<T>(path, JSON.stringify(params), { "Content-Type": "application/json" }, opts);
  }
"#;

const CLIENT_UPLOAD_BODY: &str = r#"  private uploadBody(params: unknown, files: fileData[] | undefined): FormData {
    const form = new FormData();
    form.append("args", JSON.stringify(params));
    for (const file of files ?? []) {
      form.append("files", file.content, file.name);
    }
    return form;
  }
"#;

const CLIENT_CALL_UPLOAD: &str = r#"  async callUpload(
    path: string,
    params: unknown,
    files: fileData[] | undefined,
    opts?: reqOpts,
  ): Promise<unknown> {
    const resp = await this.request(path, this.uploadBody(params, files), {}, opts);
    return resp.json();
  }
"#;

const CLIENT_CALL_UPLOAD_BLOB: &str = r#"  async callUploadBlob(
    path: string,
    params: unknown,
    files: fileData[] | undefined,
    opts?: reqOpts,
  ): Promise<Blob> {
    const resp = await this.request(path, this.uploadBody(params, files), {}, opts);
    return resp.blob();
  }
"#;

const CLIENT_CALL_UPLOAD_SSE: &str = r#"  callUploadSse<T>(
    path: string,
    params: unknown,
    files: fileData[] | undefined,
    opts?: reqOpts,
  ): subscription<T> {
    return this.sse<T>(path, this.uploadBody(params, files), {}, opts);
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
        let out = gen(&["const MaxUpload = 10gb\nconst Wait = 1h"]);
        assert!(out.contains("export const MaxUpload = 10737418240;"));
        assert!(out.contains("export const Wait = 3600000000000;"));
    }

    #[test]
    fn test_enum_values_are_snake_case_strings() {
        let out = gen(&["enum Emotion {\n    _\n    VeryHappy\n    Excited\n}"]);
        assert!(out.contains("export enum Emotion {"));
        assert!(out.contains("  VeryHappy = \"very_happy\","));
        assert!(out.contains("  Excited = \"excited\","));
        assert!(!out.contains("_ ="));
    }

    #[test]
    fn test_model_fields_snake_cased_and_dropped() {
        let out = gen(&[concat!(
            "model Person {\n",
            "    FirstName: string\n",
            "    Nick?: string\n",
            "    Internal: string {\n",
            "        Json = false\n",
            "    }\n",
            "    Renamed: string {\n",
            "        Json = \"alias\"\n",
            "    }\n",
            "}"
        )]);
        assert!(out.contains("export interface Person {"));
        assert!(out.contains("  first_name: string;"));
        assert!(out.contains("  nick?: string;"));
        assert!(out.contains("  alias: string;"));
        assert!(!out.contains("internal"));
    }

    #[test]
    fn test_extends_clause() {
        let out = gen(&[
            "model Base {\n    Id: int64\n}\n\nmodel User {\n    ...Base\n    Name: string\n}",
        ]);
        assert!(out.contains("export interface User extends Base {"));
    }

    #[test]
    fn test_rpc_services_are_omitted() {
        let out = gen(&[concat!(
            "service RpcHidden {\n    M(a: string)\n}\n\n",
            "service HttpShown {\n    N(a: string) => (b: string)\n}"
        )]);
        assert!(!out.contains("RpcHidden"));
        assert!(out.contains("export function createHttpShownClient(client: Client) {"));
        assert!(out.contains("async N(a: string, _opts?: reqOpts): Promise<[string]> {"));
    }

    #[test]
    fn test_sse_method_returns_subscription() {
        let out = gen(&[
            "model Event {\n    Kind: string\n}\n\nservice HttpS {\n    Watch(topic: string) => (event: stream Event)\n}",
        ]);
        assert!(out.contains("Watch(topic: string, _opts?: reqOpts): subscription<Event> {"));
        assert!(out.contains("client.callSse<Event>(\"/HttpS/Watch\", { topic }, _opts)"));
        assert!(out.contains("export interface subscription<T> {"));
    }

    #[test]
    fn test_binary_method_returns_blob() {
        let out = gen(&["service HttpS {\n    Fetch(id: string) => (data: stream []byte)\n}"]);
        assert!(out.contains("async Fetch(id: string, _opts?: reqOpts): Promise<Blob> {"));
        assert!(out.contains("client.callBlob(\"/HttpS/Fetch\", { id }, _opts)"));
    }

    #[test]
    fn test_upload_method_takes_file_list() {
        let out = gen(&[
            "service HttpS {\n    Up(id: string, data: stream []byte) => (ok: bool)\n}",
        ]);
        assert!(out.contains("async Up(id: string, data: fileData[], _opts?: reqOpts): Promise<[boolean]> {"));
        assert!(out.contains("client.callUpload(\"/HttpS/Up\", { id }, data, _opts)"));
        assert!(out.contains("export interface fileData {"));
    }

    #[test]
    fn test_byte_alias_only_when_used() {
        let with_bytes = gen(&["model Blobby {\n    Data: []map<string, byte>\n}"]);
        assert!(with_bytes.contains("export type byte = number;"));

        let without = gen(&["model Plain {\n    Name: string\n}"]);
        assert!(!without.contains("export type byte = number;"));
    }

    #[test]
    fn test_timestamp_and_map_types() {
        let out = gen(&[
            "model Log {\n    At: timestamp\n    Tags: map<string, []string>\n    Counts: map<int32, int64>\n}",
        ]);
        assert!(out.contains("  at: string;"));
        assert!(out.contains("  tags: { [key: string]: string[] };"));
        assert!(out.contains("  counts: { [key: number]: number };"));
    }
}
