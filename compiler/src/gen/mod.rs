//! Multi-target code generation. Dispatch is keyed by the output file
//! extension; every back-end receives the merged document bag after
//! validation and renders a single self-contained source file.

mod golang;
mod typescript;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{Document, Method};
use crate::error::QuillError;

/// The six I/O shapes a service method can take, computed from the stream
/// markers and the streamed return's element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    JsonToJson,
    JsonToBinary,
    JsonToSse,
    UploadToJson,
    UploadToBinary,
    UploadToSse,
}

/// The stream keyword appears at most once in the arguments and once in the
/// returns; the validator has already enforced the placement rules.
pub fn classify_method(method: &Method) -> MethodKind {
    let arg_stream = method.args.iter().any(|a| a.stream);

    let (ret_stream, ret_bytes) = match method.returns.iter().find(|r| r.stream) {
        Some(ret) => (true, ret.typ.is_byte_array()),
        None => (false, false),
    };

    match (arg_stream, ret_stream, ret_bytes) {
        (false, false, _) => MethodKind::JsonToJson,
        (false, true, true) => MethodKind::JsonToBinary,
        (false, true, false) => MethodKind::JsonToSse,
        (true, false, _) => MethodKind::UploadToJson,
        (true, true, true) => MethodKind::UploadToBinary,
        (true, true, false) => MethodKind::UploadToSse,
    }
}

/// All documents compile into a single output file, so the bag is merged
/// first, preserving the order the files were supplied in.
fn merge_documents(docs: &[Document]) -> Document {
    let mut main_doc = Document::default();

    for doc in docs {
        main_doc.consts.extend(doc.consts.iter().cloned());
        main_doc.enums.extend(doc.enums.iter().cloned());
        main_doc.models.extend(doc.models.iter().cloned());
        main_doc.services.extend(doc.services.iter().cloned());
        main_doc.errors.extend(doc.errors.iter().cloned());
    }

    main_doc
}

/// Render the merged bag for the target inferred from `output`'s extension
/// and write it out. The write goes to a temp path first and is renamed into
/// place so a failed run never leaves a half-written file behind.
pub fn generate(pkg: &str, output: &Path, docs: &[Document]) -> Result<(), QuillError> {
    let doc = merge_documents(docs);

    let source = render(pkg, output, &doc)?;

    let mut tmp: OsString = output.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, source)?;
    fs::rename(&tmp, output)?;

    Ok(())
}

/// Render without touching the filesystem; the CLI and the tests both go
/// through this.
pub fn render(pkg: &str, output: &Path, doc: &Document) -> Result<String, QuillError> {
    match output.extension().and_then(|ext| ext.to_str()) {
        Some("go") => Ok(golang::generate(pkg, doc)),
        Some("ts") => Ok(typescript::generate(pkg, doc)),
        _ => Err(QuillError::UnknownTarget(output.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_document, Parser};

    fn method_kind(input: &str) -> MethodKind {
        let mut parser = Parser::new(input);
        let doc = parse_document(&mut parser).unwrap();
        classify_method(&doc.services[0].methods[0])
    }

    #[test]
    fn test_method_classification() {
        let cases = [
            ("service HttpS {\n    M(a: string) => (r: string)\n}", MethodKind::JsonToJson),
            ("service HttpS {\n    M() => (r: stream []byte)\n}", MethodKind::JsonToBinary),
            ("service HttpS {\n    M() => (r: stream any)\n}", MethodKind::JsonToSse),
            ("service HttpS {\n    M(a: stream []byte)\n}", MethodKind::UploadToJson),
            (
                "service HttpS {\n    M(a: stream []byte) => (r: stream []byte)\n}",
                MethodKind::UploadToBinary,
            ),
            (
                "service HttpS {\n    M(a: stream []byte) => (r: stream Event)\n}",
                MethodKind::UploadToSse,
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(method_kind(input), expected, "input: {input}");
        }
    }

    #[test]
    fn test_unknown_target() {
        let doc = Document::default();
        let err = render("rpc", Path::new("out.java"), &doc).unwrap_err();
        assert!(matches!(err, QuillError::UnknownTarget(_)));
    }
}
