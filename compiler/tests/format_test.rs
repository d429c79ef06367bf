use quill_compiler::ast::{format_node, Document};
use quill_compiler::parser::{parse_document, Parser};

fn parse(input: &str) -> Document {
    let mut parser = Parser::new(input);
    parse_document(&mut parser).expect(input)
}

fn format(input: &str) -> String {
    format_node(&parse(input))
}

#[test]
fn test_format_is_idempotent() {
    let inputs = [
        "const A = 10gb\nconst B = 'hi'\nconst C = `raw`",
        "enum Status {\n\tActive\n\tBanned = 10\n\tDeleted\n}",
        "model User {\n  ...Base\n  Id: int64\n  Name?: string {\n    Json = \"name\"\n    Required\n  }\n}",
        "service HttpUserService {\n  GetUser(id: int64) => (user: User)\n  Upload(data: stream []byte)\n}",
        "error ErrNope { Code = 7 Msg = \"nope\" }",
        "# top comment\nconst A = 1\n\nmodel M {\n  # field comment\n  F: string\n}\n# trailing comment",
    ];

    for input in inputs {
        let once = format(input);
        let twice = format(&once);
        assert_eq!(once, twice, "input: {input}");
    }
}

#[test]
fn test_format_round_trips_to_equal_ast() {
    let input = concat!(
        "const A = 1_000\n",
        "\n",
        "enum Kind {\n",
        "    _\n",
        "    First\n",
        "    Second = 5\n",
        "}\n",
        "\n",
        "model M {\n",
        "    F?: map<string, []int32>\n",
        "}\n",
        "\n",
        "service RpcS {\n",
        "    M (a: string) => (b: bool)\n",
        "}\n",
        "\n",
        "error ErrX { Msg = 'x' }"
    );

    // once formatted, the text is canonical: parsing it and formatting again
    // reproduces the same text, and the two parses agree token for token
    let formatted = format_node(&parse(input));
    let canonical = parse(&formatted);
    assert_eq!(format_node(&canonical), formatted);
    assert_eq!(canonical, parse(&formatted));
}

#[test]
fn test_document_section_separators() {
    let input = "const A = 1\nenum E {\n  K\n}\nmodel M {\n  F: string\n}\nservice RpcS {\n  M()\n}\nerror ErrX { Msg = \"x\" }";
    let out = format(input);

    assert_eq!(
        out,
        concat!(
            "const A = 1\n",
            "\n",
            "enum E {\n",
            "    K\n",
            "}\n",
            "\n",
            "model M {\n",
            "    F: string\n",
            "}\n",
            "\n",
            "service RpcS {\n",
            "    M ()\n",
            "}\n",
            "\n",
            "error ErrX { Msg = \"x\" }"
        )
    );
}

#[test]
fn test_string_quote_styles_are_preserved() {
    assert_eq!(format("const A = 'single'"), "const A = 'single'");
    assert_eq!(format("const B = \"double\""), "const B = \"double\"");
    assert_eq!(format("const C = `tick`"), "const C = `tick`");
}

#[test]
fn test_comments_keep_their_positions() {
    let input = concat!(
        "# above the model\n",
        "model User {\n",
        "    # above the field\n",
        "    Id: int64\n",
        "    # at the bottom\n",
        "}"
    );

    let out = format(input);
    assert_eq!(
        out,
        concat!(
            "# above the model\n",
            "model User {\n",
            "    # above the field\n",
            "    Id: int64\n",
            "    # at the bottom\n",
            "}"
        )
    );
}

#[test]
fn test_method_options_format_under_their_carrier() {
    let input = "service HttpS {\n  M(a: string) {\n    Required\n    Timeout = 1h\n  }\n}";
    let out = format(input);

    assert_eq!(
        out,
        concat!(
            "service HttpS {\n",
            "    M (a: string) {\n",
            "        Required\n",
            "        Timeout = 1h\n",
            "    }\n",
            "}"
        )
    );
}

#[test]
fn test_enum_comments_attach_to_sets() {
    let input = "enum E {\n  # first\n  A\n  B\n}";
    let out = format(input);

    assert_eq!(out, "enum E {\n    # first\n    A\n    B\n}");
    assert_eq!(out, format(&out));
}

#[test]
fn test_implicit_enum_values_stay_implicit() {
    // auto-assigned values must not be written out when formatting
    let out = format("enum E {\n  A\n  B = 3\n  C\n}");
    assert_eq!(out, "enum E {\n    A\n    B = 3\n    C\n}");
}

#[test]
fn test_underscore_separators_are_preserved() {
    assert_eq!(format("const A = 1_000_000"), "const A = 1_000_000");
    assert_eq!(format("const B = 1_200kb"), "const B = 1_200kb");
    assert_eq!(format("const C = 0.1_0"), "const C = 0.1_0");
}
