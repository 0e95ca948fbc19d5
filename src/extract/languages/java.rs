//! Java front end.

use crate::comments::CommentSyntax;
use crate::extract::{DocPlacement, GrammarSpec, Language, TreeSitterFrontend};

pub static COMMENT_SYNTAX: CommentSyntax = CommentSyntax {
    line_markers: &["//"],
    doc_line_markers: &[],
    plain_overrides: &[],
    block: Some(("/*", "*/")),
    doc_block_openers: &["/**"],
    inner_doc_markers: &[],
    nested_blocks: false,
    string_quotes: b"\"'",
    lifetimes: false,
    triple_quotes: true,
    raw_strings: false,
    backtick_strings: false,
    backtick_escapes: false,
    multiline_strings: false,
    docstrings: false,
    regex_literals: false,
};

pub static GRAMMAR: GrammarSpec = GrammarSpec {
    function_kinds: &[],
    method_kinds: &["method_declaration", "constructor_declaration"],
    anonymous_function_kinds: &["lambda_expression"],
    declarator_kinds: &[],
    declaration_kinds: &[],
    class_kinds: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
    ],
    method_containers: &["class_body", "interface_body", "enum_body"],
    block_kinds: &[
        "if_statement",
        "for_statement",
        "enhanced_for_statement",
        "while_statement",
        "do_statement",
        "switch_expression",
        "try_statement",
        "try_with_resources_statement",
    ],
    branch_kinds: &[
        "if_statement",
        "for_statement",
        "enhanced_for_statement",
        "while_statement",
        "do_statement",
        "catch_clause",
        "ternary_expression",
        "switch_block_statement_group",
        "switch_rule",
    ],
    logical_operators: &["&&", "||"],
    logical_parents: &["binary_expression"],
    comment_kinds: &["line_comment", "block_comment", "comment"],
    wrapper_kinds: &[],
    attribute_kinds: &[],
    string_kinds: &["string_literal", "character_literal"],
    identifier_kinds: &["identifier"],
    parameter_fields: &["parameters"],
    return_fields: &["type"],
    void_kinds: &["void_type"],
    body_fields: &["body"],
    body_container_kinds: &[
        "block",
        "constructor_body",
        "class_body",
        "interface_body",
        "enum_body",
    ],
    receivers: &["this"],
    docstring_in_body: false,
};

pub fn frontend() -> TreeSitterFrontend {
    TreeSitterFrontend::new(
        Language::Java,
        &["java"],
        tree_sitter_java::LANGUAGE.into(),
        &GRAMMAR,
        &COMMENT_SYNTAX,
        DocPlacement::Before,
    )
}
