//! Go front end.

use crate::comments::CommentSyntax;
use crate::extract::{DocPlacement, GrammarSpec, Language, TreeSitterFrontend};

pub static COMMENT_SYNTAX: CommentSyntax = CommentSyntax {
    line_markers: &["//"],
    doc_line_markers: &[],
    plain_overrides: &[],
    block: Some(("/*", "*/")),
    doc_block_openers: &[],
    inner_doc_markers: &[],
    nested_blocks: false,
    string_quotes: b"\"'",
    lifetimes: false,
    triple_quotes: false,
    raw_strings: false,
    backtick_strings: true,
    backtick_escapes: false,
    multiline_strings: false,
    docstrings: false,
    regex_literals: false,
};

pub static GRAMMAR: GrammarSpec = GrammarSpec {
    function_kinds: &["function_declaration"],
    method_kinds: &["method_declaration", "method_elem"],
    anonymous_function_kinds: &["func_literal"],
    declarator_kinds: &[],
    declaration_kinds: &["type_declaration"],
    class_kinds: &["type_spec"],
    method_containers: &[],
    block_kinds: &[
        "if_statement",
        "for_statement",
        "expression_switch_statement",
        "type_switch_statement",
        "select_statement",
    ],
    branch_kinds: &[
        "if_statement",
        "for_statement",
        "expression_case",
        "type_case",
        "communication_case",
    ],
    logical_operators: &["&&", "||"],
    logical_parents: &["binary_expression"],
    comment_kinds: &["comment"],
    wrapper_kinds: &[],
    attribute_kinds: &[],
    string_kinds: &["interpreted_string_literal", "raw_string_literal", "rune_literal"],
    identifier_kinds: &["identifier"],
    parameter_fields: &["parameters"],
    return_fields: &["result"],
    void_kinds: &[],
    body_fields: &["body", "type"],
    body_container_kinds: &["block", "statement_list"],
    receivers: &[],
    docstring_in_body: false,
};

pub fn frontend() -> TreeSitterFrontend {
    TreeSitterFrontend::new(
        Language::Go,
        &["go"],
        tree_sitter_go::LANGUAGE.into(),
        &GRAMMAR,
        &COMMENT_SYNTAX,
        DocPlacement::Before,
    )
}
