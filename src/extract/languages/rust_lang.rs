//! Rust front end.

use crate::comments::CommentSyntax;
use crate::extract::{DocPlacement, GrammarSpec, Language, TreeSitterFrontend};

pub static COMMENT_SYNTAX: CommentSyntax = CommentSyntax {
    line_markers: &["//"],
    doc_line_markers: &["///", "//!"],
    plain_overrides: &["////"],
    block: Some(("/*", "*/")),
    doc_block_openers: &["/**", "/*!"],
    inner_doc_markers: &["//!", "/*!"],
    nested_blocks: true,
    string_quotes: b"\"'",
    lifetimes: true,
    triple_quotes: false,
    raw_strings: true,
    backtick_strings: false,
    backtick_escapes: false,
    multiline_strings: true,
    docstrings: false,
    regex_literals: false,
};

pub static GRAMMAR: GrammarSpec = GrammarSpec {
    function_kinds: &["function_item", "function_signature_item"],
    method_kinds: &[],
    anonymous_function_kinds: &["closure_expression"],
    declarator_kinds: &[],
    declaration_kinds: &[],
    class_kinds: &["struct_item", "enum_item", "union_item", "trait_item"],
    method_containers: &["impl_item", "trait_item"],
    block_kinds: &[
        "if_expression",
        "match_expression",
        "for_expression",
        "while_expression",
        "loop_expression",
    ],
    branch_kinds: &[
        "if_expression",
        "for_expression",
        "while_expression",
        "loop_expression",
        "match_arm",
        "try_expression",
    ],
    logical_operators: &["&&", "||"],
    logical_parents: &["binary_expression"],
    comment_kinds: &["line_comment", "block_comment"],
    wrapper_kinds: &[],
    attribute_kinds: &["attribute_item"],
    string_kinds: &["string_literal", "raw_string_literal", "char_literal"],
    identifier_kinds: &["identifier"],
    parameter_fields: &["parameters"],
    return_fields: &["return_type"],
    void_kinds: &["unit_type", "never_type"],
    body_fields: &["body"],
    body_container_kinds: &[
        "block",
        "declaration_list",
        "field_declaration_list",
        "enum_variant_list",
    ],
    receivers: &["self"],
    docstring_in_body: false,
};

pub fn frontend() -> TreeSitterFrontend {
    TreeSitterFrontend::new(
        Language::Rust,
        &["rs"],
        tree_sitter_rust::LANGUAGE.into(),
        &GRAMMAR,
        &COMMENT_SYNTAX,
        DocPlacement::Before,
    )
}
