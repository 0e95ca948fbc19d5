//! JavaScript front end.

use crate::comments::CommentSyntax;
use crate::extract::{DocPlacement, GrammarSpec, Language, TreeSitterFrontend};

/// Shared with TypeScript.
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
    triple_quotes: false,
    raw_strings: false,
    backtick_strings: true,
    backtick_escapes: true,
    multiline_strings: false,
    docstrings: false,
    regex_literals: true,
};

pub static GRAMMAR: GrammarSpec = GrammarSpec {
    function_kinds: &["function_declaration", "generator_function_declaration"],
    method_kinds: &["method_definition"],
    anonymous_function_kinds: &[
        "arrow_function",
        "function_expression",
        "function",
        "generator_function",
    ],
    declarator_kinds: &["variable_declarator"],
    declaration_kinds: &["lexical_declaration", "variable_declaration"],
    class_kinds: &["class_declaration"],
    method_containers: &["class_body"],
    block_kinds: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "switch_statement",
        "try_statement",
    ],
    branch_kinds: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "switch_case",
        "catch_clause",
        "ternary_expression",
    ],
    logical_operators: &["&&", "||", "??"],
    logical_parents: &["binary_expression"],
    comment_kinds: &["comment", "html_comment"],
    wrapper_kinds: &["export_statement"],
    attribute_kinds: &["decorator"],
    string_kinds: &["string", "template_string", "regex"],
    identifier_kinds: &["identifier", "shorthand_property_identifier_pattern"],
    parameter_fields: &["parameters", "parameter"],
    return_fields: &[],
    void_kinds: &[],
    body_fields: &["body"],
    body_container_kinds: &["statement_block", "class_body"],
    receivers: &["this"],
    docstring_in_body: false,
};

pub fn frontend() -> TreeSitterFrontend {
    TreeSitterFrontend::new(
        Language::JavaScript,
        &["js", "jsx", "mjs", "cjs"],
        tree_sitter_javascript::LANGUAGE.into(),
        &GRAMMAR,
        &COMMENT_SYNTAX,
        DocPlacement::Before,
    )
}
