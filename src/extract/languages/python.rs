//! Python front end.

use crate::comments::CommentSyntax;
use crate::extract::{DocPlacement, GrammarSpec, Language, TreeSitterFrontend};

pub static COMMENT_SYNTAX: CommentSyntax = CommentSyntax {
    line_markers: &["#"],
    doc_line_markers: &[],
    plain_overrides: &[],
    block: None,
    doc_block_openers: &[],
    inner_doc_markers: &[],
    nested_blocks: false,
    string_quotes: b"\"'",
    lifetimes: false,
    triple_quotes: true,
    raw_strings: false,
    backtick_strings: false,
    backtick_escapes: false,
    multiline_strings: false,
    docstrings: true,
    regex_literals: false,
};

pub static GRAMMAR: GrammarSpec = GrammarSpec {
    function_kinds: &["function_definition"],
    method_kinds: &[],
    anonymous_function_kinds: &["lambda"],
    declarator_kinds: &[],
    declaration_kinds: &[],
    class_kinds: &["class_definition"],
    method_containers: &["class_definition"],
    block_kinds: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "try_statement",
        "match_statement",
    ],
    branch_kinds: &[
        "if_statement",
        "elif_clause",
        "for_statement",
        "while_statement",
        "except_clause",
        "except_group_clause",
        "case_clause",
        "conditional_expression",
        "for_in_clause",
        "if_clause",
    ],
    logical_operators: &["and", "or"],
    logical_parents: &["boolean_operator"],
    comment_kinds: &["comment"],
    wrapper_kinds: &["decorated_definition"],
    attribute_kinds: &[],
    string_kinds: &["string", "concatenated_string"],
    identifier_kinds: &["identifier"],
    parameter_fields: &["parameters"],
    return_fields: &["return_type"],
    void_kinds: &[],
    body_fields: &["body"],
    body_container_kinds: &["block"],
    receivers: &["self", "cls"],
    docstring_in_body: true,
};

pub fn frontend() -> TreeSitterFrontend {
    TreeSitterFrontend::new(
        Language::Python,
        &["py", "pyi"],
        tree_sitter_python::LANGUAGE.into(),
        &GRAMMAR,
        &COMMENT_SYNTAX,
        DocPlacement::Inside,
    )
}
