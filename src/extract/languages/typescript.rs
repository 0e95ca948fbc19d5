//! TypeScript front end (`.tsx` files use the TSX grammar).

use crate::extract::{DocPlacement, GrammarSpec, Language, TreeSitterFrontend};

use super::javascript::COMMENT_SYNTAX;

pub static GRAMMAR: GrammarSpec = GrammarSpec {
    function_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "function_signature",
    ],
    method_kinds: &[
        "method_definition",
        "method_signature",
        "abstract_method_signature",
    ],
    anonymous_function_kinds: &[
        "arrow_function",
        "function_expression",
        "function",
        "generator_function",
    ],
    declarator_kinds: &["variable_declarator"],
    declaration_kinds: &["lexical_declaration", "variable_declaration"],
    class_kinds: &[
        "class_declaration",
        "abstract_class_declaration",
        "interface_declaration",
    ],
    method_containers: &["class_body", "interface_body", "object_type"],
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
    return_fields: &["return_type"],
    void_kinds: &[],
    body_fields: &["body"],
    body_container_kinds: &["statement_block", "class_body", "interface_body", "object_type"],
    receivers: &["this"],
    docstring_in_body: false,
};

pub fn frontend() -> TreeSitterFrontend {
    TreeSitterFrontend::new(
        Language::TypeScript,
        &["ts", "tsx", "mts", "cts"],
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        &GRAMMAR,
        &COMMENT_SYNTAX,
        DocPlacement::Before,
    )
    .with_dialect("tsx", tree_sitter_typescript::LANGUAGE_TSX.into())
}
