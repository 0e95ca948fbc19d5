//! Language front end registry.

pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust_lang;
pub mod typescript;

use std::path::Path;

use once_cell::sync::OnceCell;

use super::{Language, LanguageFrontend, TreeSitterFrontend};

static GO_FRONTEND: OnceCell<TreeSitterFrontend> = OnceCell::new();
static JAVA_FRONTEND: OnceCell<TreeSitterFrontend> = OnceCell::new();
static JAVASCRIPT_FRONTEND: OnceCell<TreeSitterFrontend> = OnceCell::new();
static PYTHON_FRONTEND: OnceCell<TreeSitterFrontend> = OnceCell::new();
static RUST_FRONTEND: OnceCell<TreeSitterFrontend> = OnceCell::new();
static TYPESCRIPT_FRONTEND: OnceCell<TreeSitterFrontend> = OnceCell::new();

/// Front end for a language, built on first use.
pub fn frontend_for(language: Language) -> Option<&'static dyn LanguageFrontend> {
    let frontend = match language {
        Language::Go => GO_FRONTEND.get_or_init(go::frontend),
        Language::Java => JAVA_FRONTEND.get_or_init(java::frontend),
        Language::JavaScript => JAVASCRIPT_FRONTEND.get_or_init(javascript::frontend),
        Language::Python => PYTHON_FRONTEND.get_or_init(python::frontend),
        Language::Rust => RUST_FRONTEND.get_or_init(rust_lang::frontend),
        Language::TypeScript => TYPESCRIPT_FRONTEND.get_or_init(typescript::frontend),
    };
    Some(frontend as &'static dyn LanguageFrontend)
}

/// Front end for a file path, by extension.
pub fn frontend_for_path(path: &Path) -> Option<&'static dyn LanguageFrontend> {
    Language::from_path(path).and_then(frontend_for)
}

/// All file extensions with a registered front end.
pub fn supported_extensions() -> Vec<&'static str> {
    Language::ALL
        .iter()
        .filter_map(|l| frontend_for(*l))
        .flat_map(|f| f.extensions().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_frontend() {
        for language in Language::ALL {
            let frontend = frontend_for(language).expect("registered");
            assert_eq!(frontend.language(), language);
            for ext in frontend.extensions() {
                assert_eq!(Language::from_extension(ext), Some(language));
            }
        }
    }

    #[test]
    fn test_frontend_for_path() {
        assert!(frontend_for_path(Path::new("src/lib.rs")).is_some());
        assert!(frontend_for_path(Path::new("notes.txt")).is_none());
        assert!(supported_extensions().contains(&"tsx"));
    }
}
