use crate::error::SpellError;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const C_BLOCK: &str = r"/\*[\s\S]*?\*/";
const C_LINE: &str = r"//[^\n]*";
const HASH_LINE: &str = r"#[^\n]*";
const HTML_COMMENT: &str = r"<!--[\s\S]*?-->";
const DASH_LINE: &str = r"--[^\n]*";

const DOUBLE_QUOTED: &str = r#""(?:[^"\\\n]|\\.)*""#;
const SINGLE_QUOTED: &str = r"'(?:[^'\\\n]|\\.)*'";
const BACKTICK_QUOTED: &str = r"`(?:[^`\\]|\\.)*`";
const TRIPLE_DOUBLE: &str = r#""""[\s\S]*?""""#;
const TRIPLE_SINGLE: &str = r"'''[\s\S]*?'''";

const IDENT: &str = r"\b[A-Za-z_][A-Za-z0-9_]*\b";
const IDENT_DOLLAR: &str = r"\$?\b[A-Za-z_][A-Za-z0-9_]*\b";
const IDENT_KEBAB: &str = r"\b[A-Za-z][A-Za-z0-9_-]*\b";

/// Keywords shared by most languages. Always excluded from identifier checks.
const COMMON_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "return", "break", "continue", "switch", "case",
    "default", "try", "catch", "finally", "throw", "new", "this", "self", "true", "false",
    "null", "nil", "none", "void", "int", "bool", "char", "string", "var", "let", "const",
    "function", "func", "fn", "def", "class", "struct", "enum", "interface", "import",
    "export", "from", "as", "in", "is", "not", "and", "or", "public", "private",
    "protected", "static", "async", "await", "yield", "typeof", "instanceof", "extends",
    "implements", "package", "module", "use", "namespace", "println", "printf", "args",
    "argv", "str", "len", "src", "util", "utils", "config", "params", "obj", "tmp", "err",
];

struct BuiltinLanguage {
    id: &'static str,
    comments: &'static [&'static str],
    strings: &'static [&'static str],
    identifier: &'static str,
    check_identifiers: bool,
    keywords: &'static [&'static str],
}

const BUILTIN_LANGUAGES: &[BuiltinLanguage] = &[
    BuiltinLanguage {
        id: "javascript",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED, BACKTICK_QUOTED],
        identifier: IDENT_DOLLAR,
        check_identifiers: true,
        keywords: &[
            "undefined", "delete", "with", "debugger", "arguments", "prototype", "console",
            "document", "window", "require", "constructor", "super", "of", "get", "set",
        ],
    },
    BuiltinLanguage {
        id: "typescript",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED, BACKTICK_QUOTED],
        identifier: IDENT_DOLLAR,
        check_identifiers: true,
        keywords: &[
            "undefined", "type", "readonly", "keyof", "unknown", "never", "any", "number",
            "boolean", "symbol", "declare", "abstract", "constructor", "super", "of",
        ],
    },
    BuiltinLanguage {
        id: "python",
        comments: &[HASH_LINE],
        strings: &[TRIPLE_DOUBLE, TRIPLE_SINGLE, DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "elif", "lambda", "pass", "raise", "except", "global", "nonlocal", "assert",
            "del", "with", "print", "range", "dict", "list", "tuple", "float", "kwargs",
            "init", "isinstance", "enumerate",
        ],
    },
    BuiltinLanguage {
        id: "java",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "abstract", "final", "synchronized", "volatile", "transient", "native", "throws",
            "boolean", "byte", "short", "long", "float", "double", "super", "system",
        ],
    },
    BuiltinLanguage {
        id: "c",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "auto", "extern", "register", "signed", "unsigned", "sizeof", "typedef", "union",
            "volatile", "goto", "long", "short", "double", "float", "include", "define",
            "ifdef", "ifndef", "endif", "malloc", "free", "stdio", "stdlib",
        ],
    },
    BuiltinLanguage {
        id: "cpp",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "auto", "template", "typename", "virtual", "override", "constexpr", "nullptr",
            "std", "cout", "cin", "endl", "vector", "sizeof", "typedef", "operator",
            "include", "define", "friend", "mutable", "explicit",
        ],
    },
    BuiltinLanguage {
        id: "csharp",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "using", "virtual", "override", "sealed", "readonly", "internal", "decimal",
            "object", "base", "foreach", "get", "set", "value", "event", "delegate",
        ],
    },
    BuiltinLanguage {
        id: "go",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, BACKTICK_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "chan", "defer", "fallthrough", "go", "goto", "map", "range", "select", "type",
            "fmt", "make", "append", "error", "rune", "byte", "uint",
        ],
    },
    BuiltinLanguage {
        id: "rust",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "impl", "trait", "mut", "pub", "crate", "mod", "match", "loop", "where", "dyn",
            "unsafe", "move", "ref", "usize", "isize", "vec", "derive", "some", "ok", "impls",
        ],
    },
    BuiltinLanguage {
        id: "php",
        comments: &[C_BLOCK, C_LINE, HASH_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT_DOLLAR,
        check_identifiers: true,
        keywords: &[
            "echo", "elseif", "endif", "foreach", "endforeach", "array", "isset", "unset",
            "require", "include", "once", "global", "php",
        ],
    },
    BuiltinLanguage {
        id: "ruby",
        comments: &[r"=begin[\s\S]*?=end", HASH_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "elsif", "unless", "until", "begin", "rescue", "ensure", "end", "then", "puts",
            "attr", "accessor", "reader", "writer", "require", "lambda", "proc",
        ],
    },
    BuiltinLanguage {
        id: "swift",
        comments: &[C_BLOCK, C_LINE],
        strings: &[TRIPLE_DOUBLE, DOUBLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "guard", "inout", "defer", "extension", "protocol", "mutating", "override",
            "fileprivate", "internal", "open", "weak", "unowned", "lazy", "optional",
        ],
    },
    BuiltinLanguage {
        id: "kotlin",
        comments: &[C_BLOCK, C_LINE],
        strings: &[TRIPLE_DOUBLE, DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "fun", "val", "when", "object", "companion", "data", "sealed", "override", "open",
            "lateinit", "inline", "reified", "suspend", "println",
        ],
    },
    BuiltinLanguage {
        id: "scala",
        comments: &[C_BLOCK, C_LINE],
        strings: &[TRIPLE_DOUBLE, DOUBLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &[
            "val", "object", "trait", "sealed", "override", "implicit", "lazy", "match",
            "case", "with", "extends", "yield", "println",
        ],
    },
    BuiltinLanguage {
        id: "bash",
        comments: &[HASH_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: false,
        keywords: &[
            "then", "elif", "fi", "esac", "done", "echo", "local", "export", "source",
            "unset", "shift", "exit",
        ],
    },
    BuiltinLanguage {
        id: "sql",
        comments: &[C_BLOCK, DASH_LINE],
        strings: &[SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: false,
        keywords: &[
            "select", "where", "insert", "update", "delete", "into", "values", "create",
            "table", "drop", "alter", "join", "left", "right", "inner", "outer", "group",
            "order", "by", "having", "limit", "varchar", "primary", "key",
        ],
    },
    BuiltinLanguage {
        id: "html",
        comments: &[HTML_COMMENT],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT_KEBAB,
        check_identifiers: false,
        keywords: &["div", "span", "href", "src", "html", "head", "body", "meta", "script"],
    },
    BuiltinLanguage {
        id: "xml",
        comments: &[HTML_COMMENT],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT_KEBAB,
        check_identifiers: false,
        keywords: &["xml", "xmlns", "encoding", "version"],
    },
    BuiltinLanguage {
        id: "css",
        comments: &[C_BLOCK],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT_KEBAB,
        check_identifiers: false,
        keywords: &["px", "em", "rem", "important", "media", "rgba", "rgb", "url"],
    },
    BuiltinLanguage {
        id: "scss",
        comments: &[C_BLOCK, C_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT_KEBAB,
        check_identifiers: false,
        keywords: &["px", "em", "rem", "important", "mixin", "extend", "media"],
    },
    BuiltinLanguage {
        id: "yaml",
        comments: &[HASH_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: false,
        keywords: &["yes", "no", "on", "off"],
    },
    BuiltinLanguage {
        id: "json",
        comments: &[],
        strings: &[DOUBLE_QUOTED],
        identifier: IDENT,
        check_identifiers: false,
        keywords: &[],
    },
    BuiltinLanguage {
        id: "markdown",
        comments: &[HTML_COMMENT],
        strings: &[DOUBLE_QUOTED],
        identifier: IDENT,
        check_identifiers: false,
        keywords: &[],
    },
    BuiltinLanguage {
        id: "lua",
        comments: &[r"--\[\[[\s\S]*?\]\]", DASH_LINE],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        identifier: IDENT,
        check_identifiers: true,
        keywords: &["local", "then", "elseif", "end", "repeat", "until", "pairs", "ipairs"],
    },
];

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("node", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("python3", "python"),
    ("rb", "ruby"),
    ("yml", "yaml"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("c++", "cpp"),
    ("cc", "cpp"),
    ("hpp", "cpp"),
    ("h", "c"),
    ("cs", "csharp"),
    ("c#", "csharp"),
    ("rs", "rust"),
    ("golang", "go"),
    ("kt", "kotlin"),
    ("kts", "kotlin"),
    ("htm", "html"),
    ("svg", "xml"),
    ("md", "markdown"),
    ("sass", "scss"),
    ("postgres", "sql"),
    ("mysql", "sql"),
];

lazy_static! {
    static ref BUILTIN: Vec<Arc<LanguageConfig>> = BUILTIN_LANGUAGES
        .iter()
        .map(|entry| {
            Arc::new(
                LanguageConfig::new(
                    entry.id,
                    entry.comments,
                    entry.strings,
                    entry.identifier,
                    entry.check_identifiers,
                    entry.keywords,
                )
                .unwrap(),
            )
        })
        .collect();
    static ref COMMON: HashSet<&'static str> = COMMON_KEYWORDS.iter().copied().collect();
}

#[derive(Debug)]
pub struct LanguageConfig {
    pub id: String,
    pub comment_patterns: Vec<Regex>,
    pub string_patterns: Vec<Regex>,
    pub identifier_pattern: Regex,
    pub check_identifiers: bool,
    pub keywords: HashSet<String>,
}

impl LanguageConfig {
    pub fn new(
        id: &str,
        comments: &[&str],
        strings: &[&str],
        identifier: &str,
        check_identifiers: bool,
        keywords: &[&str],
    ) -> Result<Self, SpellError> {
        Ok(Self {
            id: id.to_lowercase(),
            comment_patterns: compile_all(comments)?,
            string_patterns: compile_all(strings)?,
            identifier_pattern: compile(identifier)?,
            check_identifiers,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, SpellError> {
    Regex::new(pattern).map_err(|source| SpellError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>, SpellError> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// Case-insensitive check against the common and per-language keyword sets.
pub fn is_keyword_or_builtin(word: &str, config: &LanguageConfig) -> bool {
    let lower = word.to_lowercase();
    COMMON.contains(lower.as_str()) || config.keywords.contains(&lower)
}

#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: HashMap<String, Arc<LanguageConfig>>,
    aliases: HashMap<String, String>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageRegistry {
    pub fn builtin() -> Self {
        let languages = BUILTIN
            .iter()
            .map(|config| (config.id.clone(), Arc::clone(config)))
            .collect();
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(alias, id)| (alias.to_string(), id.to_string()))
            .collect();
        Self { languages, aliases }
    }

    /// Exact id first, then alias. Case-insensitive.
    pub fn get(&self, id_or_alias: &str) -> Option<Arc<LanguageConfig>> {
        let key = id_or_alias.trim().to_lowercase();
        if let Some(config) = self.languages.get(&key) {
            return Some(Arc::clone(config));
        }
        self.aliases
            .get(&key)
            .and_then(|id| self.languages.get(id))
            .map(Arc::clone)
    }

    pub fn is_supported(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn list_supported(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.languages.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Aliases pointing at `id`, sorted.
    pub fn aliases_for(&self, id: &str) -> Vec<String> {
        let id = id.to_lowercase();
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, target)| **target == id)
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        aliases
    }

    pub fn add_language_support(&mut self, config: LanguageConfig) {
        self.languages.insert(config.id.clone(), Arc::new(config));
    }

    /// Returns `false` if `id` is not a known language.
    pub fn add_language_alias(&mut self, alias: &str, id: &str) -> bool {
        let id = id.to_lowercase();
        if !self.languages.contains_key(&id) {
            return false;
        }
        self.aliases.insert(alias.to_lowercase(), id);
        true
    }
}
