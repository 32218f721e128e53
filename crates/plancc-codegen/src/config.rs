//! Code generation settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Spaces per nesting level in rendered output
    pub indent_width: usize,

    /// Name of the database handle the generated code reads columns from
    pub db_handle: String,

    /// Separator between printed attributes
    pub print_separator: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            db_handle: "db".to_string(),
            print_separator: "|".to_string(),
        }
    }
}
