/// Raised when a stored or submitted value matches no canonical variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {field} value '{value}'")]
pub struct LegacyValueError {
    pub field: &'static str,
    pub value: String,
}

impl LegacyValueError {
    pub(crate) fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Reduce a free-form status string to the token compared against known spellings.
///
/// `" não "`, `"Nao"` and `"NAO"` all become `NAO`; `"em andamento"` becomes `EM_ANDAMENTO`.
pub fn canonical_token(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let folded: String = cleaned.chars().map(fold_accent).collect();
    folded
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_uppercase()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'ê' | 'è' => 'e',
        'É' | 'Ê' | 'È' => 'E',
        'í' | 'î' => 'i',
        'Í' | 'Î' => 'I',
        'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ü' => 'u',
        'Ú' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Trim free text and drop it entirely when nothing is left.
pub(crate) fn clean_note(value: Option<String>) -> Option<String> {
    value
        .map(|note| note.trim().to_string())
        .filter(|note| !note.is_empty())
}
