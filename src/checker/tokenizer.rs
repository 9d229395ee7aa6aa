/// Split an identifier on camelCase boundaries, `_` and `-` into lowercase
/// sub-words. Any other non-alphanumeric character is also a separator.
pub fn split_identifier(word: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for ch in word.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            result.push(std::mem::take(&mut current));
            current.extend(ch.to_lowercase());
        } else {
            current.extend(ch.to_lowercase());
        }
    }

    if !current.is_empty() {
        result.push(current);
    }

    result
}
