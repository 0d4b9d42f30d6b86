/// Replace every non-alphanumeric character with a space and trim the ends.
///
/// Letters outside ASCII are kept so accented words survive for the
/// non-English languages in the code table.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}
